use super::app::AppConfig;
use super::error::ConfigError;
use super::provider::{ProviderConfig, RawProviderConfig};
use crate::constants::{CONFIG_PATH, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_TEMPERATURE, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub attempt_timeout_secs: Option<u64>,
    #[serde(default)]
    pub providers: Vec<RawProviderConfig>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    if parsed.providers.is_empty() {
        return Err(ConfigError::NoProvidersConfigured);
    }

    let mut seen = HashSet::new();
    let mut providers: Vec<ProviderConfig> = Vec::new();
    for raw_provider in parsed.providers {
        if raw_provider.endpoint.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingEndpoint {
                provider: raw_provider.id.clone(),
            });
        }
        if raw_provider.models.is_empty() {
            return Err(ConfigError::NoModels {
                provider: raw_provider.id.clone(),
            });
        }
        if !seen.insert(raw_provider.id.clone()) {
            return Err(ConfigError::DuplicateProvider {
                provider: raw_provider.id.clone(),
            });
        }
        providers.push(ProviderConfig::from(raw_provider));
    }

    Ok(AppConfig {
        system_prompt: parsed.system_prompt,
        temperature: parsed.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        attempt_timeout: parsed
            .attempt_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ATTEMPT_TIMEOUT),
        providers,
    })
}
