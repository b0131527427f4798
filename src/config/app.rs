use super::error::ConfigError;
use super::loader;
use super::provider::ProviderConfig;
use std::path::Path;
use std::time::Duration;

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// System prompt prepended to every request, unless the caller's
    /// history already starts with one
    pub system_prompt: Option<String>,
    /// Fixed sampling temperature for all requests
    pub temperature: f32,
    /// Per-attempt timeout before a candidate is failed over
    pub attempt_timeout: Duration,
    /// Configured providers, in declaration order
    pub providers: Vec<ProviderConfig>,
}

impl AppConfig {
    /// Load configuration from the given path, or the default path when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        loader::load_config(path)
    }
}
