// Config loading tests - AppConfig::load error handling and parsing.

use cascade_llm::config::{AppConfig, ConfigError, WireProtocol};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("client.toml");
    fs::write(&path, content).expect("Failed to write client.toml");
    path
}

fn minimal_config() -> &'static str {
    r#"
[[providers]]
id = "gateway"
protocol = "openai"
endpoint = "https://gateway.example.com"
api_key = "GATEWAY_API_KEY"
models = ["gpt-4o-mini"]
"#
}

#[test]
fn returns_error_when_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/client.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn returns_error_on_invalid_toml() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "providers = [[[");

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn returns_error_when_no_providers_configured() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), r#"system_prompt = "hi""#);

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::NoProvidersConfigured)));
}

#[test]
fn returns_error_when_endpoint_missing() {
    let dir = tempdir().expect("tempdir");
    let content = r#"
[[providers]]
id = "gateway"
protocol = "openai"
models = ["gpt-4o-mini"]
"#;
    let path = write_config(dir.path(), content);

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::MissingEndpoint { provider }) if provider == "gateway"
    ));
}

#[test]
fn returns_error_when_provider_has_no_models() {
    let dir = tempdir().expect("tempdir");
    let content = r#"
[[providers]]
id = "gateway"
protocol = "openai"
endpoint = "https://gateway.example.com"
models = []
"#;
    let path = write_config(dir.path(), content);

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::NoModels { provider }) if provider == "gateway"
    ));
}

#[test]
fn returns_error_on_duplicate_provider_ids() {
    let dir = tempdir().expect("tempdir");
    let content = r#"
[[providers]]
id = "gateway"
protocol = "openai"
endpoint = "https://a.example.com"
models = ["m1"]

[[providers]]
id = "gateway"
protocol = "openai"
endpoint = "https://b.example.com"
models = ["m2"]
"#;
    let path = write_config(dir.path(), content);

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::DuplicateProvider { provider }) if provider == "gateway"
    ));
}

#[test]
fn loads_minimal_config_with_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), minimal_config());

    let config = AppConfig::load(Some(&path)).expect("load config");
    assert_eq!(config.providers.len(), 1);
    assert_eq!(config.providers[0].protocol, WireProtocol::OpenAi);
    assert!(!config.providers[0].is_gemini());
    assert_eq!(config.attempt_timeout, Duration::from_secs(15));
    assert!(config.system_prompt.is_none());
    assert!(config.providers[0].requires_credential);
}

#[test]
fn parses_model_shorthand_and_detailed_forms() {
    let dir = tempdir().expect("tempdir");
    let content = r#"
[[providers]]
id = "gateway"
protocol = "openai"
endpoint = "https://gateway.example.com"
api_key = "GATEWAY_API_KEY"
models = [
    { name = "gpt-4o", vision = true },
    "gpt-4o-mini",
]
"#;
    let path = write_config(dir.path(), content);

    let config = AppConfig::load(Some(&path)).expect("load config");
    let models = &config.providers[0].models;
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "gpt-4o");
    assert!(models[0].vision);
    assert!(!models[0].reasoning);
    assert_eq!(models[1].name, "gpt-4o-mini");
    assert!(!models[1].vision);
}

#[test]
fn parses_options_and_keyless_providers() {
    let dir = tempdir().expect("tempdir");
    let content = r#"
system_prompt = "be brief"
temperature = 0.2
attempt_timeout_secs = 5

[[providers]]
id = "local"
protocol = "openai"
endpoint = "http://127.0.0.1:8000"
requires_credential = false
priority = 3
models = ["qwen"]
"#;
    let path = write_config(dir.path(), content);

    let config = AppConfig::load(Some(&path)).expect("load config");
    assert_eq!(config.system_prompt.as_deref(), Some("be brief"));
    assert_eq!(config.temperature, 0.2);
    assert_eq!(config.attempt_timeout, Duration::from_secs(5));
    assert!(!config.providers[0].requires_credential);
    assert_eq!(config.providers[0].priority, 3);
}
