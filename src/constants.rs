//! Application constants
//!
//! Single source of truth for paths and protocol defaults.

use std::time::Duration;

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/client.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Default OpenAI-compatible completions path (fallback when not specified in config)
pub const DEFAULT_OPENAI_API_PATH: &str = "v1/chat/completions";

/// Default Gemini API path (fallback when not specified in config)
pub const DEFAULT_GEMINI_API_PATH: &str = "v1beta/models";

/// Sampling temperature used when the config does not set one
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Upper bound on every wait inside a single attempt (connection open,
/// next stream chunk) before the attempt is failed over
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);
