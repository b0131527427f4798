pub mod app;
pub mod error;
pub mod loader;
pub mod provider;

pub use app::AppConfig;
pub use error::ConfigError;
pub use provider::{ModelSpec, ProviderConfig, WireProtocol};
