//! cascade-llm - streaming completion client with sequential provider failover
//!
//! An ordered list of (provider, model) candidates is tried one at a time
//! until one produces a non-empty streamed response. Per-candidate failures
//! are absorbed and logged; callers only see configuration errors,
//! cancellation, or total exhaustion.

pub mod cli;
pub mod config;
pub mod constants;
pub mod model;

pub use cli::Cli;
pub use config::{AppConfig, ConfigError, ModelSpec, ProviderConfig, WireProtocol};
pub use model::{
    AttemptError, ChatMessage, ChatRequest, ClientOptions, FailoverClient, FailoverError,
    ImageAttachment, MessageRole, StreamOutcome, TokenSink,
};

use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Run the CLI: load config, build the client, stream one completion to stdout.
pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting cascade");
    debug!(config = ?cli.config, system = ?cli.system, images = cli.image.len(), "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let mut file_config = AppConfig::load(config_path)?;
    if let Some(system) = cli.system.clone() {
        file_config.system_prompt = Some(system);
    }
    info!(providers = file_config.providers.len(), "Loaded configuration");

    let client = FailoverClient::from_app_config(&file_config);

    let prompt = if cli.prompt.is_empty() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer.trim().to_string()
    } else {
        cli.prompt.join(" ")
    };

    let mut images = Vec::new();
    for path in &cli.image {
        let bytes = fs::read(path)?;
        images.push(ImageAttachment::from_bytes(guess_mime(path), &bytes));
    }

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let request = ChatRequest::new(prompt)
        .with_images(images)
        .with_cancellation(cancel);

    let mut sink = StdoutSink;
    let outcome = client.stream_response(&request, &mut sink).await?;
    println!();
    info!(
        provider = outcome.provider.as_str(),
        model = outcome.model.as_str(),
        tokens = outcome.tokens,
        "Done"
    );
    Ok(())
}

struct StdoutSink;

impl TokenSink for StdoutSink {
    fn token(&mut self, fragment: &str) {
        print!("{fragment}");
        let _ = io::stdout().flush();
    }

    fn candidate_selected(&mut self, label: &str) {
        debug!(candidate = label, "candidate selected");
    }
}

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(io::stderr)
            .init();
    });
}
