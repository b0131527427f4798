use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cascade",
    version,
    about = "Streaming completions with sequential provider failover"
)]
pub struct Cli {
    /// Path to the client configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Override the configured system prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Attach an image to the prompt (repeatable)
    #[arg(long)]
    pub image: Vec<PathBuf>,

    /// Prompt words; read from stdin when empty
    #[arg()]
    pub prompt: Vec<String>,
}
