use anyhow::Result;
use clap::Parser;
use iris::providers::configs::ProviderKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod client;
mod repl;
mod session;

use client::RelayClient;
use repl::Repl;
use session::Session;

/// Chat with a hosted vision model through the Iris relay
#[derive(Parser)]
#[command(author, version, long_about = None)]
struct Cli {
    /// Base URL of the relay server
    #[arg(short, long, default_value = "http://127.0.0.1:3001")]
    server: String,

    /// Which hosted model to talk to
    #[arg(short, long, value_enum, default_value = "doubao")]
    model: ModelVariant,

    /// Image to attach to the first message (repeatable)
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModelVariant {
    Doubao,
    Qwen,
}

impl From<ModelVariant> for ProviderKind {
    fn from(variant: ModelVariant) -> Self {
        match variant {
            ModelVariant::Doubao => ProviderKind::Doubao,
            ModelVariant::Qwen => ProviderKind::Qwen,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut session = Session::new(RelayClient::new(cli.server), cli.model.into());
    for path in &cli.images {
        session.attach_image(path)?;
    }

    let mut repl = Repl::new(session)?;
    repl.run().await
}
