//! GeoScience Chat - a scientific-assistant chat client and its relay server.
//!
//! Architecture:
//! - `serve` runs a stateless HTTP relay that forwards a message plus trailing history
//!   to the upstream generative-language API
//! - `chat` is a terminal client keeping all conversations locally and talking to the relay
//! - Conversation state lives in a key-value store flushed after every change

mod cli;
mod error;
mod models;
mod relay;
mod server;
mod session;
mod store;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.command.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    execute(cli).await
}
