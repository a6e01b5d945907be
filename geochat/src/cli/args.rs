//! CLI argument definitions.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::relay::{RelayConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Default port of the relay server.
pub const DEFAULT_PORT: u16 = 58231;

/// GeoScience Chat - a scientific assistant in your terminal, backed by a Gemini relay
#[derive(Parser, Debug)]
#[command(name = "geochat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding saved conversations
    #[arg(long, global = true, env = "GEOCHAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Upstream API settings, read once at startup.
#[derive(Args, Debug, Clone)]
pub struct UpstreamArgs {
    /// API key for the generative-language API
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model to relay to
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the generative-language API
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "60")]
    pub timeout_secs: u64,
}

impl UpstreamArgs {
    pub fn to_config(&self) -> RelayConfig {
        RelayConfig::new(self.api_key.clone())
            .with_model(&self.model)
            .with_base_url(&self.base_url)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        #[command(flatten)]
        upstream: UpstreamArgs,
    },

    /// Chat interactively in the active conversation
    Chat {
        /// Base URL of a running relay server
        #[arg(long, default_value_t = format!("http://127.0.0.1:{DEFAULT_PORT}"))]
        server: String,

        /// Call the upstream API directly instead of going through a relay server
        #[arg(long)]
        direct: bool,

        /// Keep conversations in memory only, leaving saved ones untouched
        #[arg(long)]
        ephemeral: bool,

        #[command(flatten)]
        upstream: UpstreamArgs,
    },

    /// List conversations
    List,

    /// Print a conversation transcript
    Show {
        /// Conversation ID (defaults to the active one)
        id: Option<String>,
    },

    /// Start a new conversation and make it active
    New,

    /// Rename a conversation
    Rename {
        /// Conversation ID
        id: String,

        /// New name
        #[arg(trailing_var_arg = true, required = true)]
        name: Vec<String>,
    },

    /// Make a conversation the active one
    Use {
        /// Conversation ID
        id: String,
    },

    /// Reset the active conversation to the welcome message
    Clear,

    /// Delete all saved conversations
    Reset,
}

impl Commands {
    /// Default log filter for the command.
    pub const fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Serve { .. } => "info",
            _ => "warn",
        }
    }
}
