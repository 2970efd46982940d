//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lookout_channels::ChannelType;

/// Lookout - declarative alert channel integrations.
#[derive(Parser, Debug, Clone)]
#[command(name = "lookout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (base URL, token, timeout).
    #[arg(short, long, env = "LOOKOUT_CONFIG", default_value = "lookout.toml")]
    pub config: PathBuf,

    /// Manifest declaring the desired alert channels.
    #[arg(short, long, env = "LOOKOUT_MANIFEST", default_value = "channels.toml")]
    pub manifest: PathBuf,

    /// State file tracking managed integrations.
    #[arg(short, long, env = "LOOKOUT_STATE", default_value = "lookout.state.json")]
    pub state: PathBuf,

    /// API token, overriding the one in the configuration file.
    #[arg(long, env = "LOOKOUT_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable log lines.
    #[default]
    Text,
    /// One JSON object per log line.
    Json,
}

/// Channel kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Datadog.
    Datadog,
    /// New Relic Insights.
    Newrelic,
}

impl From<KindArg> for ChannelType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Datadog => Self::Datadog,
            KindArg::Newrelic => Self::NewRelic,
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create or replace every channel declared in the manifest.
    ///
    /// Untracked channels are created; tracked ones are updated with the
    /// full declared configuration.
    Apply,

    /// Re-read every tracked integration and drop those deleted remotely.
    Refresh,

    /// Delete a tracked integration.
    Destroy {
        /// State key of the integration, `<kind>.<name>`.
        key: String,
    },

    /// Start tracking an existing integration.
    Import {
        /// Channel kind of the integration.
        #[arg(value_enum)]
        kind: KindArg,

        /// Server-assigned integration identifier.
        id: String,
    },

    /// Show tracked integrations.
    Show,
}

impl Commands {
    /// Returns true if the command talks to the remote service.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        !matches!(self, Self::Show)
    }
}
