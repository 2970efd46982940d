//! CLI error types.

use lookout_channels::ChannelError;
use lookout_client::ClientError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reconciling an integration failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The client could not be configured.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The manifest is missing or invalid.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// The state file is unreadable or could not be written.
    #[error("state error: {0}")]
    State(String),

    /// No tracked integration under this key.
    #[error("no tracked integration '{0}'")]
    UnknownResource(String),

    /// An integration is already tracked under this key.
    #[error("an integration is already tracked as '{0}'")]
    DuplicateResource(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_unknown_resource() {
        let err = CliError::UnknownResource("datadog.logs".into());
        assert_eq!(err.to_string(), "no tracked integration 'datadog.logs'");
    }

    #[test]
    fn cli_error_channel_is_transparent() {
        let err = CliError::from(ChannelError::MissingIdentity { operation: "delete" });
        assert!(err.to_string().starts_with("delete requires"));
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
