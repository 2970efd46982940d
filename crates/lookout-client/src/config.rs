//! Client configuration.
//!
//! Connection settings for the alert channel API, loaded from TOML:
//!
//! ```toml
//! base_url = "https://acme.lookout.example.com"
//! api_token = "..."
//! timeout_secs = 30
//! ```
//!
//! The token may be left out of the file and supplied from the environment
//! instead (see [`ClientConfig::load`]).

use std::path::Path;
use std::time::Duration;

use lookout_channels::SecretKey;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Connection settings for the alert channel API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the account's API, e.g. `https://acme.lookout.example.com`.
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_token: SecretKey,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Creates a configuration with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_token: impl Into<SecretKey>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path, None)
    }

    /// Load configuration from a TOML file, replacing the token with
    /// `token_override` when one is given.
    ///
    /// Validation runs after the override, so a file without a token is
    /// accepted as long as the override supplies one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>, token_override: Option<SecretKey>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;

        let mut config = Self::parse(&content)?;
        if let Some(token) = token_override {
            config.api_token = token;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ClientError::Config(format!("invalid TOML: {e}")))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::Config("base_url cannot be empty".to_string()));
        }

        let url = self.url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.api_token.is_empty() {
            return Err(ClientError::Config(
                "api_token cannot be empty (set it in the config file or LOOKOUT_API_TOKEN)"
                    .to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ClientError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the parsed base URL, with a trailing slash so relative
    /// endpoint paths join under it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `base_url` does not parse.
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
