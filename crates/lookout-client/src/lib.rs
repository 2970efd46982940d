//! # Lookout Client
//!
//! HTTP transport for the Lookout alert channel API.
//!
//! [`HttpApi`] implements [`lookout_channels::AlertChannelApi`] with bearer
//! token authentication and a per-request timeout taken from
//! [`ClientConfig`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use lookout_channels::Reconciler;
//! use lookout_client::{ClientConfig, HttpApi};
//!
//! let config = ClientConfig::from_file("lookout.toml").unwrap();
//! let reconciler = Reconciler::new(HttpApi::new(&config).unwrap());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use http::HttpApi;
