//! # Lookout Channels
//!
//! Declarative management of the alert channel integrations a security
//! monitoring service uses to forward alerts to third-party observability
//! platforms.
//!
//! - **Translation**: declared settings become the service's wire payload,
//!   with enumerated fields checked against closed allow-lists first
//! - **Response validation**: create and update answers must carry exactly
//!   one integration record
//! - **Test and rollback**: an integration whose test notification fails is
//!   deleted instead of left registered
//! - **Drift**: reads echo the server's view back into local state
//!
//! Supported channel types are [`Datadog`] and [`NewRelic`]. New types plug
//! in through the [`ChannelKind`] trait.
//!
//! ## Example
//!
//! ```rust
//! use lookout_channels::{
//!     ChannelResource, Datadog, DatadogSettings, DeclaredChannel, InMemoryApi, Reconciler,
//!     TestOutcome,
//! };
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let reconciler = Reconciler::new(InMemoryApi::new());
//!
//! let settings = DatadogSettings::new("dd-api-key").site("eu").service("summary");
//! let mut resource = ChannelResource::new(DeclaredChannel::new("security-logs", settings));
//!
//! let outcome = reconciler.create::<Datadog>(&mut resource).await.unwrap();
//! assert_eq!(outcome, TestOutcome::Passed);
//! assert!(resource.is_registered());
//! # });
//! ```
//!
//! ## Transports
//!
//! The reconciler talks to the service through [`AlertChannelApi`]. An
//! HTTP implementation lives in `lookout-client`; [`InMemoryApi`] serves
//! tests and dry runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod allowlist;
pub mod api;
pub mod datadog;
pub mod error;
pub mod kind;
pub mod memory;
pub mod newrelic;
pub mod projector;
pub mod reconciler;
pub mod rollback;
pub mod translator;
pub mod types;
pub mod validator;

pub use allowlist::AllowList;
pub use api::{AlertChannelApi, ApiError, ApiOperation, ApiResult};
pub use datadog::{DATADOG_SERVICES, DATADOG_SITES, Datadog, DatadogData, DatadogSettings};
pub use error::{ChannelError, Result};
pub use kind::ChannelKind;
pub use memory::{ApiCall, InMemoryApi};
pub use newrelic::{NewRelic, NewRelicData, NewRelicSettings};
pub use projector::{Projection, project};
pub use reconciler::{ReadOutcome, Reconciler};
pub use rollback::{RollbackOutcome, TestOutcome, verify_or_rollback};
pub use translator::translate;
pub use types::{
    ChannelPayload, ChannelResource, ChannelType, ComputedFields, DeclaredChannel,
    IntegrationRecord, Lifecycle, ResponseEnvelope, SecretKey,
};
pub use validator::{EnvelopeViolation, validate_response};
