//! Response envelope validation.
//!
//! A create or update response must carry exactly one integration record.
//! Anything else is a server contract breach (or a concurrent mutation) and
//! fails loudly instead of silently picking a record.

use std::fmt;

use crate::error::{ChannelError, Result};
use crate::types::{IntegrationRecord, ResponseEnvelope};

const REPORT_ANOMALY: &str = "This was an unexpected behavior, verify that your integration has been\n\
created successfully and report this issue to your platform support team.";

/// Why a response envelope was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeViolation {
    /// The envelope carried no records.
    Empty,
    /// The envelope carried more than one record, as `(id, name)` pairs.
    Multiple(Vec<(String, String)>),
}

impl EnvelopeViolation {
    /// Returns the identifiers listed in the violation.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        match self {
            Self::Empty => Vec::new(),
            Self::Multiple(listing) => listing.iter().map(|(id, _)| id.as_str()).collect(),
        }
    }
}

impl fmt::Display for EnvelopeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => {
                writeln!(f, "unable to read server response data (empty 'data' field)")?;
                writeln!(f)?;
                write!(f, "{REPORT_ANOMALY}")
            }
            Self::Multiple(listing) => {
                writeln!(
                    f,
                    "there is more than one integration inside the server response data"
                )?;
                writeln!(f)?;
                writeln!(f, "List of integrations:")?;
                for (id, name) in listing {
                    writeln!(f, "\t{id}: {name}")?;
                }
                writeln!(f)?;
                write!(f, "{REPORT_ANOMALY}")
            }
        }
    }
}

/// Returns the single record of a create or update response.
///
/// # Errors
///
/// Returns `ChannelError::ProtocolInvariant` if the envelope carries zero
/// records or more than one.
pub fn validate_response<D>(envelope: ResponseEnvelope<D>) -> Result<IntegrationRecord<D>> {
    let mut records = envelope.data.into_iter();

    match (records.next(), records.next()) {
        (Some(record), None) => Ok(record),
        (None, _) => Err(ChannelError::ProtocolInvariant {
            violation: EnvelopeViolation::Empty,
        }),
        (Some(first), Some(second)) => {
            let listing = [first, second]
                .into_iter()
                .chain(records)
                .map(|record| (record.intg_guid, record.name))
                .collect();
            Err(ChannelError::ProtocolInvariant {
                violation: EnvelopeViolation::Multiple(listing),
            })
        }
    }
}
