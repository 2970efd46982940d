//! Declarative allow-lists for enumerated channel fields.
//!
//! Each enumerated field of a channel kind is described by an [`AllowList`]
//! table mapping the value a user declares to the value the remote service
//! expects on the wire. One generic check covers every field, so adding a
//! channel kind only adds data.

use crate::error::{ChannelError, Result};

/// Allowed values for one enumerated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowList {
    field: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl AllowList {
    /// Creates an allow-list of `(declared, wire)` pairs for `field`.
    #[must_use]
    pub const fn new(field: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { field, entries }
    }

    /// Returns the name of the field this list guards.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Returns the accepted declared values, in table order.
    pub fn declared_values(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(declared, _)| *declared)
    }

    /// Returns true if `value` is an accepted declared value.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.entries.iter().any(|(declared, _)| *declared == value)
    }

    /// Resolves a declared value to its wire form.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Validation` naming the field and the allowed
    /// set if `value` is not in the table.
    pub fn resolve(&self, value: &str) -> Result<&'static str> {
        self.entries
            .iter()
            .find(|(declared, _)| *declared == value)
            .map(|(_, wire)| *wire)
            .ok_or_else(|| ChannelError::Validation {
                field: self.field.to_string(),
                value: value.to_string(),
                allowed: self.describe(),
            })
    }

    /// Maps a wire value reported by the server back to its declared form.
    #[must_use]
    pub fn declared_for(&self, wire: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, w)| *w == wire)
            .map(|(declared, _)| *declared)
    }

    /// Renders the allowed set as `'a', 'b' or 'c'`.
    #[must_use]
    pub fn describe(&self) -> String {
        let quoted: Vec<String> = self.declared_values().map(|v| format!("'{v}'")).collect();
        match quoted.split_last() {
            None => String::new(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
        }
    }
}
