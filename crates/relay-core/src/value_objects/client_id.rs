//! Client identity
//!
//! Opaque, caller-supplied identifier used to address a live connection.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque client identity
///
/// Deserialization is transparent and performs no validation, so an envelope may
/// carry an empty `to`. Identities accepted at connect time go through
/// [`ClientId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Maximum accepted length in bytes
    pub const MAX_LEN: usize = 256;

    /// Validate a connect-time identity
    pub fn parse(raw: impl Into<String>) -> CoreResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CoreError::EmptyClientId);
        }
        if raw.len() > Self::MAX_LEN {
            return Err(CoreError::ClientIdTooLong {
                len: raw.len(),
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(raw))
    }

    /// Borrow the identity as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the identity is empty (only possible for deserialized values)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ClientId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for ClientId {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
