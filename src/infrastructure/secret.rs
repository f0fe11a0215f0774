//! Sensitive values
//!
//! Passwords, access keys and encryption keys are held in [`Sensitive`].
//! Its `Debug` and `Display` implementations print a mask, so a secret can be
//! passed through structs that derive `Debug` or into `tracing` fields
//! without ever reaching a log. [`Sensitive::expose`] is the only way to read
//! the value.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Text printed in place of a sensitive value
pub const MASK: &str = "********";

/// A secret string that never prints itself
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);

impl Sensitive {
    /// Wraps a secret value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the plain value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when the secret is empty or whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Drops blank secrets so they read as "not configured"
    #[must_use]
    pub fn non_blank(value: Option<Self>) -> Option<Self> {
        value.filter(|secret| !secret.is_blank())
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sensitive({MASK})")
    }
}

impl fmt::Display for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl From<&str> for Sensitive {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Sensitive {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// `deserialize_with` helper mapping blank secrets to `None`
///
/// # Errors
///
/// Propagates the deserializer's error.
pub fn deserialize_non_blank<'de, D>(deserializer: D) -> Result<Option<Sensitive>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Sensitive>::deserialize(deserializer)?;
    Ok(Sensitive::non_blank(value))
}
