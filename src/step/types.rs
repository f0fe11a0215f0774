//! Core types shared by the download and upload steps

#![allow(clippy::must_use_candidate)]

use super::errors::ValidationError;
use crate::infrastructure::ConfigurationStore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for build step execution
pub type StepResult<T> = std::result::Result<T, super::errors::StepError>;

/// The two build steps the ZAdviser CLI knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Collect data from the mainframe, optionally encrypt and upload it
    Download,
    /// Upload a previously collected data file
    Upload,
}

impl StepKind {
    /// Value passed to the CLI's `-buildStep` flag
    pub fn cli_marker(self) -> &'static str {
        match self {
            Self::Download => "D",
            Self::Upload => "U",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => write!(f, "download"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

/// Trait for step parameters that can be checked against the global settings
pub trait Validate {
    /// Every problem found, in field order
    fn validation_errors(&self, store: &ConfigurationStore) -> Vec<ValidationError>;

    /// Validates the parameters
    ///
    /// # Errors
    ///
    /// Returns all validation errors when at least one is found.
    fn validate(&self, store: &ConfigurationStore) -> std::result::Result<(), Vec<ValidationError>> {
        let errors = self.validation_errors(store);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Returns `None` for blank strings, the trimmed value otherwise
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_marker() {
        assert_eq!(StepKind::Download.cli_marker(), "D");
        assert_eq!(StepKind::Upload.cli_marker(), "U");
    }

    #[test]
    fn test_display() {
        assert_eq!(StepKind::Download.to_string(), "download");
        assert_eq!(StepKind::Upload.to_string(), "upload");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(""), None);
        assert_eq!(non_blank("   "), None);
        assert_eq!(non_blank(" /d/u.csv "), Some("/d/u.csv"));
    }
}
