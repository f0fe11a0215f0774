//! Error types for build step execution

use thiserror::Error;

/// Errors that terminate a build step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// A connection id, credentials id or required setting did not resolve
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The installed CLI is too old, or too old for a requested feature
    #[error("ZAdviser CLI version {detected} is not compatible: {requirement}")]
    VersionIncompatible {
        /// Version found in the CLI installation.
        detected: String,
        /// Requirement that was not met.
        requirement: String,
    },

    /// A value the command line cannot be built without is missing
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The CLI exited with a nonzero code
    #[error("Call {script} exited with value = {code}")]
    ProcessFailure {
        /// Script file name that was called.
        script: String,
        /// Exit code returned by the script.
        code: i32,
    },

    /// The step was cancelled while the CLI was running
    #[error("Interrupted while waiting for {script}")]
    Interrupted {
        /// Script file name that was running.
        script: String,
    },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),

    /// The configuration store could not be read or written
    #[error("Configuration store error: {0}")]
    Store(String),
}

impl From<std::io::Error> for StepError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl StepError {
    /// Returns true if the error was raised before the CLI was started
    #[must_use]
    pub fn is_pre_invocation(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::VersionIncompatible { .. } | Self::Validation(_)
        )
    }
}

/// Field-level problems reported while a step is being configured
///
/// These are warnings for the person configuring a job. Only the upload
/// builder turns two of them into hard failures, because it cannot build a
/// command line without the access key or the data file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Host connection is not selected
    #[error("A host connection is required")]
    MissingConnectionId,

    /// Login credentials are not selected
    #[error("Login credentials are required")]
    MissingCredentialsId,

    /// JCL text is blank
    #[error("JCL is required")]
    MissingJcl,

    /// Unencrypted data file path is blank
    #[error("An unencrypted data file path is required")]
    MissingUnencryptedDataFile,

    /// Encrypted data file path is blank
    #[error("An encrypted data file path is required when encrypting data")]
    MissingEncryptedDataFile,

    /// Upload data file path is blank
    #[error("An upload data file path is required")]
    MissingUploadDataFile,

    /// No access key in the global settings
    #[error("An access key must be configured in the global zAdviser settings")]
    MissingAccessKey,

    /// No encryption key in the global settings
    #[error("An encryption key must be configured in the global zAdviser settings")]
    MissingEncryptionKey,

    /// No customer id in the global settings
    #[error("A customer id must be configured in the global zAdviser settings")]
    MissingCustomerId,

    /// Initial date range is not an unsigned integer
    #[error("Initial date range must be a non-negative whole number of days, got '{0}'")]
    InvalidInitialDateRange(String),
}
