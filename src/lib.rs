//! # zadviser - ZAdviser CLI build steps
//!
//! Runs the ZAdviser CLI to collect mainframe operational data, optionally
//! encrypt it and upload it, the way the zAdviser build steps of a CI server
//! do. The crate builds the CLI command line, runs the CLI script and keeps
//! the small amount of state the steps need between runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zadviser::prelude::*;
//!
//! # fn main() -> Result<(), StepError> {
//! let mut store = ConfigurationStore::load("/etc/zadviser/config.yaml")?;
//! let params = DownloadParameters::new("cw01-conn", "xdevreg-login", DEFAULT_JCL, "/data/out.csv", "")
//!     .with_upload_data(true);
//!
//! let ctx = StepContext::new("nightly-collect", "/var/lib/zadviser/workspace");
//! let report = DownloadStep::new().execute(&params, &mut store, &ctx)?;
//! println!("collected from {}", report.host);
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`step`]: step parameters, validation and errors
//! - [`command`]: argument vectors, escaping, CLI version gating
//! - [`executor`]: process invocation, workspace files, step runners
//! - [`infrastructure`]: configuration store, secrets, logging

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod command;
pub mod executor;
pub mod infrastructure;
pub mod step;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use command::{
    ArgValue, ArgumentVector, CliCompatibility, CliInstallation, CliVersion, ShellKind,
    build_download_arguments, build_upload_arguments, escape_for_script,
};
pub use executor::{
    BuildStep, CancellationToken, DownloadStep, InvocationOutcome, InvocationRequest,
    LocalProcessInvoker, ProcessInvoker, StepContext, StepReport, UploadStep, WorkspaceFiles,
};
pub use infrastructure::{
    ConfigurationStore, Credentials, HostConnection, Sensitive, StoreDocument, ZAdviserSettings,
    init_logging,
};
pub use step::{
    DEFAULT_JCL, DownloadParameters, StepError, StepKind, UploadParameters, Validate,
    ValidationError,
};

/// Version of the zadviser crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
