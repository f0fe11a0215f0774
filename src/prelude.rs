//! Prelude module for common imports

pub use crate::command::{
    ArgValue, ArgumentVector, CliCompatibility, CliInstallation, CliVersion, ShellKind, flags,
};
pub use crate::executor::{
    BuildStep, CancellationToken, DownloadStep, LocalProcessInvoker, ProcessInvoker, StepContext,
    StepReport, UploadStep,
};
pub use crate::infrastructure::{ConfigurationStore, Credentials, HostConnection, Sensitive};
pub use crate::step::{
    DEFAULT_JCL, DownloadParameters, StepError, StepKind, UploadParameters, Validate,
    ValidationError,
};
