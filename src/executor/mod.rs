//! Step execution layer
//!
//! This module contains the build step trait, the process invoker that runs
//! the ZAdviser CLI, workspace file handling and the two step runners.

mod process;
mod runner;
mod temp_files;
mod traits;

pub use process::{
    CancellationToken, DEFAULT_POLL_INTERVAL, InvocationOutcome, InvocationRequest,
    LocalProcessInvoker, ProcessInvoker,
};
pub use runner::{DownloadStep, UploadStep, resolve_cli};
pub use temp_files::{JclFile, TOPAZ_CLI_WORKSPACE, WorkspaceFiles};
pub use traits::{BuildStep, JENKINS_HOME_VAR, StepContext, StepReport};
