//! Build step domain types

pub mod errors;
pub mod parameters;
pub mod types;

pub use errors::{StepError, ValidationError};
pub use parameters::{DEFAULT_JCL, DownloadParameters, UploadParameters};
pub use types::{StepKind, StepResult, Validate, non_blank};
