//! ZAdviser CLI command construction
//!
//! This module turns step parameters and a configuration snapshot into the
//! ordered, escaped argument vector handed to the CLI script:
//!
//! - `arguments`: flag names, value escaping and the argument vector
//! - `version`: CLI version detection and feature gating
//! - `builder`: the download and upload command lines

pub mod arguments;
pub mod builder;
pub mod version;

pub use arguments::{ArgValue, Argument, ArgumentVector, escape_for_script, flags};
pub use builder::{
    CliInstallation, DownloadInputs, ShellKind, UploadInputs, build_download_arguments,
    build_upload_arguments, script_path,
};
pub use version::{
    CliCompatibility, CliVersion, PROTOCOL_MINIMUM_CLI_VERSION, VERSION_FILE,
    ZADVISER_MINIMUM_CLI_VERSION, detect_cli_version,
};
