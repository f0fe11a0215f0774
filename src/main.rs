//! zadviser - run ZAdviser CLI build steps from the command line
//!
//! ## Commands
//!
//! - `zadviser download` - Collect data, optionally encrypt and upload it
//! - `zadviser upload` - Upload a previously collected file
//! - `zadviser validate` - Check step parameters against the store
//! - `zadviser config` - Inspect and edit the configuration store
//! - `zadviser default-jcl` - Print the JCL skeleton
//! - `zadviser completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Point at the ZAdviser CLI and add a connection and a login
//! zadviser config set cli-location-linux /opt/Compuware/TopazCLI
//! zadviser config add-connection --id cw01 --host cw01.example.com --port 30947
//! echo "$PASSWORD" | zadviser config add-credentials --id xdevreg --username xdevreg
//! zadviser config set initial-date-range 30
//!
//! # Collect without uploading
//! zadviser download --connection cw01 --credentials xdevreg \
//!     --unencrypted-data-file /data/zadviser.csv --no-upload
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var_os(cli::DEBUG_ENV_VAR).is_some() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
