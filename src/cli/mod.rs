//! Command line front end for the zAdviser build steps
//!
//! - `download`: collect data through the ZAdviser CLI
//! - `upload`: upload a previously collected file
//! - `validate`: check step parameters without running anything
//! - `config`: inspect and edit the configuration store
//! - `default-jcl`: print the JCL skeleton
//! - `completions`: generate shell completions

pub mod completions;
pub mod config;
pub mod step;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use zadviser::infrastructure::{CONFIG_ENV_VAR, init_logging};
use zadviser::{ConfigurationStore, DEFAULT_JCL, DownloadParameters, UploadParameters};

/// Environment variable switching on debug logging
pub const DEBUG_ENV_VAR: &str = "ZADVISER_DEBUG";

/// CLI arguments for zadviser
#[derive(Parser, Debug)]
#[command(name = "zadviser")]
#[command(author, version, about = "Run ZAdviser CLI download and upload steps", long_about = None)]
pub struct Args {
    /// Configuration store file
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect data from the mainframe, optionally encrypt and upload it
    Download {
        #[command(flatten)]
        step: DownloadArgs,
        #[command(flatten)]
        job: JobArgs,
    },

    /// Upload a previously collected data file
    Upload {
        #[command(flatten)]
        step: UploadArgs,
        #[command(flatten)]
        job: JobArgs,
    },

    /// Check step parameters against the configuration store
    Validate {
        #[command(subcommand)]
        target: ValidateTarget,
        /// Output format
        #[arg(short, long, value_enum, global = true, default_value = "text")]
        format: OutputFormat,
    },

    /// Inspect and edit the configuration store
    Config {
        #[command(subcommand)]
        action: config::ConfigAction,
    },

    /// Print the built-in JCL skeleton
    DefaultJcl,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ValidateTarget {
    /// Validate download step parameters
    Download(DownloadArgs),
    /// Validate upload step parameters
    Upload(UploadArgs),
}

/// Parameters of the download step
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct DownloadArgs {
    /// Host connection id
    #[arg(long, default_value = "")]
    connection: String,

    /// Login credentials id
    #[arg(long, default_value = "")]
    credentials: String,

    /// File holding the JCL; the built-in skeleton when omitted
    #[arg(long)]
    jcl_file: Option<PathBuf>,

    /// Where the CLI writes the unencrypted data
    #[arg(long, default_value = "")]
    unencrypted_data_file: String,

    /// Where the CLI writes the encrypted data
    #[arg(long, default_value = "")]
    encrypted_data_file: String,

    /// Encrypt the collected data
    #[arg(long)]
    encrypt_data: bool,

    /// Keep the collected data local
    #[arg(long)]
    no_upload: bool,
}

impl DownloadArgs {
    /// Builds step parameters, reading the JCL file if one was given
    ///
    /// # Errors
    ///
    /// Returns an error if the JCL file cannot be read.
    pub fn to_parameters(&self) -> Result<DownloadParameters> {
        let jcl = match &self.jcl_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read JCL file: {}", path.display()))?,
            None => DEFAULT_JCL.to_string(),
        };

        Ok(DownloadParameters::new(
            &self.connection,
            &self.credentials,
            &jcl,
            &self.unencrypted_data_file,
            &self.encrypted_data_file,
        )
        .with_encrypt_data(self.encrypt_data)
        .with_upload_data(!self.no_upload))
    }
}

/// Parameters of the upload step
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct UploadArgs {
    /// Host connection id
    #[arg(long, default_value = "")]
    connection: String,

    /// Login credentials id; login flags are only passed when set
    #[arg(long, default_value = "")]
    credentials: String,

    /// File to upload
    #[arg(long, default_value = "")]
    upload_data_file: String,
}

impl UploadArgs {
    /// Builds step parameters
    #[must_use]
    pub fn to_parameters(&self) -> UploadParameters {
        UploadParameters::new(&self.connection, &self.upload_data_file)
            .with_credentials_id(&self.credentials)
    }
}

/// Job the step runs for
#[derive(ClapArgs, Debug, Clone)]
pub struct JobArgs {
    /// Job name; scopes credential lookups
    #[arg(long, env = "JOB_NAME", default_value = "default")]
    job: String,

    /// Job workspace (current directory if not specified)
    #[arg(long, env = "WORKSPACE")]
    workspace: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Opens the configuration store at `path`, or at the default location
///
/// # Errors
///
/// Returns an error if no location can be determined or the file exists but
/// cannot be read.
pub fn open_store(path: Option<&Path>) -> Result<ConfigurationStore> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => ConfigurationStore::default_path()
            .context("Cannot determine a configuration directory; pass --config")?,
    };

    ConfigurationStore::load_or_default(&path)
        .with_context(|| format!("Failed to open configuration store: {}", path.display()))
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    let level = if std::env::var_os(DEBUG_ENV_VAR).is_some() {
        "debug"
    } else {
        args.log_level.as_str()
    };
    init_logging(level);

    let store_path = args.config.as_deref();

    match args.command {
        Command::Download { step, job } => {
            step::run_download(store_path, &step, &job)?;
        }
        Command::Upload { step, job } => {
            step::run_upload(store_path, &step, &job)?;
        }
        Command::Validate { target, format } => {
            let store = open_store(store_path)?;
            let json = format == OutputFormat::Json;
            match target {
                ValidateTarget::Download(step) => {
                    step::validate_download(&store, &step.to_parameters()?, json)?;
                }
                ValidateTarget::Upload(step) => {
                    step::validate_upload(&store, &step.to_parameters(), json)?;
                }
            }
        }
        Command::Config { action } => {
            config::run_config(store_path, action)?;
        }
        Command::DefaultJcl => {
            print!("{DEFAULT_JCL}");
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
        }
    }

    Ok(())
}
