//! Download and upload steps
//!
//! A run resolves the CLI installation and the configured connection,
//! builds the command line, calls the CLI through a [`ProcessInvoker`] and,
//! on success, cleans up and records the run in the configuration store.

use super::process::{InvocationOutcome, InvocationRequest, LocalProcessInvoker, ProcessInvoker};
use super::temp_files::WorkspaceFiles;
use super::traits::{BuildStep, StepContext, StepReport};
use crate::command::{
    ArgumentVector, CliCompatibility, CliInstallation, DownloadInputs, ShellKind, UploadInputs,
    build_download_arguments, build_upload_arguments, detect_cli_version,
};
use crate::infrastructure::ConfigurationStore;
use crate::step::{
    DownloadParameters, StepError, StepKind, UploadParameters, Validate, ValidationError, non_blank,
};
use std::path::{Path, PathBuf};

/// Resolves the CLI install directory and version for the given shell
///
/// A configured version override skips reading `versions.xml`.
///
/// # Errors
///
/// Returns `StepError::Configuration` if no location is configured and
/// `StepError::VersionIncompatible` if the version cannot be determined.
pub fn resolve_cli(
    store: &ConfigurationStore,
    shell: ShellKind,
    compatibility: &CliCompatibility,
) -> Result<CliInstallation, StepError> {
    let location = store.cli_location(shell)?;
    let version = match store.cli_version_override() {
        Some(forced) => {
            tracing::debug!(version = %forced, "Using configured ZAdviser CLI version");
            forced.parse()?
        }
        None => detect_cli_version(Path::new(location), &compatibility.minimum)?,
    };

    tracing::info!(location = %location, version = %version, "Using ZAdviser CLI");
    Ok(CliInstallation::new(location, shell, version))
}

fn warn_validation(kind: StepKind, errors: &[ValidationError]) {
    for error in errors {
        tracing::warn!(step = %kind, "{error}");
    }
}

fn invoke_cli<I: ProcessInvoker>(
    invoker: &I,
    args: &ArgumentVector,
    ctx: &StepContext,
) -> Result<InvocationOutcome, StepError> {
    let request = InvocationRequest::from_arguments(args, &ctx.workspace)
        .with_env(ctx.env.clone())
        .with_cancel(ctx.cancel.clone());
    invoker.invoke(&request)
}

fn check_exit(outcome: &InvocationOutcome, cli: &CliInstallation) -> Result<(), StepError> {
    if outcome.is_success() {
        return Ok(());
    }

    tracing::error!(
        script = cli.script_name(),
        exit_code = outcome.exit_code,
        "ZAdviser CLI failed"
    );
    Err(StepError::ProcessFailure {
        script: cli.script_name().to_string(),
        code: outcome.exit_code,
    })
}

fn remove_data_dir(files: &WorkspaceFiles, data_dir: &Path) {
    if let Err(e) = files.remove_data_dir(data_dir) {
        tracing::warn!(
            path = %data_dir.display(),
            error = %e,
            "Failed to remove CLI data directory"
        );
    }
}

/// Collects data from the mainframe and optionally encrypts and uploads it
#[derive(Debug, Clone, Default)]
pub struct DownloadStep<I = LocalProcessInvoker> {
    invoker: I,
    compatibility: CliCompatibility,
}

impl DownloadStep<LocalProcessInvoker> {
    /// Creates a step running the CLI locally
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<I: ProcessInvoker> DownloadStep<I> {
    /// Creates a step running the CLI through `invoker`
    #[must_use]
    pub fn with_invoker(invoker: I) -> Self {
        Self {
            invoker,
            compatibility: CliCompatibility::default(),
        }
    }

    /// Overrides the CLI version requirements
    #[must_use]
    pub fn with_compatibility(mut self, compatibility: CliCompatibility) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// The invoker used by this step
    #[must_use]
    pub fn invoker(&self) -> &I {
        &self.invoker
    }
}

impl<I: ProcessInvoker> BuildStep for DownloadStep<I> {
    type Parameters = DownloadParameters;

    fn kind(&self) -> StepKind {
        StepKind::Download
    }

    fn execute(
        &self,
        params: &DownloadParameters,
        store: &mut ConfigurationStore,
        ctx: &StepContext,
    ) -> Result<StepReport, StepError> {
        tracing::info!(job = %ctx.job_name, connection = %params.connection_id, "Starting zAdviser download");

        if let Err(errors) = params.validate(store) {
            warn_validation(self.kind(), &errors);
        }

        let cli = resolve_cli(store, ctx.shell, &self.compatibility)?;
        let connection = store.host_connection(&params.connection_id)?.clone();
        let credentials = store
            .login_information(&ctx.job_name, &params.credentials_id)?
            .clone();
        tracing::info!(host = %connection.host_port(), user = %credentials.username, "Resolved host connection");

        let files = WorkspaceFiles::new(&ctx.workspace)?;
        let data_dir = files.new_data_dir();
        let jcl_file = files.create_jcl_file(&params.jcl)?;
        let persist_root = ctx.persist_root(store);

        let args = build_download_arguments(&DownloadInputs {
            params,
            connection: &connection,
            credentials: &credentials,
            settings: store.settings(),
            cli: &cli,
            compatibility: &self.compatibility,
            data_dir: &data_dir,
            jcl_file: jcl_file.path(),
            persist_root: &persist_root,
        })?;

        let outcome = invoke_cli(&self.invoker, &args, ctx);
        drop(jcl_file);
        let outcome = outcome?;
        check_exit(&outcome, &cli)?;

        remove_data_dir(&files, &data_dir);

        let host = connection.host.trim().to_string();
        let now = chrono::Utc::now().timestamp_millis();
        store.update_last_execution_time(&host, now);
        store.save()?;

        tracing::info!(host = %host, last_execution_time = now, "zAdviser download finished");
        Ok(StepReport {
            kind: StepKind::Download,
            host,
            data_dir,
            last_execution_time: Some(now),
            duration: outcome.duration,
        })
    }
}

/// Uploads a previously collected data file
#[derive(Debug, Clone, Default)]
pub struct UploadStep<I = LocalProcessInvoker> {
    invoker: I,
    compatibility: CliCompatibility,
}

impl UploadStep<LocalProcessInvoker> {
    /// Creates a step running the CLI locally
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<I: ProcessInvoker> UploadStep<I> {
    /// Creates a step running the CLI through `invoker`
    #[must_use]
    pub fn with_invoker(invoker: I) -> Self {
        Self {
            invoker,
            compatibility: CliCompatibility::default(),
        }
    }

    /// Overrides the CLI version requirements
    #[must_use]
    pub fn with_compatibility(mut self, compatibility: CliCompatibility) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// The invoker used by this step
    #[must_use]
    pub fn invoker(&self) -> &I {
        &self.invoker
    }
}

impl<I: ProcessInvoker> BuildStep for UploadStep<I> {
    type Parameters = UploadParameters;

    fn kind(&self) -> StepKind {
        StepKind::Upload
    }

    fn execute(
        &self,
        params: &UploadParameters,
        store: &mut ConfigurationStore,
        ctx: &StepContext,
    ) -> Result<StepReport, StepError> {
        tracing::info!(job = %ctx.job_name, file = %params.upload_data_file, "Starting zAdviser upload");

        if let Err(errors) = params.validate(store) {
            warn_validation(self.kind(), &errors);
        }

        let cli = resolve_cli(store, ctx.shell, &self.compatibility)?;
        let connection = store.host_connection(&params.connection_id)?.clone();
        let credentials = match non_blank(&params.credentials_id) {
            Some(id) => Some(store.login_information(&ctx.job_name, id)?.clone()),
            None => None,
        };

        let files = WorkspaceFiles::new(&ctx.workspace)?;
        let data_dir: PathBuf = files.new_data_dir();
        let persist_root = ctx.persist_root(store);

        let args = build_upload_arguments(&UploadInputs {
            params,
            connection: &connection,
            credentials: credentials.as_ref(),
            settings: store.settings(),
            cli: &cli,
            compatibility: &self.compatibility,
            data_dir: &data_dir,
            persist_root: &persist_root,
        })?;

        let outcome = invoke_cli(&self.invoker, &args, ctx)?;
        check_exit(&outcome, &cli)?;

        remove_data_dir(&files, &data_dir);

        tracing::info!(host = %connection.host, "zAdviser upload finished");
        Ok(StepReport {
            kind: StepKind::Upload,
            host: connection.host.trim().to_string(),
            data_dir,
            last_execution_time: None,
            duration: outcome.duration,
        })
    }
}
