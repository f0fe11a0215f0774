//! `zadviser download`, `zadviser upload` and `zadviser validate`

use super::{DownloadArgs, JobArgs, UploadArgs, open_store};
use anyhow::{Context, Result};
use std::path::Path;
use zadviser::{
    BuildStep, CancellationToken, ConfigurationStore, DownloadParameters, DownloadStep,
    StepContext, StepKind, StepReport, UploadParameters, UploadStep, Validate, ValidationError,
};

impl JobArgs {
    /// Step context for this job, with a fresh cancellation token
    ///
    /// # Errors
    ///
    /// Returns an error if no workspace was given and the current directory
    /// cannot be read.
    pub fn context(&self) -> Result<StepContext> {
        let workspace = match &self.workspace {
            Some(workspace) => workspace.clone(),
            None => std::env::current_dir().context("Failed to read the current directory")?,
        };
        Ok(StepContext::new(&self.job, workspace))
    }
}

/// Raises `cancel` when the user presses Ctrl-C
///
/// The signal is awaited on a helper thread running a single-threaded tokio
/// runtime; the step itself stays synchronous.
pub fn install_interrupt_handler(cancel: CancellationToken) {
    let spawned = std::thread::Builder::new()
        .name("zadviser-signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                    return;
                }
            };

            if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                tracing::warn!("Interrupt received, stopping the step");
                cancel.cancel();
            }
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Cannot start the Ctrl-C listener");
    }
}

fn print_report(report: &StepReport) {
    println!("zAdviser {} finished for host {}", report.kind, report.host);
    if let Some(millis) = report.last_execution_time {
        println!("Last execution time: {millis}");
    }
}

/// Runs the download step
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the step fails.
pub fn run_download(store_path: Option<&Path>, step: &DownloadArgs, job: &JobArgs) -> Result<()> {
    let params = step.to_parameters()?;
    let mut store = open_store(store_path)?;
    let ctx = job.context()?;
    install_interrupt_handler(ctx.cancel.clone());

    let report = DownloadStep::new()
        .execute(&params, &mut store, &ctx)
        .context("zAdviser download failed")?;
    print_report(&report);
    Ok(())
}

/// Runs the upload step
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the step fails.
pub fn run_upload(store_path: Option<&Path>, step: &UploadArgs, job: &JobArgs) -> Result<()> {
    let params = step.to_parameters();
    let mut store = open_store(store_path)?;
    let ctx = job.context()?;
    install_interrupt_handler(ctx.cancel.clone());

    let report = UploadStep::new()
        .execute(&params, &mut store, &ctx)
        .context("zAdviser upload failed")?;
    print_report(&report);
    Ok(())
}

/// Renders validation results
#[must_use]
pub fn format_validation(kind: StepKind, errors: &[ValidationError], json: bool) -> String {
    if json {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        let value = serde_json::json!({
            "step": kind,
            "valid": errors.is_empty(),
            "errors": messages,
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    }

    if errors.is_empty() {
        return format!("{kind} parameters are valid");
    }

    errors
        .iter()
        .map(|error| format!("warning: {error}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn report_validation(kind: StepKind, errors: &[ValidationError], json: bool) -> Result<()> {
    println!("{}", format_validation(kind, errors, json));
    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} {kind} parameter problem(s) found", errors.len())
    }
}

/// Validates download parameters
///
/// # Errors
///
/// Returns an error when at least one problem was found.
pub fn validate_download(store: &ConfigurationStore, params: &DownloadParameters, json: bool) -> Result<()> {
    let step = DownloadStep::new();
    let errors = step.validate(params, store).err().unwrap_or_default();
    report_validation(step.kind(), &errors, json)
}

/// Validates upload parameters
///
/// # Errors
///
/// Returns an error when at least one problem was found.
pub fn validate_upload(store: &ConfigurationStore, params: &UploadParameters, json: bool) -> Result<()> {
    let errors = params.validation_errors(store);
    report_validation(StepKind::Upload, &errors, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_validation_text() {
        assert_eq!(
            format_validation(StepKind::Download, &[], false),
            "download parameters are valid"
        );

        let text = format_validation(
            StepKind::Upload,
            &[ValidationError::MissingAccessKey, ValidationError::MissingCustomerId],
            false,
        );
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|line| line.starts_with("warning: ")));
    }

    #[test]
    fn test_format_validation_json() {
        let text = format_validation(StepKind::Upload, &[ValidationError::MissingUploadDataFile], true);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["step"], "upload");
        assert_eq!(value["valid"], false);
        assert_eq!(value["errors"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_validate_upload_reports_problems() {
        let store = ConfigurationStore::default();
        let params = UploadParameters::new("12345", "/d/e.csv");
        assert!(validate_upload(&store, &params, false).is_err());
    }

    #[test]
    fn test_job_context_uses_workspace() {
        let job = JobArgs {
            job: "nightly".to_string(),
            workspace: Some("/ws".into()),
        };
        let ctx = job.context().unwrap();
        assert_eq!(ctx.job_name, "nightly");
        assert_eq!(ctx.workspace, std::path::PathBuf::from("/ws"));
        assert!(!ctx.cancel.is_cancelled());
    }
}
