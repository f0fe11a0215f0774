//! Build step traits
//!
//! This module defines the interface shared by the download and upload steps
//! and the per-run context they execute in.

use super::process::CancellationToken;
use crate::command::ShellKind;
use crate::infrastructure::ConfigurationStore;
use crate::step::{StepError, StepKind, Validate, ValidationError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the root for data the CLI persists
pub const JENKINS_HOME_VAR: &str = "JENKINS_HOME";

/// A build step driving the ZAdviser CLI
pub trait BuildStep {
    /// Per-job parameters of the step
    type Parameters: Validate;

    /// Which step this is
    fn kind(&self) -> StepKind;

    /// Checks parameters against the configuration store
    ///
    /// # Errors
    ///
    /// Returns every problem found.
    fn validate(
        &self,
        params: &Self::Parameters,
        store: &ConfigurationStore,
    ) -> Result<(), Vec<ValidationError>> {
        params.validate(store)
    }

    /// Runs the step to completion
    ///
    /// # Errors
    ///
    /// Returns a `StepError` when the command line cannot be built, the CLI
    /// cannot be run or exits nonzero, or the store cannot be saved.
    fn execute(
        &self,
        params: &Self::Parameters,
        store: &mut ConfigurationStore,
        ctx: &StepContext,
    ) -> Result<StepReport, StepError>;
}

/// Context of one step run
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Job the step belongs to; scopes credential lookups
    pub job_name: String,

    /// Job workspace; the CLI runs here
    pub workspace: PathBuf,

    /// Environment passed to the CLI
    pub env: HashMap<String, String>,

    /// Raised to abort the run
    pub cancel: CancellationToken,

    /// Shell family of the agent
    pub shell: ShellKind,
}

impl StepContext {
    /// Creates a context inheriting this process's environment
    #[must_use]
    pub fn new(job_name: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            job_name: job_name.into(),
            workspace: workspace.into(),
            env: std::env::vars().collect(),
            cancel: CancellationToken::new(),
            shell: ShellKind::current(),
        }
    }

    /// Replaces the whole environment
    #[must_use]
    pub fn with_env_vars(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Sets one environment variable
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the cancellation token
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sets the shell family
    #[must_use]
    pub fn with_shell(mut self, shell: ShellKind) -> Self {
        self.shell = shell;
        self
    }

    /// Gets an environment variable
    #[must_use]
    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Root directory for data the CLI keeps between runs
    ///
    /// `JENKINS_HOME` when set, else the directory of the configuration
    /// store, else the workspace.
    #[must_use]
    pub fn persist_root(&self, store: &ConfigurationStore) -> String {
        if let Some(home) = self.get_env(JENKINS_HOME_VAR).filter(|home| !home.trim().is_empty()) {
            return home.to_string();
        }

        store
            .directory()
            .unwrap_or(self.workspace.as_path())
            .to_string_lossy()
            .into_owned()
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Which step ran
    pub kind: StepKind,

    /// Host the CLI talked to
    pub host: String,

    /// CLI data directory used by the run
    pub data_dir: PathBuf,

    /// Last execution time recorded by a download, epoch milliseconds
    pub last_execution_time: Option<i64>,

    /// Wall time of the CLI call
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::StoreDocument;
    use std::path::Path;

    #[test]
    fn test_context_builders() {
        let cancel = CancellationToken::new();
        let ctx = StepContext::new("nightly", "/ws")
            .with_env_vars(HashMap::new())
            .with_env("FOO", "bar")
            .with_cancel(cancel.clone())
            .with_shell(ShellKind::Windows);

        assert_eq!(ctx.job_name, "nightly");
        assert_eq!(ctx.get_env("FOO"), Some("bar"));
        assert_eq!(ctx.get_env("PATH"), None);
        assert_eq!(ctx.shell, ShellKind::Windows);

        cancel.cancel();
        assert!(ctx.cancel.is_cancelled());
    }

    #[test]
    fn test_persist_root_prefers_jenkins_home() {
        let store = ConfigurationStore::default();
        let ctx = StepContext::new("job", "/ws")
            .with_env_vars(HashMap::new())
            .with_env(JENKINS_HOME_VAR, "/var/jenkins_home");
        assert_eq!(ctx.persist_root(&store), "/var/jenkins_home");
    }

    #[test]
    fn test_persist_root_falls_back_to_workspace() {
        let ctx = StepContext::new("job", "/ws").with_env_vars(HashMap::new());
        let store = ConfigurationStore::in_memory(StoreDocument::default());
        assert_eq!(Path::new(&ctx.persist_root(&store)), Path::new("/ws"));
    }

    #[test]
    fn test_persist_root_uses_store_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = ConfigurationStore::load_or_default(temp_dir.path().join("config.yaml")).unwrap();
        let ctx = StepContext::new("job", "/ws")
            .with_env_vars(HashMap::new())
            .with_env(JENKINS_HOME_VAR, " ");
        assert_eq!(Path::new(&ctx.persist_root(&store)), temp_dir.path());
    }
}
