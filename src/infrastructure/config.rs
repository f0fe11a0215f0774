//! Configuration store
//!
//! Holds host connections, credentials, the CLI installation and the
//! ZAdviser settings, and persists them as one YAML document. A store is
//! passed explicitly to whatever needs it; there is no global instance.

use super::secret::Sensitive;
use super::settings::{Credentials, HostConnection, StoreDocument, ZAdviserSettings};
use crate::command::ShellKind;
use crate::step::{StepError, ValidationError, non_blank};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the store file
pub const CONFIG_ENV_VAR: &str = "ZADVISER_CONFIG";

/// Configuration store backed by an optional YAML file
#[derive(Debug, Clone, Default)]
pub struct ConfigurationStore {
    /// Backing file; `None` for in-memory stores
    path: Option<PathBuf>,

    /// Current contents
    document: StoreDocument,
}

impl ConfigurationStore {
    /// Creates an in-memory store; [`save`](Self::save) does nothing
    #[must_use]
    pub fn in_memory(document: StoreDocument) -> Self {
        Self {
            path: None,
            document,
        }
    }

    /// Default store location: `<config dir>/zadviser/config.yaml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zadviser").join("config.yaml"))
    }

    /// Loads an existing store file
    ///
    /// # Errors
    ///
    /// Returns `StepError::Store` if the file cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StepError> {
        let path = path.into();
        let text = fs::read_to_string(&path)
            .map_err(|e| StepError::Store(format!("cannot read {}: {e}", path.display())))?;
        let mut document: StoreDocument = serde_yaml::from_str(&text)
            .map_err(|e| StepError::Store(format!("cannot parse {}: {e}", path.display())))?;

        let range = document.zadviser.initial_date_range.as_deref().unwrap_or_default();
        let days = check_initial_date_range(range)
            .map_err(|e| StepError::Store(format!("invalid {}: {e}", path.display())))?;
        document.zadviser.initial_date_range = days.map(|days| days.to_string());

        tracing::debug!(
            path = %path.display(),
            connections = document.host_connections.len(),
            credentials = document.credentials.len(),
            "Loaded configuration store"
        );

        Ok(Self {
            path: Some(path),
            document,
        })
    }

    /// Loads the store file, or starts an empty store bound to `path`
    ///
    /// # Errors
    ///
    /// Returns `StepError::Store` if the file exists but cannot be read.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self, StepError> {
        let path = path.into();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No configuration store yet, starting empty");
            Ok(Self {
                path: Some(path),
                document: StoreDocument::default(),
            })
        }
    }

    /// Writes the store back to its file
    ///
    /// On unix the file is readable by its owner only, since it holds secrets.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Store` if serialization or writing fails.
    pub fn save(&self) -> Result<(), StepError> {
        let Some(path) = &self.path else {
            tracing::debug!("In-memory configuration store, nothing to save");
            return Ok(());
        };

        let text = serde_yaml::to_string(&self.document)
            .map_err(|e| StepError::Store(format!("cannot serialize configuration: {e}")))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| StepError::Store(format!("cannot create {}: {e}", parent.display())))?;
        }

        fs::write(path, text)
            .map_err(|e| StepError::Store(format!("cannot write {}: {e}", path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .map_err(|e| StepError::Store(format!("cannot restrict {}: {e}", path.display())))?;
        }

        tracing::info!(path = %path.display(), "Configuration store saved");
        Ok(())
    }

    /// Backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Directory holding the backing file
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Current contents
    #[must_use]
    pub fn document(&self) -> &StoreDocument {
        &self.document
    }

    /// Mutable contents, for editing connections and credentials
    pub fn document_mut(&mut self) -> &mut StoreDocument {
        &mut self.document
    }

    /// ZAdviser settings snapshot
    #[must_use]
    pub fn settings(&self) -> &ZAdviserSettings {
        &self.document.zadviser
    }

    /// All host connections
    #[must_use]
    pub fn host_connections(&self) -> &[HostConnection] {
        &self.document.host_connections
    }

    /// Resolves a host connection by id
    ///
    /// # Errors
    ///
    /// Returns `StepError::Configuration` if no connection has this id.
    pub fn host_connection(&self, connection_id: &str) -> Result<&HostConnection, StepError> {
        let wanted = connection_id.trim();
        self.document
            .host_connections
            .iter()
            .find(|connection| connection.connection_id == wanted)
            .ok_or_else(|| {
                StepError::Configuration(format!("host connection '{wanted}' does not exist"))
            })
    }

    /// Resolves login credentials by id within the scope of `job`
    ///
    /// # Errors
    ///
    /// Returns `StepError::Configuration` if no credentials with this id are
    /// visible to the job.
    pub fn login_information(&self, job: &str, credentials_id: &str) -> Result<&Credentials, StepError> {
        let wanted = credentials_id.trim();
        self.document
            .credentials
            .iter()
            .find(|credentials| credentials.id == wanted && credentials.is_visible_to(job))
            .ok_or_else(|| {
                StepError::Configuration(format!(
                    "credentials '{wanted}' do not exist or are not available to job '{job}'"
                ))
            })
    }

    /// CLI install directory for the given shell
    ///
    /// # Errors
    ///
    /// Returns `StepError::Configuration` if no location is configured.
    pub fn cli_location(&self, shell: ShellKind) -> Result<&str, StepError> {
        let location = match shell {
            ShellKind::Posix => self.document.cli.location_linux.as_deref(),
            ShellKind::Windows => self.document.cli.location_windows.as_deref(),
        };

        location.and_then(non_blank).ok_or_else(|| {
            StepError::Configuration(format!("no ZAdviser CLI location configured for {shell}"))
        })
    }

    /// Forced CLI version, if configured
    #[must_use]
    pub fn cli_version_override(&self) -> Option<&str> {
        self.document.cli.version_override.as_deref().and_then(non_blank)
    }

    /// Access key
    #[must_use]
    pub fn access_key(&self) -> Option<&Sensitive> {
        self.document.zadviser.access_key()
    }

    /// Sets or clears the access key; blank clears
    pub fn set_access_key(&mut self, access_key: Option<Sensitive>) {
        self.document.zadviser.access_key = Sensitive::non_blank(access_key);
    }

    /// Encryption key
    #[must_use]
    pub fn encryption_key(&self) -> Option<&Sensitive> {
        self.document.zadviser.encryption_key()
    }

    /// Sets or clears the encryption key; blank clears
    pub fn set_encryption_key(&mut self, encryption_key: Option<Sensitive>) {
        self.document.zadviser.encryption_key = Sensitive::non_blank(encryption_key);
    }

    /// Customer id
    #[must_use]
    pub fn customer_id(&self) -> Option<&str> {
        self.document.zadviser.customer_id()
    }

    /// Sets or clears the customer id; blank clears
    pub fn set_customer_id(&mut self, customer_id: Option<String>) {
        self.document.zadviser.customer_id = customer_id
            .as_deref()
            .and_then(non_blank)
            .map(str::to_string);
    }

    /// Initial date range
    #[must_use]
    pub fn initial_date_range(&self) -> Option<&str> {
        self.document.zadviser.initial_date_range()
    }

    /// Sets or clears the initial date range
    ///
    /// The stored value is normalised, so `+30` is saved as `30`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidInitialDateRange` for values that are
    /// not unsigned integers; the setting is left unchanged.
    pub fn set_initial_date_range(&mut self, value: Option<&str>) -> Result<(), ValidationError> {
        let parsed = match value {
            Some(text) => check_initial_date_range(text)?,
            None => None,
        };
        self.document.zadviser.initial_date_range = parsed.map(|days| days.to_string());
        Ok(())
    }

    /// Last successful download time for `host`, in epoch milliseconds
    #[must_use]
    pub fn last_execution_time(&self, host: &str) -> Option<i64> {
        self.document.zadviser.last_execution_time(host)
    }

    /// All recorded download times
    #[must_use]
    pub fn last_execution_times(&self) -> &BTreeMap<String, i64> {
        &self.document.zadviser.last_execution_times
    }

    /// Records a successful download for `host`
    pub fn update_last_execution_time(&mut self, host: &str, timestamp_millis: i64) {
        self.document
            .zadviser
            .last_execution_times
            .insert(host.to_string(), timestamp_millis);
    }

    /// Forgets the download time for `host`, returning the old value
    pub fn reset_last_execution_time(&mut self, host: &str) -> Option<i64> {
        self.document.zadviser.last_execution_times.remove(host)
    }

    /// Checks the secrets required by the encrypt and upload options
    ///
    /// Either option needs an access key; encryption also needs an
    /// encryption key.
    #[must_use]
    pub fn validate_secrets(&self, encrypt_data: bool, upload_data: bool) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if (encrypt_data || upload_data) && self.access_key().is_none() {
            errors.push(ValidationError::MissingAccessKey);
        }
        if encrypt_data && self.encryption_key().is_none() {
            errors.push(ValidationError::MissingEncryptionKey);
        }

        errors
    }
}

/// Checks an initial date range entered by a user
///
/// Blank input is accepted and means "not set". Anything else must parse as
/// an unsigned 32-bit integer; a leading `+` is allowed.
///
/// # Errors
///
/// Returns `ValidationError::InvalidInitialDateRange` for other input.
pub fn check_initial_date_range(value: &str) -> Result<Option<u32>, ValidationError> {
    match non_blank(value) {
        None => Ok(None),
        Some(text) => text
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ValidationError::InvalidInitialDateRange(text.to_string())),
    }
}
