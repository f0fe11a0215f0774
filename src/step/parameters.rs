//! Per-job parameters of the download and upload steps
//!
//! Parameters are created when a job is configured and never change during a
//! run. String fields are trimmed on construction, so a field that only holds
//! whitespace behaves exactly like an empty one.

use super::errors::ValidationError;
use super::types::{Validate, non_blank};
use crate::infrastructure::ConfigurationStore;
use serde::{Deserialize, Serialize};

/// JCL skeleton offered to users configuring a download step
pub const DEFAULT_JCL: &str = "\
//ZADVISER JOB ('ACCOUNT'),'ZADVISER',CLASS=A,MSGCLASS=X,NOTIFY=&SYSUID
//*
//* Collects SMF data for zAdviser. Replace the accounting information,
//* the job class and the data set names below with site values.
//*
//COLLECT  EXEC PGM=IFASMFDP
//SYSPRINT DD SYSOUT=*
//DUMPIN   DD DISP=SHR,DSN=SYS1.MANX
//DUMPOUT  DD DSN=&&SMFOUT,DISP=(NEW,PASS),SPACE=(CYL,(50,50),RLSE)
//SYSIN    DD *
  INDD(DUMPIN,OPTIONS(DUMP))
  OUTDD(DUMPOUT,TYPE(30,101,110))
/*
";

/// Parameters of the download step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadParameters {
    /// Host connection id in the configuration store
    pub connection_id: String,

    /// Credentials id in the configuration store
    pub credentials_id: String,

    /// Job control text submitted by the CLI
    pub jcl: String,

    /// Where the CLI writes the unencrypted data
    pub unencrypted_data_file: String,

    /// Where the CLI writes the encrypted data
    pub encrypted_data_file: String,

    /// Encrypt the collected data
    pub encrypt_data: bool,

    /// Upload the collected data
    pub upload_data: bool,
}

impl Default for DownloadParameters {
    fn default() -> Self {
        Self {
            connection_id: String::new(),
            credentials_id: String::new(),
            jcl: String::new(),
            unencrypted_data_file: String::new(),
            encrypted_data_file: String::new(),
            encrypt_data: false,
            upload_data: true,
        }
    }
}

impl DownloadParameters {
    /// Creates download parameters with encryption off and upload on
    #[must_use]
    pub fn new(
        connection_id: &str,
        credentials_id: &str,
        jcl: &str,
        unencrypted_data_file: &str,
        encrypted_data_file: &str,
    ) -> Self {
        Self {
            connection_id: connection_id.trim().to_string(),
            credentials_id: credentials_id.trim().to_string(),
            jcl: jcl.trim().to_string(),
            unencrypted_data_file: unencrypted_data_file.trim().to_string(),
            encrypted_data_file: encrypted_data_file.trim().to_string(),
            ..Self::default()
        }
    }

    /// Sets the encrypt flag
    #[must_use]
    pub fn with_encrypt_data(mut self, encrypt_data: bool) -> Self {
        self.encrypt_data = encrypt_data;
        self
    }

    /// Sets the upload flag
    #[must_use]
    pub fn with_upload_data(mut self, upload_data: bool) -> Self {
        self.upload_data = upload_data;
        self
    }

    /// True when the access key and customer id are needed
    #[must_use]
    pub fn needs_access_key(&self) -> bool {
        self.encrypt_data || self.upload_data
    }

    /// The file the CLI should upload, if any
    ///
    /// The encrypted file is uploaded when encryption is on, the unencrypted
    /// file otherwise. Nothing is uploaded when upload is off or the chosen
    /// path is blank.
    #[must_use]
    pub fn upload_source(&self) -> Option<&str> {
        if !self.upload_data {
            return None;
        }

        if self.encrypt_data {
            non_blank(&self.encrypted_data_file)
        } else {
            non_blank(&self.unencrypted_data_file)
        }
    }
}

impl Validate for DownloadParameters {
    fn validation_errors(&self, store: &ConfigurationStore) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if non_blank(&self.connection_id).is_none() {
            errors.push(ValidationError::MissingConnectionId);
        }
        if non_blank(&self.credentials_id).is_none() {
            errors.push(ValidationError::MissingCredentialsId);
        }
        if non_blank(&self.jcl).is_none() {
            errors.push(ValidationError::MissingJcl);
        }
        if non_blank(&self.unencrypted_data_file).is_none() {
            errors.push(ValidationError::MissingUnencryptedDataFile);
        }
        if self.encrypt_data && non_blank(&self.encrypted_data_file).is_none() {
            errors.push(ValidationError::MissingEncryptedDataFile);
        }

        errors.extend(store.validate_secrets(self.encrypt_data, self.upload_data));
        errors
    }
}

/// Parameters of the upload-only step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadParameters {
    /// Host connection id in the configuration store
    pub connection_id: String,

    /// Optional credentials id; login flags are only passed when set
    pub credentials_id: String,

    /// File to upload
    pub upload_data_file: String,
}

impl UploadParameters {
    /// Creates upload parameters without credentials
    #[must_use]
    pub fn new(connection_id: &str, upload_data_file: &str) -> Self {
        Self {
            connection_id: connection_id.trim().to_string(),
            credentials_id: String::new(),
            upload_data_file: upload_data_file.trim().to_string(),
        }
    }

    /// Sets the credentials id
    #[must_use]
    pub fn with_credentials_id(mut self, credentials_id: &str) -> Self {
        self.credentials_id = credentials_id.trim().to_string();
        self
    }
}

impl Validate for UploadParameters {
    fn validation_errors(&self, store: &ConfigurationStore) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if non_blank(&self.connection_id).is_none() {
            errors.push(ValidationError::MissingConnectionId);
        }

        // Secrets are only worth checking once there is something to upload.
        if non_blank(&self.upload_data_file).is_none() {
            errors.push(ValidationError::MissingUploadDataFile);
        } else {
            if store.access_key().is_none() {
                errors.push(ValidationError::MissingAccessKey);
            }
            if store.customer_id().is_none() {
                errors.push(ValidationError::MissingCustomerId);
            }
        }

        errors
    }
}
