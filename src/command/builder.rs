//! Command line construction for the download and upload steps
//!
//! Both builders are pure: they take resolved settings and paths and return
//! an [`ArgumentVector`]. Nothing here touches the filesystem or the
//! configuration store.

use super::arguments::{ArgValue, ArgumentVector, flags};
use super::version::{CliCompatibility, CliVersion};
use crate::infrastructure::{Credentials, HostConnection, ZAdviserSettings, check_initial_date_range};
use crate::step::{DownloadParameters, StepError, StepKind, UploadParameters, ValidationError, non_blank};
use std::fmt;
use std::path::Path;

/// Shell family of the agent running the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    /// Linux and other unix systems
    Posix,
    /// Windows
    Windows,
}

impl ShellKind {
    /// Shell family of the running system
    #[must_use]
    pub fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Posix }
    }

    /// File name of the CLI launcher script
    #[must_use]
    pub fn script_name(self) -> &'static str {
        match self {
            Self::Posix => "ZAdviserCLI.sh",
            Self::Windows => "ZAdviserCLI.bat",
        }
    }

    /// Path separator used when joining the install directory and script
    #[must_use]
    pub fn separator(self) -> char {
        match self {
            Self::Posix => '/',
            Self::Windows => '\\',
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// `<location>/<script>` for the given shell
#[must_use]
pub fn script_path(location: &str, shell: ShellKind) -> String {
    let directory = location.trim().trim_end_matches(['/', '\\']);
    format!("{directory}{}{}", shell.separator(), shell.script_name())
}

/// An installed ZAdviser CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliInstallation {
    /// Install directory
    pub location: String,
    /// Shell family the script is written for
    pub shell: ShellKind,
    /// Installed version
    pub version: CliVersion,
}

impl CliInstallation {
    /// Describes an installation
    #[must_use]
    pub fn new(location: impl Into<String>, shell: ShellKind, version: CliVersion) -> Self {
        Self {
            location: location.into(),
            shell,
            version,
        }
    }

    /// Full path of the launcher script
    #[must_use]
    pub fn script_path(&self) -> String {
        script_path(&self.location, self.shell)
    }

    /// File name of the launcher script
    #[must_use]
    pub fn script_name(&self) -> &'static str {
        self.shell.script_name()
    }
}

/// Everything the download command line is built from
#[derive(Debug, Clone, Copy)]
pub struct DownloadInputs<'a> {
    /// Step parameters
    pub params: &'a DownloadParameters,
    /// Resolved host connection
    pub connection: &'a HostConnection,
    /// Resolved login
    pub credentials: &'a Credentials,
    /// Settings snapshot
    pub settings: &'a ZAdviserSettings,
    /// CLI installation
    pub cli: &'a CliInstallation,
    /// Version requirements
    pub compatibility: &'a CliCompatibility,
    /// Unique CLI data directory for this run
    pub data_dir: &'a Path,
    /// JCL file written for this run
    pub jcl_file: &'a Path,
    /// Root directory for data the CLI keeps between runs
    pub persist_root: &'a str,
}

/// Everything the upload command line is built from
#[derive(Debug, Clone, Copy)]
pub struct UploadInputs<'a> {
    /// Step parameters
    pub params: &'a UploadParameters,
    /// Resolved host connection
    pub connection: &'a HostConnection,
    /// Resolved login, when the step names one
    pub credentials: Option<&'a Credentials>,
    /// Settings snapshot
    pub settings: &'a ZAdviserSettings,
    /// CLI installation
    pub cli: &'a CliInstallation,
    /// Version requirements
    pub compatibility: &'a CliCompatibility,
    /// Unique CLI data directory for this run
    pub data_dir: &'a Path,
    /// Root directory for data the CLI keeps between runs
    pub persist_root: &'a str,
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn push_connection(
    args: &mut ArgumentVector,
    connection: &HostConnection,
    credentials: Option<&Credentials>,
    cli: &CliInstallation,
    compatibility: &CliCompatibility,
) -> Result<(), StepError> {
    args.push(flags::HOST, ArgValue::quoted(connection.host.trim()))
        .push(flags::PORT, ArgValue::quoted(connection.port.to_string()));

    if let Some(credentials) = credentials {
        args.push(flags::USER_ID, ArgValue::quoted(credentials.username.as_str()))
            .push(flags::PASSWORD, ArgValue::quoted_secret(&credentials.password));
    }

    if let Some(protocol) = connection.effective_protocol() {
        compatibility.check_protocol(&cli.version)?;
        args.push(flags::PROTOCOL, ArgValue::plain(protocol));
    }

    args.push_non_blank(flags::CODE_PAGE, Some(connection.code_page.as_str()), ArgValue::plain)
        .push(flags::TIMEOUT, ArgValue::quoted(connection.timeout.to_string()));
    Ok(())
}

/// Builds the download step command line
///
/// The JCL file and data directory must already be decided; the builder
/// only records their paths.
///
/// # Errors
///
/// * `StepError::VersionIncompatible` if the CLI is too old, or too old for
///   the connection's protocol.
/// * `StepError::Configuration` if the host has no last execution time and
///   no initial date range is configured.
pub fn build_download_arguments(inputs: &DownloadInputs<'_>) -> Result<ArgumentVector, StepError> {
    let DownloadInputs {
        params,
        connection,
        credentials,
        settings,
        cli,
        compatibility,
        data_dir,
        jcl_file,
        persist_root,
    } = *inputs;

    compatibility.check_minimum(&cli.version)?;

    let mut args = ArgumentVector::new(cli.script_path());
    push_connection(&mut args, connection, Some(credentials), cli, compatibility)?;

    args.push(flags::DATA, ArgValue::plain(path_value(data_dir)))
        .push(flags::BUILD_STEP, ArgValue::plain(StepKind::Download.cli_marker()))
        .push(flags::JCL_FILE_PATH, ArgValue::quoted(path_value(jcl_file)))
        .push_non_blank(
            flags::UNENCRYPTED_DATA_FILE,
            Some(params.unencrypted_data_file.as_str()),
            ArgValue::quoted,
        );

    let host = connection.host.trim();
    if let Some(last_run) = settings.last_execution_time(host) {
        args.push(flags::LAST_DATE_RUN, ArgValue::plain(last_run.to_string()));
    } else if let Some(range) = settings.initial_date_range() {
        let days = check_initial_date_range(range)
            .map_err(|e| StepError::Configuration(e.to_string()))?
            .unwrap_or_default();
        args.push(flags::INITIAL_DATE_RANGE, ArgValue::plain(days.to_string()));
    } else {
        return Err(StepError::Configuration(format!(
            "host '{host}' has no last execution time and no initial date range is configured"
        )));
    }

    if params.needs_access_key() {
        if let Some(access_key) = settings.access_key() {
            args.push(flags::ACCESS_KEY, ArgValue::secret(access_key));
        }
        args.push_non_blank(flags::CUSTOMER_ID, settings.customer_id(), ArgValue::plain);
    }

    if params.encrypt_data {
        if let Some(encryption_key) = settings.encryption_key() {
            args.push(flags::ENCRYPTION_KEY, ArgValue::secret(encryption_key));
        }
        args.push_non_blank(
            flags::ENCRYPTED_DATA_FILE,
            Some(params.encrypted_data_file.as_str()),
            ArgValue::quoted,
        );
    }

    args.push_non_blank(flags::UPLOAD_DATA_FILE, params.upload_source(), ArgValue::quoted)
        .push_non_blank(flags::PERSIST_DATA, Some(persist_root), ArgValue::quoted);

    Ok(args)
}

/// Builds the upload step command line
///
/// # Errors
///
/// * `StepError::VersionIncompatible` as for the download builder.
/// * `StepError::Validation` if the upload file is blank or no access key
///   is configured.
pub fn build_upload_arguments(inputs: &UploadInputs<'_>) -> Result<ArgumentVector, StepError> {
    let UploadInputs {
        params,
        connection,
        credentials,
        settings,
        cli,
        compatibility,
        data_dir,
        persist_root,
    } = *inputs;

    compatibility.check_minimum(&cli.version)?;

    let upload_file =
        non_blank(&params.upload_data_file).ok_or(ValidationError::MissingUploadDataFile)?;
    let access_key = settings.access_key().ok_or(ValidationError::MissingAccessKey)?;

    let mut args = ArgumentVector::new(cli.script_path());
    push_connection(&mut args, connection, credentials, cli, compatibility)?;

    args.push(flags::DATA, ArgValue::plain(path_value(data_dir)))
        .push(flags::BUILD_STEP, ArgValue::plain(StepKind::Upload.cli_marker()))
        .push(flags::ACCESS_KEY, ArgValue::secret(access_key))
        .push_non_blank(flags::CUSTOMER_ID, settings.customer_id(), ArgValue::plain)
        .push(flags::UPLOAD_DATA_FILE, ArgValue::quoted(upload_file))
        .push_non_blank(flags::PERSIST_DATA, Some(persist_root), ArgValue::quoted);

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::version::ZADVISER_MINIMUM_CLI_VERSION;
    use crate::infrastructure::Sensitive;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    struct Fixture {
        params: DownloadParameters,
        connection: HostConnection,
        credentials: Credentials,
        settings: ZAdviserSettings,
        cli: CliInstallation,
        compatibility: CliCompatibility,
        data_dir: PathBuf,
        jcl_file: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let mut settings = ZAdviserSettings::default();
            settings.access_key = Some(Sensitive::new("accessKeyValue"));
            settings.encryption_key = Some(Sensitive::new("encryptionKeyValue"));
            settings.customer_id = Some("customerIdValue".to_string());
            settings.initial_date_range = Some("30".to_string());

            let mut connection = HostConnection::new("12345", "cw01", 30947);
            connection.timeout = 123;

            Self {
                params: DownloadParameters::new("12345", "67890", "//JOB", "/d/u.csv", "/d/e.csv"),
                connection,
                credentials: Credentials::new("67890", "xdevreg", Sensitive::new("pw")),
                settings,
                cli: CliInstallation::new("/opt/cli", ShellKind::Posix, ZADVISER_MINIMUM_CLI_VERSION),
                compatibility: CliCompatibility::default(),
                data_dir: PathBuf::from("/ws/TopazCliWkspc1"),
                jcl_file: PathBuf::from("/ws/jcl1.txt"),
            }
        }

        fn download(&self) -> Result<ArgumentVector, StepError> {
            build_download_arguments(&DownloadInputs {
                params: &self.params,
                connection: &self.connection,
                credentials: &self.credentials,
                settings: &self.settings,
                cli: &self.cli,
                compatibility: &self.compatibility,
                data_dir: &self.data_dir,
                jcl_file: &self.jcl_file,
                persist_root: "/var/jenkins",
            })
        }

        fn upload(&self, params: &UploadParameters, with_login: bool) -> Result<ArgumentVector, StepError> {
            build_upload_arguments(&UploadInputs {
                params,
                connection: &self.connection,
                credentials: with_login.then_some(&self.credentials),
                settings: &self.settings,
                cli: &self.cli,
                compatibility: &self.compatibility,
                data_dir: &self.data_dir,
                persist_root: "/var/jenkins",
            })
        }
    }

    #[test]
    fn test_script_path() {
        assert_eq!(script_path("/opt/cli", ShellKind::Posix), "/opt/cli/ZAdviserCLI.sh");
        assert_eq!(script_path("/opt/cli/", ShellKind::Posix), "/opt/cli/ZAdviserCLI.sh");
        assert_eq!(
            script_path("C:\\TopazCLI\\", ShellKind::Windows),
            "C:\\TopazCLI\\ZAdviserCLI.bat"
        );
    }

    #[test]
    fn test_download_flag_order() {
        let args = Fixture::new().download().unwrap();
        assert_eq!(args.program(), "/opt/cli/ZAdviserCLI.sh");
        assert_eq!(
            args.flags().collect::<Vec<_>>(),
            vec![
                flags::HOST,
                flags::PORT,
                flags::USER_ID,
                flags::PASSWORD,
                flags::CODE_PAGE,
                flags::TIMEOUT,
                flags::DATA,
                flags::BUILD_STEP,
                flags::JCL_FILE_PATH,
                flags::UNENCRYPTED_DATA_FILE,
                flags::INITIAL_DATE_RANGE,
                flags::ACCESS_KEY,
                flags::CUSTOMER_ID,
                flags::UPLOAD_DATA_FILE,
                flags::PERSIST_DATA,
            ]
        );
    }

    #[test]
    fn test_download_rendered_values() {
        let args = Fixture::new().download().unwrap();
        let rendered = args.to_command_args();
        assert_eq!(
            rendered[..12].to_vec(),
            vec![
                "-host", "\"cw01\"", "-port", "\"30947\"", "-id", "\"xdevreg\"", "-pass", "\"pw\"",
                "-code", "1047", "-timeout", "\"123\"",
            ]
        );
        assert_eq!(rendered[12..14].to_vec(), vec!["-data", "/ws/TopazCliWkspc1"]);
        assert_eq!(args.value_of(flags::JCL_FILE_PATH).unwrap().rendered(), "\"/ws/jcl1.txt\"");
        assert_eq!(args.value_of(flags::BUILD_STEP).unwrap().rendered(), "D");
        assert_eq!(args.value_of(flags::INITIAL_DATE_RANGE).unwrap().rendered(), "30");
        assert_eq!(args.value_of(flags::CUSTOMER_ID).unwrap().rendered(), "customerIdValue");
        assert_eq!(args.value_of(flags::PERSIST_DATA).unwrap().rendered(), "\"/var/jenkins\"");
        assert!(args.value_of(flags::PASSWORD).unwrap().is_sensitive());
        assert!(args.value_of(flags::ACCESS_KEY).unwrap().is_sensitive());
    }

    #[test]
    fn test_upload_unencrypted_file() {
        let args = Fixture::new().download().unwrap();
        assert_eq!(args.value_of(flags::UPLOAD_DATA_FILE).unwrap().raw(), "/d/u.csv");
        assert!(!args.contains(flags::ENCRYPTION_KEY));
        assert!(!args.contains(flags::ENCRYPTED_DATA_FILE));
    }

    #[test]
    fn test_upload_encrypted_file() {
        let mut fixture = Fixture::new();
        fixture.params = fixture.params.clone().with_encrypt_data(true);
        let args = fixture.download().unwrap();

        assert_eq!(args.value_of(flags::UPLOAD_DATA_FILE).unwrap().raw(), "/d/e.csv");
        assert_eq!(args.value_of(flags::ACCESS_KEY).unwrap().raw(), "accessKeyValue");
        assert_eq!(args.value_of(flags::ENCRYPTION_KEY).unwrap().raw(), "encryptionKeyValue");
        assert_eq!(args.value_of(flags::ENCRYPTED_DATA_FILE).unwrap().raw(), "/d/e.csv");
    }

    #[test]
    fn test_no_upload_no_encrypt_skips_secrets() {
        let mut fixture = Fixture::new();
        fixture.params = fixture.params.clone().with_upload_data(false);
        let args = fixture.download().unwrap();

        assert!(!args.contains(flags::UPLOAD_DATA_FILE));
        assert!(!args.contains(flags::ACCESS_KEY));
        assert!(!args.contains(flags::CUSTOMER_ID));
    }

    #[test]
    fn test_last_date_run_wins_over_initial_range() {
        let mut fixture = Fixture::new();
        fixture.settings.last_execution_times.insert("cw01".to_string(), 1_700_000_000_000);
        let args = fixture.download().unwrap();

        assert_eq!(args.value_of(flags::LAST_DATE_RUN).unwrap().raw(), "1700000000000");
        assert!(!args.contains(flags::INITIAL_DATE_RANGE));
    }

    #[test]
    fn test_missing_date_source_is_configuration_error() {
        let mut fixture = Fixture::new();
        fixture.settings.initial_date_range = Some("  ".to_string());
        assert!(matches!(fixture.download(), Err(StepError::Configuration(_))));
    }

    #[test]
    fn test_invalid_initial_range_is_configuration_error() {
        let mut fixture = Fixture::new();
        fixture.settings.initial_date_range = Some("-5".to_string());
        let err = fixture.download().unwrap_err();
        assert!(matches!(&err, StepError::Configuration(message) if message.contains("-5")), "{err}");

        fixture.settings.initial_date_range = Some("+7".to_string());
        let args = fixture.download().unwrap();
        assert_eq!(args.value_of(flags::INITIAL_DATE_RANGE).unwrap().raw(), "7");
    }

    #[test]
    fn test_protocol_handling() {
        let mut fixture = Fixture::new();
        fixture.connection.protocol = Some("NONE".to_string());
        assert!(!fixture.download().unwrap().contains(flags::PROTOCOL));

        fixture.connection.protocol = Some("TLSv1.2".to_string());
        let args = fixture.download().unwrap();
        assert_eq!(args.value_of(flags::PROTOCOL).unwrap().rendered(), "TLSv1.2");

        fixture.compatibility = CliCompatibility {
            minimum: CliVersion::new(19, 1, 1),
            protocol_minimum: CliVersion::new(20, 1, 1),
        };
        fixture.cli.version = CliVersion::new(19, 6, 1);
        assert!(matches!(
            fixture.download(),
            Err(StepError::VersionIncompatible { .. })
        ));
    }

    #[test]
    fn test_old_cli_is_rejected() {
        let mut fixture = Fixture::new();
        fixture.cli.version = CliVersion::new(20, 1, 1);
        assert!(matches!(
            fixture.download(),
            Err(StepError::VersionIncompatible { .. })
        ));
    }

    #[test]
    fn test_values_are_escaped() {
        let mut fixture = Fixture::new();
        fixture.credentials.password = Sensitive::new("pa\"ss");
        fixture.params = DownloadParameters::new("1", "2", "jcl", "/my dir/u.csv", "");
        let args = fixture.download().unwrap();

        assert_eq!(args.value_of(flags::PASSWORD).unwrap().rendered(), "\"pa\"\"ss\"");
        assert_eq!(
            args.value_of(flags::UNENCRYPTED_DATA_FILE).unwrap().rendered(),
            "\"/my dir/u.csv\""
        );
    }

    #[test]
    fn test_upload_builder() {
        let fixture = Fixture::new();
        let params = UploadParameters::new("12345", "/test/encrypted.csv");
        let args = fixture.upload(&params, false).unwrap();

        assert_eq!(
            args.flags().collect::<Vec<_>>(),
            vec![
                flags::HOST,
                flags::PORT,
                flags::CODE_PAGE,
                flags::TIMEOUT,
                flags::DATA,
                flags::BUILD_STEP,
                flags::ACCESS_KEY,
                flags::CUSTOMER_ID,
                flags::UPLOAD_DATA_FILE,
                flags::PERSIST_DATA,
            ]
        );
        assert_eq!(args.value_of(flags::BUILD_STEP).unwrap().rendered(), "U");
        assert_eq!(args.value_of(flags::DATA).unwrap().rendered(), "/ws/TopazCliWkspc1");

        let with_login = fixture.upload(&params, true).unwrap();
        assert!(with_login.contains(flags::USER_ID));
        assert!(with_login.contains(flags::PASSWORD));
    }

    #[test]
    fn test_upload_builder_requirements() {
        let mut fixture = Fixture::new();
        let blank = UploadParameters::new("12345", " ");
        assert_eq!(
            fixture.upload(&blank, false).unwrap_err(),
            StepError::Validation(ValidationError::MissingUploadDataFile)
        );

        fixture.settings.access_key = None;
        let params = UploadParameters::new("12345", "/test/encrypted.csv");
        assert_eq!(
            fixture.upload(&params, false).unwrap_err(),
            StepError::Validation(ValidationError::MissingAccessKey)
        );
    }
}
