//! `zadviser config` - Inspect and edit the configuration store

use super::open_store;
use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use std::io::BufRead;
use std::path::Path;
use zadviser::infrastructure::{DEFAULT_CODE_PAGE, MASK, StoreDocument};
use zadviser::step::non_blank;
use zadviser::{CliVersion, ConfigurationStore, Credentials, HostConnection, Sensitive};

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the store with secrets masked
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: DocumentFormat,
    },

    /// Print the location of the store file
    Path,

    /// Change a setting; the value is read from stdin when omitted
    Set {
        /// Setting to change
        #[arg(value_enum)]
        key: SettingKey,
        /// New value; empty clears the setting
        value: Option<String>,
    },

    /// Add or replace a host connection
    AddConnection {
        /// Connection id referenced by steps
        #[arg(long)]
        id: String,
        /// Host name
        #[arg(long)]
        host: String,
        /// Port
        #[arg(long)]
        port: u16,
        /// Transport protocol, for example TLSv1.2
        #[arg(long)]
        protocol: Option<String>,
        /// Host code page
        #[arg(long, default_value = DEFAULT_CODE_PAGE)]
        code_page: String,
        /// Timeout in seconds, 0 for the CLI default
        #[arg(long, default_value_t = 0)]
        timeout: u32,
        /// Description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Add or replace login credentials; the password is read from stdin
    AddCredentials {
        /// Credentials id referenced by steps
        #[arg(long)]
        id: String,
        /// Login user id
        #[arg(long)]
        username: String,
        /// Restrict to this job; repeat for several jobs
        #[arg(long = "job")]
        jobs: Vec<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Show or reset last execution times
    LastRun {
        /// Only this host
        #[arg(long)]
        host: Option<String>,
        /// Forget the time, so the next download uses the initial date range
        #[arg(long, requires = "host")]
        reset: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SettingKey {
    AccessKey,
    EncryptionKey,
    CustomerId,
    InitialDateRange,
    CliLocationLinux,
    CliLocationWindows,
    CliVersion,
}

/// The store document with every secret replaced by the mask
#[must_use]
pub fn masked_document(document: &StoreDocument) -> StoreDocument {
    let mut masked = document.clone();
    for credentials in &mut masked.credentials {
        credentials.password = Sensitive::new(MASK);
    }
    let settings = &mut masked.zadviser;
    settings.access_key = settings.access_key.as_ref().map(|_| Sensitive::new(MASK));
    settings.encryption_key = settings.encryption_key.as_ref().map(|_| Sensitive::new(MASK));
    masked
}

fn read_value(value: Option<String>, prompt: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }

    eprintln!("{prompt}");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read value from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn optional(value: &str) -> Option<String> {
    non_blank(value).map(str::to_string)
}

/// Applies one `config set`
///
/// # Errors
///
/// Returns an error for an invalid initial date range or CLI version.
pub fn apply_setting(store: &mut ConfigurationStore, key: SettingKey, value: &str) -> Result<()> {
    match key {
        SettingKey::AccessKey => store.set_access_key(Some(Sensitive::new(value))),
        SettingKey::EncryptionKey => store.set_encryption_key(Some(Sensitive::new(value))),
        SettingKey::CustomerId => store.set_customer_id(Some(value.to_string())),
        SettingKey::InitialDateRange => store.set_initial_date_range(Some(value))?,
        SettingKey::CliLocationLinux => store.document_mut().cli.location_linux = optional(value),
        SettingKey::CliLocationWindows => {
            store.document_mut().cli.location_windows = optional(value);
        }
        SettingKey::CliVersion => {
            if let Some(version) = non_blank(value) {
                version.parse::<CliVersion>()?;
            }
            store.document_mut().cli.version_override = optional(value);
        }
    }
    Ok(())
}

fn upsert_connection(store: &mut ConfigurationStore, connection: HostConnection) {
    let connections = &mut store.document_mut().host_connections;
    match connections
        .iter_mut()
        .find(|existing| existing.connection_id == connection.connection_id)
    {
        Some(existing) => *existing = connection,
        None => connections.push(connection),
    }
}

fn upsert_credentials(store: &mut ConfigurationStore, credentials: Credentials) {
    let all = &mut store.document_mut().credentials;
    match all.iter_mut().find(|existing| existing.id == credentials.id) {
        Some(existing) => *existing = credentials,
        None => all.push(credentials),
    }
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map_or_else(|| "invalid time".to_string(), |time| time.to_rfc3339())
}

/// Runs a `config` action
///
/// # Errors
///
/// Returns an error if the store cannot be opened, changed or saved.
pub fn run_config(store_path: Option<&Path>, action: ConfigAction) -> Result<()> {
    let mut store = open_store(store_path)?;

    match action {
        ConfigAction::Show { format } => {
            let masked = masked_document(store.document());
            let text = match format {
                DocumentFormat::Yaml => serde_yaml::to_string(&masked)?,
                DocumentFormat::Json => serde_json::to_string_pretty(&masked)?,
            };
            println!("{text}");
            return Ok(());
        }
        ConfigAction::Path => {
            match store.path() {
                Some(path) => println!("{}", path.display()),
                None => println!("(in memory)"),
            }
            return Ok(());
        }
        ConfigAction::Set { key, value } => {
            let value = read_value(value, &format!("Enter value for {key:?}:"))?;
            apply_setting(&mut store, key, &value)?;
        }
        ConfigAction::AddConnection {
            id,
            host,
            port,
            protocol,
            code_page,
            timeout,
            description,
        } => {
            let mut connection = HostConnection::new(id.trim(), host.trim(), port);
            connection.protocol = protocol;
            connection.code_page = code_page;
            connection.timeout = timeout;
            connection.description = description;
            upsert_connection(&mut store, connection);
        }
        ConfigAction::AddCredentials {
            id,
            username,
            jobs,
            description,
        } => {
            let password = read_value(None, &format!("Enter password for {username}:"))?;
            let mut credentials = Credentials::new(id.trim(), username, Sensitive::new(password));
            credentials.jobs = jobs;
            credentials.description = description;
            upsert_credentials(&mut store, credentials);
        }
        ConfigAction::LastRun { host, reset } => {
            if reset {
                let host = host.unwrap_or_default();
                match store.reset_last_execution_time(&host) {
                    Some(old) => println!("Reset {host} (was {})", format_millis(old)),
                    None => {
                        println!("No last execution time recorded for {host}");
                        return Ok(());
                    }
                }
            } else {
                for (name, millis) in store.last_execution_times() {
                    if host.as_deref().is_none_or(|wanted| wanted == name) {
                        println!("{name}\t{millis}\t{}", format_millis(*millis));
                    }
                }
                return Ok(());
            }
        }
    }

    store.save()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_document_hides_secrets() {
        let mut store = ConfigurationStore::default();
        store.set_access_key(Some(Sensitive::new("accessKeyValue")));
        store
            .document_mut()
            .credentials
            .push(Credentials::new("1", "xdevreg", Sensitive::new("pw")));

        let yaml = serde_yaml::to_string(&masked_document(store.document())).unwrap();
        assert!(!yaml.contains("accessKeyValue"));
        assert!(!yaml.contains("pw\n"));
        assert!(yaml.contains(MASK));
        assert!(!yaml.contains("encryption_key"));
    }

    #[test]
    fn test_apply_setting() {
        let mut store = ConfigurationStore::default();
        apply_setting(&mut store, SettingKey::InitialDateRange, "+7").unwrap();
        assert_eq!(store.initial_date_range(), Some("7"));
        assert!(apply_setting(&mut store, SettingKey::InitialDateRange, "-1").is_err());

        apply_setting(&mut store, SettingKey::CliVersion, "20.02.01").unwrap();
        assert_eq!(store.cli_version_override(), Some("20.02.01"));
        assert!(apply_setting(&mut store, SettingKey::CliVersion, "latest").is_err());

        apply_setting(&mut store, SettingKey::CliLocationLinux, "/opt/cli").unwrap();
        apply_setting(&mut store, SettingKey::CustomerId, "cust").unwrap();
        assert_eq!(store.customer_id(), Some("cust"));

        apply_setting(&mut store, SettingKey::CustomerId, "").unwrap();
        assert_eq!(store.customer_id(), None);
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut store = ConfigurationStore::default();
        upsert_connection(&mut store, HostConnection::new("1", "cw01", 30947));
        upsert_connection(&mut store, HostConnection::new("1", "cw02", 30947));
        upsert_connection(&mut store, HostConnection::new("2", "cw03", 30947));

        let hosts: Vec<_> = store.host_connections().iter().map(|c| c.host.as_str()).collect();
        assert_eq!(hosts, vec!["cw02", "cw03"]);
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "1970-01-01T00:00:00+00:00");
    }
}
