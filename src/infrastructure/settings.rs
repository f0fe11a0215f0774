//! Persisted settings types
//!
//! These structs make up the configuration store document. They are plain
//! serde types; lookups and validation live on
//! [`ConfigurationStore`](super::ConfigurationStore).

use super::secret::{Sensitive, deserialize_non_blank};
use crate::step::non_blank;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default EBCDIC code page of a host connection
pub const DEFAULT_CODE_PAGE: &str = "1047";

/// A mainframe host the CLI can connect to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConnection {
    /// Unique id referenced by step parameters
    pub connection_id: String,

    /// Human readable name
    #[serde(default)]
    pub description: String,

    /// Host name or address
    pub host: String,

    /// Port
    pub port: u16,

    /// Transport protocol (for example `TLSv1.2`); blank or `None` means none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// Host code page
    #[serde(default = "default_code_page")]
    pub code_page: String,

    /// Connection timeout in seconds, 0 for the CLI default
    #[serde(default)]
    pub timeout: u32,
}

fn default_code_page() -> String {
    DEFAULT_CODE_PAGE.to_string()
}

impl HostConnection {
    /// Creates a connection with the default code page and no protocol
    #[must_use]
    pub fn new(connection_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            connection_id: connection_id.into(),
            description: String::new(),
            host: host.into(),
            port,
            protocol: None,
            code_page: default_code_page(),
            timeout: 0,
        }
    }

    /// `host:port`
    #[must_use]
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The protocol to pass on the command line, if any
    ///
    /// Blank values and the literal `none` (any case) mean no protocol.
    #[must_use]
    pub fn effective_protocol(&self) -> Option<&str> {
        self.protocol
            .as_deref()
            .and_then(non_blank)
            .filter(|protocol| !protocol.eq_ignore_ascii_case("none"))
    }
}

/// Username and password login information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Unique id referenced by step parameters
    pub id: String,

    /// Login user id
    pub username: String,

    /// Login password
    pub password: Sensitive,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Jobs allowed to use these credentials; empty means every job
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<String>,
}

impl Credentials {
    /// Creates credentials visible to every job
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>, password: Sensitive) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            password,
            description: None,
            jobs: Vec::new(),
        }
    }

    /// Restricts the credentials to the given jobs
    #[must_use]
    pub fn scoped_to(mut self, jobs: &[&str]) -> Self {
        self.jobs = jobs.iter().map(|job| (*job).to_string()).collect();
        self
    }

    /// True when `job` may use these credentials
    #[must_use]
    pub fn is_visible_to(&self, job: &str) -> bool {
        self.jobs.is_empty() || self.jobs.iter().any(|allowed| allowed == job)
    }
}

/// Where the ZAdviser CLI is installed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// Install directory on Linux and other unix agents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_linux: Option<String>,

    /// Install directory on Windows agents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_windows: Option<String>,

    /// Use this version instead of reading it from the installation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_override: Option<String>,
}

/// Plugin-wide ZAdviser settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZAdviserSettings {
    /// Gates upload and encryption
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_non_blank"
    )]
    pub access_key: Option<Sensitive>,

    /// Gates encryption
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_non_blank"
    )]
    pub encryption_key: Option<Sensitive>,

    /// Customer id sent with uploads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    /// Days of history requested when a host has never been collected from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_date_range: Option<String>,

    /// Host to epoch milliseconds of its last successful download
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub last_execution_times: BTreeMap<String, i64>,
}

impl ZAdviserSettings {
    /// Access key, if configured and non-blank
    #[must_use]
    pub fn access_key(&self) -> Option<&Sensitive> {
        self.access_key.as_ref().filter(|key| !key.is_blank())
    }

    /// Encryption key, if configured and non-blank
    #[must_use]
    pub fn encryption_key(&self) -> Option<&Sensitive> {
        self.encryption_key.as_ref().filter(|key| !key.is_blank())
    }

    /// Customer id, if configured and non-blank
    #[must_use]
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref().and_then(non_blank)
    }

    /// Initial date range, if configured and non-blank
    #[must_use]
    pub fn initial_date_range(&self) -> Option<&str> {
        self.initial_date_range.as_deref().and_then(non_blank)
    }

    /// Last successful download time for `host`
    #[must_use]
    pub fn last_execution_time(&self, host: &str) -> Option<i64> {
        self.last_execution_times.get(host).copied()
    }
}

/// The whole configuration store document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDocument {
    /// CLI installation
    pub cli: CliSettings,

    /// Known host connections
    pub host_connections: Vec<HostConnection>,

    /// Known login credentials
    pub credentials: Vec<Credentials>,

    /// ZAdviser settings and watermarks
    pub zadviser: ZAdviserSettings,
}
