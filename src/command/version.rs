//! ZAdviser CLI version detection and gating

use crate::step::StepError;
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Oldest CLI the download and upload steps work with
pub const ZADVISER_MINIMUM_CLI_VERSION: CliVersion = CliVersion::new(20, 2, 1);

/// Oldest CLI that accepts the `-protocol` flag
pub const PROTOCOL_MINIMUM_CLI_VERSION: CliVersion = CliVersion::new(20, 1, 1);

/// File in the CLI install directory that records the installed version
pub const VERSION_FILE: &str = "versions.xml";

static VERSION_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"version\s*=\s*"([0-9]+(?:\.[0-9]+)*)""#).expect("version pattern is valid")
});

static XML_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\?[^>]*\?>").expect("declaration pattern is valid"));

/// A CLI version such as `20.02.01`
///
/// Components are numeric; leading zeros are ignored and missing components
/// count as zero, so `20.02.01`, `20.2.1` and `20.2.1.0` compare equal.
#[derive(Debug, Clone)]
pub struct CliVersion(Version);

impl CliVersion {
    /// Creates a version from its components
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Major component
    #[must_use]
    pub fn major(&self) -> u64 {
        self.0.major
    }
}

impl FromStr for CliVersion {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let unrecognised = || StepError::VersionIncompatible {
            detected: text.to_string(),
            requirement: "unrecognised version format".to_string(),
        };

        if text.is_empty() {
            return Err(unrecognised());
        }

        let mut parts = [0_u64; 3];
        for (index, component) in text.split('.').enumerate() {
            let number = component.parse::<u64>().map_err(|_| unrecognised())?;
            if let Some(slot) = parts.get_mut(index) {
                *slot = number;
            }
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl PartialEq for CliVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CliVersion {}

impl PartialOrd for CliVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CliVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0.major, self.0.minor, self.0.patch).cmp(&(other.0.major, other.0.minor, other.0.patch))
    }
}

impl fmt::Display for CliVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0.major, self.0.minor, self.0.patch)
    }
}

/// Reads the installed CLI version from `<cli_dir>/versions.xml`
///
/// The first `version="…"` attribute outside the XML declaration is the CLI
/// version.
///
/// # Errors
///
/// Returns `StepError::VersionIncompatible` if the file is missing or holds
/// no recognisable version.
pub fn detect_cli_version(cli_dir: &Path, minimum: &CliVersion) -> Result<CliVersion, StepError> {
    let version_file = cli_dir.join(VERSION_FILE);
    let text = fs::read_to_string(&version_file).map_err(|e| StepError::VersionIncompatible {
        detected: "unknown".to_string(),
        requirement: format!(
            "cannot read {} ({e}); ZAdviser CLI {minimum} or later is required",
            version_file.display()
        ),
    })?;

    let body = XML_DECLARATION.replace_all(&text, "");
    let version = VERSION_ATTRIBUTE
        .captures(&body)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| StepError::VersionIncompatible {
            detected: "unknown".to_string(),
            requirement: format!("no version found in {}", version_file.display()),
        })?
        .as_str()
        .parse::<CliVersion>()?;

    tracing::debug!(version = %version, file = %version_file.display(), "Detected ZAdviser CLI version");
    Ok(version)
}

/// Version requirements applied while building a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliCompatibility {
    /// Oldest usable CLI
    pub minimum: CliVersion,
    /// Oldest CLI accepting `-protocol`
    pub protocol_minimum: CliVersion,
}

impl Default for CliCompatibility {
    fn default() -> Self {
        Self {
            minimum: ZADVISER_MINIMUM_CLI_VERSION,
            protocol_minimum: PROTOCOL_MINIMUM_CLI_VERSION,
        }
    }
}

impl CliCompatibility {
    /// Fails when `detected` is older than the minimum
    ///
    /// # Errors
    ///
    /// Returns `StepError::VersionIncompatible`.
    pub fn check_minimum(&self, detected: &CliVersion) -> Result<(), StepError> {
        if *detected < self.minimum {
            return Err(StepError::VersionIncompatible {
                detected: detected.to_string(),
                requirement: format!("version {} or later is required", self.minimum),
            });
        }
        Ok(())
    }

    /// Fails when `detected` cannot take the `-protocol` flag
    ///
    /// # Errors
    ///
    /// Returns `StepError::VersionIncompatible`.
    pub fn check_protocol(&self, detected: &CliVersion) -> Result<(), StepError> {
        if *detected < self.protocol_minimum {
            return Err(StepError::VersionIncompatible {
                detected: detected.to_string(),
                requirement: format!(
                    "a protocol was specified and requires version {} or later",
                    self.protocol_minimum
                ),
            });
        }
        Ok(())
    }
}
