//! Ordered argument vectors for the ZAdviser CLI
//!
//! An [`ArgumentVector`] is the script path followed by `(flag, value)`
//! pairs in insertion order. Each value remembers whether it must be quoted
//! for the CLI script and whether it is sensitive. Sensitive values are
//! masked in [`ArgumentVector::masked_command_line`] and in `Debug` output.

use crate::infrastructure::{MASK, Sensitive};
use std::fmt;

/// Flag names understood by the ZAdviser CLI
pub mod flags {
    /// Host name
    pub const HOST: &str = "-host";
    /// Host port
    pub const PORT: &str = "-port";
    /// Login user id
    pub const USER_ID: &str = "-id";
    /// Login password
    pub const PASSWORD: &str = "-pass";
    /// Transport protocol
    pub const PROTOCOL: &str = "-protocol";
    /// Host code page
    pub const CODE_PAGE: &str = "-code";
    /// Connection timeout
    pub const TIMEOUT: &str = "-timeout";
    /// CLI workspace data directory
    pub const DATA: &str = "-data";
    /// Build step marker
    pub const BUILD_STEP: &str = "-buildStep";
    /// JCL file
    pub const JCL_FILE_PATH: &str = "-jclFilePath";
    /// Unencrypted output file
    pub const UNENCRYPTED_DATA_FILE: &str = "-unencryptedDataFile";
    /// Encrypted output file
    pub const ENCRYPTED_DATA_FILE: &str = "-encryptedDataFile";
    /// Last successful download time
    pub const LAST_DATE_RUN: &str = "-lastDateRun";
    /// Days of history for a first download
    pub const INITIAL_DATE_RANGE: &str = "-initialDateRange";
    /// Access key
    pub const ACCESS_KEY: &str = "-accessKey";
    /// Encryption key
    pub const ENCRYPTION_KEY: &str = "-encryptionKey";
    /// Customer id
    pub const CUSTOMER_ID: &str = "-customerId";
    /// File to upload
    pub const UPLOAD_DATA_FILE: &str = "-uploadDataFile";
    /// Root directory for data the CLI keeps between runs
    pub const PERSIST_DATA: &str = "-persistData";
}

/// Quotes a value for safe inclusion in the CLI script's command line
///
/// Embedded double quotes are doubled and the result is wrapped in double
/// quotes. Empty input stays empty.
#[must_use]
pub fn escape_for_script(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    format!("\"{}\"", input.replace('"', "\"\""))
}

/// A flag value with its rendering rules
#[derive(Clone, PartialEq, Eq)]
pub struct ArgValue {
    raw: String,
    quoted: bool,
    sensitive: bool,
}

impl ArgValue {
    /// A value passed as is
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            raw: value.into(),
            quoted: false,
            sensitive: false,
        }
    }

    /// A value passed through [`escape_for_script`]
    #[must_use]
    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            raw: value.into(),
            quoted: true,
            sensitive: false,
        }
    }

    /// A secret passed as is
    #[must_use]
    pub fn secret(value: &Sensitive) -> Self {
        Self {
            raw: value.expose().to_string(),
            quoted: false,
            sensitive: true,
        }
    }

    /// A secret passed through [`escape_for_script`]
    #[must_use]
    pub fn quoted_secret(value: &Sensitive) -> Self {
        Self {
            raw: value.expose().to_string(),
            quoted: true,
            sensitive: true,
        }
    }

    /// The unescaped value, secrets included
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True for secrets
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// True when the value is escaped before being passed on
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// The value as handed to the CLI
    #[must_use]
    pub fn rendered(&self) -> String {
        if self.quoted {
            escape_for_script(&self.raw)
        } else {
            self.raw.clone()
        }
    }

    /// The value as written to logs
    #[must_use]
    pub fn masked(&self) -> String {
        if self.sensitive {
            MASK.to_string()
        } else {
            self.rendered()
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgValue")
            .field("value", &self.masked())
            .field("quoted", &self.quoted)
            .field("sensitive", &self.sensitive)
            .finish()
    }
}

/// One `flag value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Flag name, see [`flags`]
    pub flag: &'static str,
    /// Flag value
    pub value: ArgValue,
}

/// Script path plus ordered, duplicate-free flags
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentVector {
    program: String,
    arguments: Vec<Argument>,
}

impl ArgumentVector {
    /// Starts a vector for the given script
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            arguments: Vec::new(),
        }
    }

    /// Appends a flag
    ///
    /// A flag that is already present keeps its position and takes the new
    /// value, so the vector never holds a flag twice.
    pub fn push(&mut self, flag: &'static str, value: ArgValue) -> &mut Self {
        debug_assert!(!self.contains(flag), "flag {flag} pushed twice");

        if let Some(existing) = self.arguments.iter_mut().find(|arg| arg.flag == flag) {
            tracing::warn!(flag, "Flag pushed twice, keeping the latest value");
            existing.value = value;
        } else {
            self.arguments.push(Argument { flag, value });
        }
        self
    }

    /// Appends a flag when `value` is non-blank
    pub fn push_non_blank(
        &mut self,
        flag: &'static str,
        value: Option<&str>,
        make: fn(String) -> ArgValue,
    ) -> &mut Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.push(flag, make(value.to_string()));
        }
        self
    }

    /// Script path
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Flags in order
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Flag names in order
    pub fn flags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.arguments.iter().map(|arg| arg.flag)
    }

    /// True when `flag` is present
    #[must_use]
    pub fn contains(&self, flag: &str) -> bool {
        self.arguments.iter().any(|arg| arg.flag == flag)
    }

    /// Value of `flag`
    #[must_use]
    pub fn value_of(&self, flag: &str) -> Option<&ArgValue> {
        self.arguments
            .iter()
            .find(|arg| arg.flag == flag)
            .map(|arg| &arg.value)
    }

    /// Number of flags
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// True when no flags were added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Arguments after the script path, as handed to the process
    #[must_use]
    pub fn to_command_args(&self) -> Vec<String> {
        self.arguments
            .iter()
            .flat_map(|arg| [arg.flag.to_string(), arg.value.rendered()])
            .collect()
    }

    /// The full command line with secrets masked, for logs
    #[must_use]
    pub fn masked_command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(
                self.arguments
                    .iter()
                    .flat_map(|arg| [arg.flag.to_string(), arg.value.masked()]),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }
}
