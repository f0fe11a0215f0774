//! Infrastructure layer
//!
//! This module contains the configuration store, its persisted types, the
//! sensitive value wrapper and logging setup.

mod config;
mod logging;
mod secret;
mod settings;

pub use config::{CONFIG_ENV_VAR, ConfigurationStore, check_initial_date_range};
pub use logging::init_logging;
pub use secret::{MASK, Sensitive, deserialize_non_blank};
pub use settings::{
    CliSettings, Credentials, DEFAULT_CODE_PAGE, HostConnection, StoreDocument, ZAdviserSettings,
};
