//! ousync core library — domain types, configuration file, errors.
//!
//! - [`types`] — directory objects, reconciliation records, domains
//! - [`error`] — [`ConfigError`]
//! - [`config`] — load / save / init of `~/.ousync/config.yaml`

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, DirectoryConfig, SyncConfig};
pub use error::ConfigError;
pub use types::{
    Action, DirectoryObject, Domain, DomainController, Outcome, ReconciliationRecord,
    NOT_AVAILABLE,
};
