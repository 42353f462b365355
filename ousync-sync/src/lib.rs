//! # ousync-sync
//!
//! OU path derivation, reconciliation and reporting.
//!
//! Call [`pipeline::run`] with a [`ousync_directory::Directory`] to reconcile
//! every targeted domain; it returns a [`RunSummary`] the caller prints and
//! exports with [`report`].

pub mod derive;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod report;

pub use error::SyncError;
pub use pipeline::{DomainScope, SyncOptions};
pub use reconcile::{Counts, DomainFailure, DomainReport, RunSummary};
