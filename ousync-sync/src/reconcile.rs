//! Per-object reconciliation and the counters it feeds.
//!
//! Counters and records live in a [`DomainReport`] that the pipeline owns and
//! passes down by `&mut`; finished reports are collected into a
//! [`RunSummary`].

use std::ops::AddAssign;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::{debug, error, info, warn};

use ousync_core::{
    Action, DirectoryObject, Domain, DomainController, Outcome, ReconciliationRecord,
    NOT_AVAILABLE,
};
use ousync_directory::Directory;

use crate::derive::derive_path;

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Object counts for one domain or the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Objects returned by the query.
    pub seen: usize,
    pub adds: usize,
    pub updates: usize,
    /// Writes attempted and refused.
    pub failed: usize,
    /// Objects without a canonical name.
    pub skipped: usize,
    /// Objects already holding the derived path.
    pub unchanged: usize,
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.seen += rhs.seen;
        self.adds += rhs.adds;
        self.updates += rhs.updates;
        self.failed += rhs.failed;
        self.skipped += rhs.skipped;
        self.unchanged += rhs.unchanged;
    }
}

/// Outcome of reconciling one domain.
#[derive(Debug, Clone, Serialize)]
pub struct DomainReport {
    pub domain: Domain,
    pub server: String,
    pub counts: Counts,
    /// Only filled when recording is enabled.
    #[serde(skip)]
    pub records: Vec<ReconciliationRecord>,
}

impl DomainReport {
    pub fn new(domain: Domain, server: &DomainController) -> Self {
        Self {
            domain,
            server: server.host.clone(),
            counts: Counts::default(),
            records: Vec::new(),
        }
    }
}

/// A domain that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainFailure {
    /// Identifier as requested, or the DNS name for enumerated domains.
    pub domain: String,
    pub reason: String,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub domains: Vec<DomainReport>,
    pub failed_domains: Vec<DomainFailure>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl RunSummary {
    /// Counts summed over every processed domain.
    pub fn totals(&self) -> Counts {
        let mut total = Counts::default();
        for report in &self.domains {
            total += report.counts;
        }
        total
    }

    /// Recorded rows of all domains, in processing order.
    pub fn records(&self) -> impl Iterator<Item = &ReconciliationRecord> {
        self.domains.iter().flat_map(|d| d.records.iter())
    }

    /// `true` when every targeted domain was processed.
    pub fn is_complete(&self) -> bool {
        self.failed_domains.is_empty()
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(d.as_secs_f64())
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Compare OU paths the way the directory compares strings: case-insensitively.
pub fn paths_equal(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Decide what to do given the stored value and the derived path.
pub fn classify(stored: Option<&str>, derived: &str) -> Action {
    match stored.filter(|s| !s.is_empty()) {
        None => Action::Add,
        Some(current) if paths_equal(current, derived) => Action::None,
        Some(_) => Action::Update,
    }
}

// ---------------------------------------------------------------------------
// reconcile_object
// ---------------------------------------------------------------------------

/// Knobs for a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    pub target_attribute: String,
    pub dry_run: bool,
    pub truncate_paths: bool,
    /// Keep a [`ReconciliationRecord`] for every object with an action.
    pub record: bool,
}

/// Reconcile a single object and update `report`.
///
/// Never fails: a missing canonical name is a skip and a refused write is a
/// `Failed` outcome; both are logged and counted.
pub fn reconcile_object<D: Directory + ?Sized>(
    dir: &mut D,
    server: &DomainController,
    object: &DirectoryObject,
    opts: &ReconcileOptions,
    report: &mut DomainReport,
) -> Action {
    report.counts.seen += 1;
    let dn = object.distinguished_name.as_str();

    let Some(derived) = derive_path(object, opts.truncate_paths) else {
        warn!(dn = %dn, "object has no canonical name; skipping");
        report.counts.skipped += 1;
        if opts.record {
            report.records.push(ReconciliationRecord::for_object(
                object,
                &report.domain,
                Action::Skipped,
                Outcome::Skipped,
                NOT_AVAILABLE,
                NOT_AVAILABLE,
            ));
        }
        return Action::Skipped;
    };

    let action = classify(object.stored_path.as_deref(), &derived);
    if !action.is_write() {
        debug!(dn = %dn, path = %derived, "already in sync");
        report.counts.unchanged += 1;
        return action;
    }

    let outcome = if opts.dry_run {
        info!(dn = %dn, action = %action, path = %derived, "[dry-run] would write");
        Outcome::WhatIf
    } else {
        match dir.write_attribute(server, dn, &opts.target_attribute, &derived) {
            Ok(()) => {
                info!(dn = %dn, action = %action, path = %derived, "wrote");
                Outcome::Successful
            }
            Err(e) => {
                error!(dn = %dn, action = %action, error = %e, "write failed");
                Outcome::Failed
            }
        }
    };

    match (outcome, action) {
        (Outcome::Failed, _) => report.counts.failed += 1,
        (_, Action::Add) => report.counts.adds += 1,
        (_, Action::Update) => report.counts.updates += 1,
        _ => {}
    }

    if opts.record {
        report.records.push(ReconciliationRecord::for_object(
            object,
            &report.domain,
            action,
            outcome,
            derived,
            object.stored_path.clone().unwrap_or_default(),
        ));
    }
    action
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
