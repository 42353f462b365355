//! Sync pipeline entrypoint: domains → objects → reconcile.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, error, info};

use ousync_core::{Config, Domain};
use ousync_directory::{Directory, DirectoryError, ObjectQuery};

use crate::reconcile::{reconcile_object, DomainFailure, DomainReport, ReconcileOptions, RunSummary};
use crate::SyncError;

/// Which domains a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainScope {
    /// Every domain in the forest.
    Forest,
    /// Explicit identifiers (DNS name, NetBIOS name or naming context).
    Named(Vec<String>),
}

impl DomainScope {
    /// `Forest` for an empty list.
    pub fn from_identifiers(identifiers: Vec<String>) -> Self {
        if identifiers.is_empty() {
            Self::Forest
        } else {
            Self::Named(identifiers)
        }
    }
}

/// Everything a run needs besides the directory itself.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub query: ObjectQuery,
    pub reconcile: ReconcileOptions,
}

impl SyncOptions {
    pub fn from_config(config: &Config, dry_run: bool, record: bool) -> Self {
        Self {
            query: ObjectQuery::from_config(&config.sync),
            reconcile: ReconcileOptions {
                target_attribute: config.sync.target_attribute.clone(),
                dry_run,
                truncate_paths: config.sync.truncate_paths,
                record,
            },
        }
    }
}

/// Run a full reconciliation pass.
///
/// Forest enumeration failure aborts the run. A requested domain that cannot
/// be resolved, has no reachable server, or cannot be searched is recorded in
/// [`RunSummary::failed_domains`] and the run moves on to the next domain.
pub fn run<D: Directory + ?Sized>(
    dir: &mut D,
    scope: &DomainScope,
    opts: &SyncOptions,
) -> Result<RunSummary, SyncError> {
    let started = Instant::now();
    let mut summary = RunSummary {
        dry_run: opts.reconcile.dry_run,
        ..Default::default()
    };

    let domains = resolve_domains(dir, scope, &mut summary.failed_domains)?;
    let mut processed: HashSet<String> = HashSet::new();

    for domain in domains {
        let name = domain.dns_name.clone();
        match sync_domain(dir, domain, opts, &mut processed) {
            Ok(report) => summary.domains.push(report),
            Err(e) => {
                error!(domain = %name, error = %e, "skipping domain");
                summary.failed_domains.push(DomainFailure {
                    domain: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    summary.elapsed = started.elapsed();
    Ok(summary)
}

/// Turn the scope into a list of distinct domains.
///
/// Identifiers the forest does not know are pushed to `failures`; failing to
/// enumerate the forest at all is an error.
pub fn resolve_domains<D: Directory + ?Sized>(
    dir: &mut D,
    scope: &DomainScope,
    failures: &mut Vec<DomainFailure>,
) -> Result<Vec<Domain>, SyncError> {
    let identifiers = match scope {
        DomainScope::Forest => return Ok(dir.forest_domains()?),
        DomainScope::Named(ids) => ids,
    };

    let mut domains: Vec<Domain> = Vec::new();
    for id in identifiers {
        match dir.resolve_domain(id) {
            Ok(domain) if domains.contains(&domain) => {
                debug!(identifier = %id, domain = %domain, "domain listed twice");
            }
            Ok(domain) => domains.push(domain),
            Err(e @ DirectoryError::DomainNotFound { .. }) => {
                error!(identifier = %id, error = %e, "cannot resolve domain");
                failures.push(DomainFailure {
                    domain: id.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(domains)
}

/// Reconcile every object of one domain.
///
/// `processed` holds lower-cased DNs already handled in this run; an object
/// seen again is not touched a second time.
fn sync_domain<D: Directory + ?Sized>(
    dir: &mut D,
    domain: Domain,
    opts: &SyncOptions,
    processed: &mut HashSet<String>,
) -> Result<DomainReport, DirectoryError> {
    let server = dir.discover_server(&domain)?;
    info!(domain = %domain, server = %server, "processing domain");

    let objects = dir.find_objects(&server, &domain, &opts.query)?;
    let mut report = DomainReport::new(domain, &server);

    for object in &objects {
        if !processed.insert(object.distinguished_name.to_lowercase()) {
            debug!(dn = %object.distinguished_name, "already processed in this run");
            continue;
        }
        reconcile_object(dir, &server, object, &opts.reconcile, &mut report);
    }

    let c = report.counts;
    info!(
        domain = %report.domain,
        seen = c.seen,
        adds = c.adds,
        updates = c.updates,
        failed = c.failed,
        skipped = c.skipped,
        "domain complete"
    );
    Ok(report)
}
