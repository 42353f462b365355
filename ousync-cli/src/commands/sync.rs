//! `ousync sync` — write each object's OU path into the target attribute.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use ousync_directory::LdapDirectory;
use ousync_sync::{
    pipeline::{self, DomainScope, SyncOptions},
    report, Counts, RunSummary,
};

use crate::GlobalArgs;

/// Arguments for `ousync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Domain to process (DNS name, NetBIOS name or naming context).
    /// Repeat for several; omit to process the whole forest.
    #[arg(long = "domain", short = 'd', value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Export one row per object to this CSV file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Cut derived paths to the attribute's size limit.
    #[arg(long)]
    pub truncate: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a RunSummary,
    totals: Counts,
    exported: Option<usize>,
    /// Wall-clock time of the whole command, connect and export included.
    total_secs: f64,
    total_time: String,
}

impl<'a> JsonReport<'a> {
    fn new(summary: &'a RunSummary, exported: Option<usize>, elapsed: Duration) -> Self {
        Self {
            summary,
            totals: summary.totals(),
            exported,
            total_secs: elapsed.as_secs_f64(),
            total_time: report::format_elapsed(elapsed),
        }
    }
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let started = Instant::now();
        let mut config = super::load_config(global)?;
        if self.truncate {
            config.sync.truncate_paths = true;
        }

        let mut dir = LdapDirectory::new(config.directory.clone())
            .context("directory integration unavailable")?;
        dir.connect().context("directory integration unavailable")?;

        let scope = DomainScope::from_identifiers(self.domains);
        tracing::debug!(
            forest = %config.directory.forest,
            scope = ?scope,
            dry_run = self.dry_run,
            truncate = config.sync.truncate_paths,
            "starting sync"
        );
        let opts = SyncOptions::from_config(&config, self.dry_run, self.output.is_some());
        let summary = pipeline::run(&mut dir, &scope, &opts).context("sync failed")?;

        // A failed export is reported after the summary so the counts are never lost.
        let export = match &self.output {
            Some(path) => report::export_csv(path, summary.records())
                .map(Some)
                .with_context(|| format!("failed to export '{}'", path.display())),
            None => Ok(None),
        };

        if self.json {
            let exported = export.as_ref().ok().copied().flatten();
            let out = JsonReport::new(&summary, exported, started.elapsed());
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            print_summary(&summary);
            if let (Ok(Some(n)), Some(path)) = (&export, &self.output) {
                println!("✓ Exported {n} record(s) to {}", path.display());
            }
            println!("Total time: {}", report::format_elapsed(started.elapsed()));
        }

        export?;
        if !summary.is_complete() {
            bail!(
                "{} domain(s) could not be processed",
                summary.failed_domains.len()
            );
        }
        Ok(())
    }
}

fn print_summary(summary: &RunSummary) {
    let prefix = if summary.dry_run { "[dry-run] " } else { "" };

    for domain in &summary.domains {
        let line = report::domain_line(domain, summary.dry_run);
        if domain.counts.failed > 0 {
            println!("{prefix}{}", line.yellow());
        } else {
            println!("{prefix}{line}");
        }
    }
    for failure in &summary.failed_domains {
        println!(
            "{prefix}{} {}: {}",
            "✗".red().bold(),
            failure.domain,
            failure.reason
        );
    }

    if summary.domains.len() > 1 {
        let total = report::counts_phrase(&summary.totals(), summary.dry_run);
        println!("{prefix}{} {total}", "Total:".bold());
    }
    if summary.domains.is_empty() && summary.failed_domains.is_empty() {
        println!("No domains to process.");
    }
}
