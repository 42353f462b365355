//! Summary text and CSV export.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use ousync_core::ReconciliationRecord;

use crate::error::{export_err, io_err};
use crate::reconcile::{Counts, DomainReport};
use crate::SyncError;

/// One line per domain, phrased for live or dry-run mode.
///
/// ```text
/// emea.contoso.com: updated 2 and added 3 of 10 objects
/// [dry-run] emea.contoso.com: would update 2 and add 3 of 10 objects
/// ```
pub fn domain_line(report: &DomainReport, dry_run: bool) -> String {
    format!("{}: {}", report.domain, counts_phrase(&report.counts, dry_run))
}

/// `updated U and added A of N objects`, plus failures and skips when present.
pub fn counts_phrase(c: &Counts, dry_run: bool) -> String {
    let mut line = if dry_run {
        format!(
            "would update {} and add {} of {} objects",
            c.updates, c.adds, c.seen
        )
    } else {
        format!("updated {} and added {} of {} objects", c.updates, c.adds, c.seen)
    };
    if c.failed > 0 {
        line.push_str(&format!(", {} failed", c.failed));
    }
    if c.skipped > 0 {
        line.push_str(&format!(", {} skipped without canonical name", c.skipped));
    }
    line
}

/// `Hh Mm Ss`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Write records as CSV: header row first, fixed column order, no type metadata.
///
/// The header is written even when there are no records.
pub fn write_csv<'a, W, I>(writer: W, records: I) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a ReconciliationRecord>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(ReconciliationRecord::COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export records to `path`, replacing any existing file.
pub fn export_csv<'a, I>(path: &Path, records: I) -> Result<usize, SyncError>
where
    I: IntoIterator<Item = &'a ReconciliationRecord>,
{
    let records: Vec<&ReconciliationRecord> = records.into_iter().collect();
    let file = std::fs::File::create(path).map_err(|e| io_err(path, e))?;
    write_csv(file, records.iter().copied()).map_err(|e| export_err(path, e))?;
    tracing::info!(path = %path.display(), count = records.len(), "exported records");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use ousync_core::{Action, Domain, DomainController, Outcome};

    use super::*;

    fn report(counts: Counts) -> DomainReport {
        let domain = Domain {
            dns_name: "emea.contoso.com".to_string(),
            netbios_name: None,
            naming_context: "DC=emea,DC=contoso,DC=com".to_string(),
        };
        let server = DomainController {
            host: "dc01".to_string(),
            domain: domain.dns_name.clone(),
        };
        let mut r = DomainReport::new(domain, &server);
        r.counts = counts;
        r
    }

    fn record(action: Action, outcome: Outcome) -> ReconciliationRecord {
        ReconciliationRecord {
            display_name: "Jane, Doe".to_string(),
            action,
            outcome,
            new_value: "contoso.com/Sales/".to_string(),
            previous_value: String::new(),
            email: "jane@contoso.com".to_string(),
            object_class: "user".to_string(),
            when_changed: None,
            when_created: None,
            domain: "contoso.com".to_string(),
        }
    }

    #[test]
    fn live_and_dry_run_phrasing() {
        let r = report(Counts { seen: 10, adds: 3, updates: 2, ..Default::default() });
        assert_eq!(
            domain_line(&r, false),
            "emea.contoso.com: updated 2 and added 3 of 10 objects"
        );
        assert_eq!(
            domain_line(&r, true),
            "emea.contoso.com: would update 2 and add 3 of 10 objects"
        );
    }

    #[test]
    fn failures_and_skips_are_mentioned_only_when_present() {
        let c = Counts { seen: 4, adds: 1, failed: 1, skipped: 2, ..Default::default() };
        let line = counts_phrase(&c, false);
        assert!(line.ends_with(", 1 failed, 2 skipped without canonical name"), "got: {line}");
        assert!(!counts_phrase(&Counts::default(), false).contains("failed"));
    }

    #[test]
    fn elapsed_is_hours_minutes_seconds() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1h 2m 5s");
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "0h 0m 59s");
    }

    #[test]
    fn csv_header_is_written_without_records() {
        let mut buf = Vec::new();
        write_csv(&mut buf, std::iter::empty()).expect("csv");
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "DisplayName,Action,Updated,NewEntry,ExistingEntry,EmailAddress,ObjectClass,WhenChanged,WhenCreated,Domain\n"
        );
    }

    #[test]
    fn csv_rows_follow_header_order_and_quote_commas() {
        let rows = [
            record(Action::Add, Outcome::Successful),
            record(Action::Skipped, Outcome::Skipped),
        ];
        let mut buf = Vec::new();
        write_csv(&mut buf, rows.iter()).expect("csv");
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "\"Jane, Doe\",Add,Successful,contoso.com/Sales/,,jane@contoso.com,user,,,contoso.com"
        );
        assert!(lines[2].starts_with("\"Jane, Doe\",Missing CanonicalName,Skipped,"));
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let rows = [record(Action::Update, Outcome::WhatIf)];
        let n = export_csv(&path, rows.iter()).expect("export");
        assert_eq!(n, 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("DisplayName,"));
        assert!(text.contains(",Update,WhatIf,"));
    }

    #[test]
    fn export_to_missing_directory_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("report.csv");
        let err = export_csv(&path, std::iter::empty()).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
        assert!(err.to_string().contains("report.csv"));
    }
}
