//! End-to-end reconciliation runs against the in-memory directory.

use ousync_core::{Action, DirectoryObject, Domain, Outcome};
use ousync_directory::MemoryDirectory;
use ousync_sync::{pipeline, report, DomainScope, SyncError, SyncOptions};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn domain(dns: &str, netbios: &str) -> Domain {
    Domain {
        dns_name: dns.to_string(),
        netbios_name: Some(netbios.to_string()),
        naming_context: format!("DC={}", dns.replace('.', ",DC=")),
    }
}

fn user(domain: &str, ou: &str, name: &str, stored: Option<&str>) -> DirectoryObject {
    DirectoryObject {
        distinguished_name: format!("CN={name},OU={ou},DC={}", domain.replace('.', ",DC=")),
        canonical_name: Some(format!("{domain}/{ou}/{}", name.replace('/', "\\/"))),
        name: Some(name.to_string()),
        display_name: Some(name.to_string()),
        mail: Some(format!("{}@{domain}", name.to_lowercase().replace(' ', "."))),
        object_class: Some("user".to_string()),
        stored_path: stored.map(str::to_owned),
        ..Default::default()
    }
}

/// contoso.com: one add, one update, one in sync, one without canonical name.
/// emea.contoso.com: one add.
fn forest() -> MemoryDirectory {
    let mut orphan = user("contoso.com", "Lost", "Orphan", None);
    orphan.canonical_name = None;
    MemoryDirectory::new()
        .with_domain(
            domain("contoso.com", "CONTOSO"),
            vec![
                user("contoso.com", "Sales", "Jane Doe", None),
                user("contoso.com", "Sales", "John Roe", Some("contoso.com/Marketing/")),
                user("contoso.com", "IT", "Ann Poe", Some("CONTOSO.COM/it/")),
                orphan,
            ],
        )
        .with_domain(
            domain("emea.contoso.com", "EMEA"),
            vec![user("emea.contoso.com", "Paris", "A/B Team", None)],
        )
}

fn options(dry_run: bool) -> SyncOptions {
    SyncOptions::from_config(&ousync_core::Config::default(), dry_run, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn forest_run_classifies_every_object() {
    let mut dir = forest();
    let summary = pipeline::run(&mut dir, &DomainScope::Forest, &options(false)).expect("run");

    assert!(summary.is_complete());
    assert_eq!(summary.domains.len(), 2);
    let t = summary.totals();
    assert_eq!((t.seen, t.adds, t.updates, t.unchanged, t.skipped), (5, 2, 1, 1, 1));

    let actions: Vec<Action> = summary.records().map(|r| r.action).collect();
    assert_eq!(
        actions,
        [Action::Add, Action::Update, Action::Skipped, Action::Add],
        "in-sync objects are not recorded"
    );

    let slash = dir
        .object("CN=A/B Team,OU=Paris,DC=emea,DC=contoso,DC=com")
        .and_then(|o| o.stored_path.clone());
    assert_eq!(slash.as_deref(), Some("emea.contoso.com/Paris/"));
}

#[test]
fn second_run_is_a_no_op() {
    let mut dir = forest();
    pipeline::run(&mut dir, &DomainScope::Forest, &options(false)).expect("first run");
    let writes_after_first = dir.writes().len();

    let summary = pipeline::run(&mut dir, &DomainScope::Forest, &options(false)).expect("second run");
    let t = summary.totals();
    assert_eq!((t.adds, t.updates), (0, 0));
    assert_eq!(dir.writes().len(), writes_after_first);
}

#[test]
fn dry_run_counts_like_a_live_run_without_writing() {
    let mut live_dir = forest();
    let live = pipeline::run(&mut live_dir, &DomainScope::Forest, &options(false)).expect("live");

    let mut dry_dir = forest();
    let dry = pipeline::run(&mut dry_dir, &DomainScope::Forest, &options(true)).expect("dry");

    assert_eq!(live.totals(), dry.totals());
    assert!(dry_dir.writes().is_empty());
    assert!(dry
        .records()
        .filter(|r| r.action.is_write())
        .all(|r| r.outcome == Outcome::WhatIf));
}

#[test]
fn failed_write_does_not_affect_later_objects() {
    let mut dir = forest().reject_writes_to("CN=Jane Doe,OU=Sales,DC=contoso,DC=com");
    let summary = pipeline::run(
        &mut dir,
        &DomainScope::Named(vec!["CONTOSO".to_string()]),
        &options(false),
    )
    .expect("run");

    let c = summary.domains[0].counts;
    assert_eq!((c.failed, c.adds, c.updates), (1, 0, 1));
    let john = dir
        .object("CN=John Roe,OU=Sales,DC=contoso,DC=com")
        .and_then(|o| o.stored_path.clone());
    assert_eq!(john.as_deref(), Some("contoso.com/Sales/"));
}

#[test]
fn unknown_and_unreachable_domains_are_skipped() {
    let mut dir = forest().unreachable("emea.contoso.com");
    let scope = DomainScope::Named(vec![
        "fabrikam.com".to_string(),
        "emea".to_string(),
        "contoso.com".to_string(),
    ]);
    let summary = pipeline::run(&mut dir, &scope, &options(false)).expect("run");

    assert!(!summary.is_complete());
    let failed: Vec<&str> = summary.failed_domains.iter().map(|f| f.domain.as_str()).collect();
    assert_eq!(failed, ["fabrikam.com", "emea.contoso.com"]);
    assert_eq!(summary.domains.len(), 1);
    assert_eq!(summary.domains[0].domain.dns_name, "contoso.com");
}

#[test]
fn forest_enumeration_failure_aborts_named_runs() {
    let mut dir = forest().forest_unavailable();
    let scope = DomainScope::Named(vec![
        "contoso.com".to_string(),
        "emea".to_string(),
        "fabrikam.com".to_string(),
    ]);

    let err = pipeline::run(&mut dir, &scope, &options(false)).unwrap_err();
    assert!(matches!(err, SyncError::Directory(_)), "got: {err}");
    assert!(err.to_string().contains("configurationNamingContext"));
    assert_eq!(dir.enumerations(), 1);
    assert!(dir.writes().is_empty());
}

#[test]
fn forest_enumeration_failure_aborts_forest_runs() {
    let mut dir = forest().forest_unavailable();
    let err = pipeline::run(&mut dir, &DomainScope::Forest, &options(false)).unwrap_err();
    assert!(matches!(err, SyncError::Directory(_)));
    assert!(dir.writes().is_empty());
}

#[test]
fn object_listed_in_two_domains_is_written_once() {
    let shared = user("contoso.com", "Sales", "Jane Doe", None);
    let mut dir = MemoryDirectory::new()
        .with_domain(domain("contoso.com", "CONTOSO"), vec![shared.clone()])
        .with_domain(domain("emea.contoso.com", "EMEA"), vec![shared]);

    let summary = pipeline::run(&mut dir, &DomainScope::Forest, &options(false)).expect("run");
    assert_eq!(dir.writes().len(), 1);
    assert_eq!(summary.totals().adds, 1);
}

#[test]
fn exported_csv_lists_recorded_objects() {
    let mut dir = forest();
    let summary = pipeline::run(&mut dir, &DomainScope::Forest, &options(true)).expect("run");

    let out = TempDir::new().unwrap();
    let path = out.path().join("ou-sync.csv");
    let n = report::export_csv(&path, summary.records()).expect("export");
    assert_eq!(n, 4);

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("DisplayName,Action,Updated,NewEntry,ExistingEntry,EmailAddress,ObjectClass,WhenChanged,WhenCreated,Domain")
    );
    assert!(text.contains("Jane Doe,Add,WhatIf,contoso.com/Sales/,,jane.doe@contoso.com,user,,,contoso.com"));
    assert!(text.contains("Orphan,Missing CanonicalName,Skipped,N/A,N/A,"));
}

#[test]
fn summary_serializes_counts_and_failures() {
    let mut dir = forest().unreachable("emea.contoso.com");
    let summary = pipeline::run(&mut dir, &DomainScope::Forest, &options(true)).expect("run");

    let value = serde_json::to_value(&summary).expect("json");
    assert_eq!(value["dry_run"], true);
    assert_eq!(value["domains"][0]["domain"]["dns_name"], "contoso.com");
    assert_eq!(value["domains"][0]["counts"]["seen"], 4);
    assert_eq!(value["failed_domains"][0]["domain"], "emea.contoso.com");
    assert!(value["elapsed_secs"].is_f64());
    assert!(value["domains"][0].get("records").is_none());
}
