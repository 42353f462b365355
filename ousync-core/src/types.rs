//! Domain types shared by the directory, sync and CLI crates.
//!
//! [`DirectoryObject`] is a read-only snapshot of an entry owned by the
//! directory service. [`ReconciliationRecord`] is the transient per-object
//! row that ends up in the CSV export.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Placeholder written to path columns when no path could be derived.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

/// A domain partition of the forest, resolved to its canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    /// DNS name, e.g. `emea.contoso.com`.
    pub dns_name: String,
    /// Pre-Windows-2000 name, when the partition advertises one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netbios_name: Option<String>,
    /// Base DN of the partition, e.g. `DC=emea,DC=contoso,DC=com`.
    pub naming_context: String,
}

impl Domain {
    /// Whether `identifier` names this domain by DNS name, NetBIOS name or DN.
    pub fn matches(&self, identifier: &str) -> bool {
        let id = identifier.trim();
        self.dns_name.eq_ignore_ascii_case(id)
            || self.naming_context.eq_ignore_ascii_case(id)
            || self
                .netbios_name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dns_name.fmt(f)
    }
}

/// The server chosen to serve every read and write for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainController {
    pub host: String,
    pub domain: String,
}

impl fmt::Display for DomainController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.host.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Directory objects
// ---------------------------------------------------------------------------

/// Snapshot of a mail-enabled user or group as returned by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryObject {
    pub distinguished_name: String,
    /// Constructed `canonicalName`, e.g. `contoso.com/Sales/Jane Doe`.
    pub canonical_name: Option<String>,
    /// RDN value (`name`), unescaped.
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    /// Most specific structural class (`user`, `group`, ...).
    pub object_class: Option<String>,
    pub when_created: Option<DateTime<Utc>>,
    pub when_changed: Option<DateTime<Utc>>,
    /// Current value of the custom attribute the OU path is stored in.
    pub stored_path: Option<String>,
}

impl DirectoryObject {
    /// Display name falling back to `name`, then the DN.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.distinguished_name)
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// What the reconciler decided to do with an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Custom attribute is empty; the derived path will be added.
    Add,
    /// Custom attribute holds a different path.
    Update,
    /// Already in sync.
    None,
    /// Object has no canonical name, so no path can be derived.
    #[serde(rename = "Missing CanonicalName")]
    Skipped,
}

impl Action {
    /// `true` for actions that lead to a write.
    pub fn is_write(self) -> bool {
        matches!(self, Action::Add | Action::Update)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Add => write!(f, "Add"),
            Action::Update => write!(f, "Update"),
            Action::None => write!(f, "None"),
            Action::Skipped => write!(f, "Missing CanonicalName"),
        }
    }
}

/// Result of acting on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Successful,
    Failed,
    /// Dry-run: the write would have happened.
    WhatIf,
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Successful => write!(f, "Successful"),
            Outcome::Failed => write!(f, "Failed"),
            Outcome::WhatIf => write!(f, "WhatIf"),
            Outcome::Skipped => write!(f, "Skipped"),
        }
    }
}

/// One exported row. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationRecord {
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    #[serde(rename = "Action")]
    pub action: Action,
    #[serde(rename = "Updated")]
    pub outcome: Outcome,
    #[serde(rename = "NewEntry")]
    pub new_value: String,
    #[serde(rename = "ExistingEntry")]
    pub previous_value: String,
    #[serde(rename = "EmailAddress")]
    pub email: String,
    #[serde(rename = "ObjectClass")]
    pub object_class: String,
    #[serde(rename = "WhenChanged", serialize_with = "serialize_timestamp")]
    pub when_changed: Option<DateTime<Utc>>,
    #[serde(rename = "WhenCreated", serialize_with = "serialize_timestamp")]
    pub when_created: Option<DateTime<Utc>>,
    #[serde(rename = "Domain")]
    pub domain: String,
}

impl ReconciliationRecord {
    /// CSV header, in serialization order.
    pub const COLUMNS: [&'static str; 10] = [
        "DisplayName",
        "Action",
        "Updated",
        "NewEntry",
        "ExistingEntry",
        "EmailAddress",
        "ObjectClass",
        "WhenChanged",
        "WhenCreated",
        "Domain",
    ];

    /// Build a record for `object` with the path columns filled in by the caller.
    pub fn for_object(
        object: &DirectoryObject,
        domain: &Domain,
        action: Action,
        outcome: Outcome,
        new_value: impl Into<String>,
        previous_value: impl Into<String>,
    ) -> Self {
        Self {
            display_name: object.label().to_owned(),
            action,
            outcome,
            new_value: new_value.into(),
            previous_value: previous_value.into(),
            email: object.mail.clone().unwrap_or_default(),
            object_class: object.object_class.clone().unwrap_or_default(),
            when_changed: object.when_changed,
            when_created: object.when_created,
            domain: domain.dns_name.clone(),
        }
    }
}

/// Render timestamps as `YYYY-MM-DD HH:MM:SS`; missing values become empty cells.
pub fn format_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn serialize_timestamp<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts.as_ref()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn domain() -> Domain {
        Domain {
            dns_name: "emea.contoso.com".to_string(),
            netbios_name: Some("EMEA".to_string()),
            naming_context: "DC=emea,DC=contoso,DC=com".to_string(),
        }
    }

    #[test]
    fn domain_matches_any_identifier_case_insensitively() {
        let d = domain();
        assert!(d.matches("EMEA.contoso.com"));
        assert!(d.matches("emea"));
        assert!(d.matches("dc=emea,dc=contoso,dc=com"));
        assert!(!d.matches("contoso.com"));
    }

    #[test]
    fn action_display_uses_export_labels() {
        assert_eq!(Action::Add.to_string(), "Add");
        assert_eq!(Action::Skipped.to_string(), "Missing CanonicalName");
        assert_eq!(Outcome::WhatIf.to_string(), "WhatIf");
    }

    #[test]
    fn only_add_and_update_write() {
        assert!(Action::Add.is_write());
        assert!(Action::Update.is_write());
        assert!(!Action::None.is_write());
        assert!(!Action::Skipped.is_write());
    }

    #[test]
    fn label_falls_back_to_name_then_dn() {
        let mut obj = DirectoryObject {
            distinguished_name: "CN=x,DC=contoso,DC=com".to_string(),
            ..Default::default()
        };
        assert_eq!(obj.label(), "CN=x,DC=contoso,DC=com");
        obj.name = Some("x".to_string());
        assert_eq!(obj.label(), "x");
        obj.display_name = Some("Mr X".to_string());
        assert_eq!(obj.label(), "Mr X");
    }

    #[test]
    fn record_copies_object_fields() {
        let obj = DirectoryObject {
            distinguished_name: "CN=Jane Doe,OU=Sales,DC=contoso,DC=com".to_string(),
            display_name: Some("Jane Doe".to_string()),
            mail: Some("jane@contoso.com".to_string()),
            object_class: Some("user".to_string()),
            ..Default::default()
        };
        let rec = ReconciliationRecord::for_object(
            &obj,
            &domain(),
            Action::Add,
            Outcome::WhatIf,
            "contoso.com/Sales/",
            "",
        );
        assert_eq!(rec.display_name, "Jane Doe");
        assert_eq!(rec.email, "jane@contoso.com");
        assert_eq!(rec.domain, "emea.contoso.com");
        assert_eq!(rec.new_value, "contoso.com/Sales/");
    }

    #[test]
    fn timestamp_format() {
        let t = Utc.with_ymd_and_hms(2024, 6, 20, 15, 30, 45).unwrap();
        assert_eq!(format_timestamp(Some(&t)), "2024-06-20 15:30:45");
        assert_eq!(format_timestamp(None), "");
    }
}
