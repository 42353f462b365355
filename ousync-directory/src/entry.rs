//! Raw attribute maps → domain types.
//!
//! Attribute names are matched case-insensitively; servers echo names in
//! schema case, which does not always match the case they were requested in.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};

use ousync_core::{DirectoryObject, Domain};

/// Attribute values keyed by attribute name, as returned by a search.
pub type AttrMap = HashMap<String, Vec<String>>;

/// All values of `name`, or an empty slice.
pub fn values<'a>(attrs: &'a AttrMap, name: &str) -> &'a [String] {
    attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_slice())
        .unwrap_or(&[])
}

/// First non-empty value of `name`.
pub fn first<'a>(attrs: &'a AttrMap, name: &str) -> Option<&'a str> {
    values(attrs, name)
        .iter()
        .map(String::as_str)
        .find(|v| !v.is_empty())
}

/// Parse an LDAP GeneralizedTime such as `20240620153045.0Z`.
pub fn parse_generalized_time(value: &str) -> Option<DateTime<Utc>> {
    let digits = value.get(..14)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Build a [`DirectoryObject`] from a search entry.
///
/// `objectClass` is multi-valued from `top` down; the last value is the most
/// specific class.
pub fn object_from_attrs(dn: &str, attrs: &AttrMap, target_attribute: &str) -> DirectoryObject {
    let distinguished_name = first(attrs, "distinguishedName").unwrap_or(dn).to_string();
    DirectoryObject {
        distinguished_name,
        canonical_name: first(attrs, "canonicalName").map(str::to_owned),
        name: first(attrs, "name").map(str::to_owned),
        display_name: first(attrs, "displayName").map(str::to_owned),
        mail: first(attrs, "mail").map(str::to_owned),
        object_class: values(attrs, "objectClass").last().cloned(),
        when_created: first(attrs, "whenCreated").and_then(parse_generalized_time),
        when_changed: first(attrs, "whenChanged").and_then(parse_generalized_time),
        stored_path: first(attrs, target_attribute).map(str::to_owned),
    }
}

/// Build a [`Domain`] from a `crossRef` entry; `None` without `dnsRoot`/`nCName`.
pub fn domain_from_crossref(attrs: &AttrMap) -> Option<Domain> {
    Some(Domain {
        dns_name: first(attrs, "dnsRoot")?.to_ascii_lowercase(),
        netbios_name: first(attrs, "nETBIOSName").map(str::to_owned),
        naming_context: first(attrs, "nCName")?.to_string(),
    })
}
