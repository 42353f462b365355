//! LDAP filter construction.

use ousync_core::SyncConfig;

/// `crossRef` entries under `CN=Partitions` that describe domain partitions
/// (`systemFlags` bit `FLAG_CR_NTDS_DOMAIN`).
pub const DOMAIN_CROSSREF_FILTER: &str =
    "(&(objectClass=crossRef)(systemFlags:1.2.840.113556.1.4.803:=2))";

/// Attributes read from domain `crossRef` entries.
pub const CROSSREF_ATTRIBUTES: [&str; 3] = ["dnsRoot", "nETBIOSName", "nCName"];

/// Attributes read from the rootDSE.
pub const ROOT_DSE_ATTRIBUTES: [&str; 3] = [
    "dnsHostName",
    "defaultNamingContext",
    "configurationNamingContext",
];

/// Selects mail-enabled users and groups and the attributes read from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectQuery {
    pub address_list_attribute: String,
    /// `cn` pattern; `*` is kept as a wildcard, everything else is escaped.
    pub excluded_user_pattern: String,
    pub excluded_group_recipient_type: u64,
    pub target_attribute: String,
}

impl ObjectQuery {
    pub fn from_config(cfg: &SyncConfig) -> Self {
        Self {
            address_list_attribute: cfg.address_list_attribute.clone(),
            excluded_user_pattern: cfg.excluded_user_pattern.clone(),
            excluded_group_recipient_type: cfg.excluded_group_recipient_type,
            target_attribute: cfg.target_attribute.clone(),
        }
    }

    /// Mail-enabled AND (person user not matching the excluded pattern OR
    /// group that is not a cloud-only write-back).
    pub fn ldap_filter(&self) -> String {
        let user = if self.excluded_user_pattern.is_empty() {
            "(&(objectCategory=person)(objectClass=user))".to_string()
        } else {
            format!(
                "(&(objectCategory=person)(objectClass=user)(!(cn={})))",
                escape_filter_pattern(&self.excluded_user_pattern)
            )
        };
        let group = format!(
            "(&(objectCategory=group)(!(msExchRecipientTypeDetails={})))",
            self.excluded_group_recipient_type
        );
        format!(
            "(&({}=*)(|{user}{group}))",
            self.address_list_attribute
        )
    }

    /// Attributes every backend must populate on returned objects.
    pub fn attributes(&self) -> Vec<&str> {
        vec![
            "distinguishedName",
            "canonicalName",
            "name",
            "displayName",
            "mail",
            "objectClass",
            "whenCreated",
            "whenChanged",
            self.target_attribute.as_str(),
        ]
    }
}

impl Default for ObjectQuery {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

/// Escape special characters in LDAP filter values (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Like [`escape_filter_value`] but leaves `*` wildcards intact.
pub fn escape_filter_pattern(pattern: &str) -> String {
    pattern
        .split('*')
        .map(escape_filter_value)
        .collect::<Vec<_>>()
        .join("*")
}
