//! Error types for ousync-directory.

use thiserror::Error;

/// All errors that can arise from directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// TCP/TLS connection to a server failed.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// Simple bind was refused or failed.
    #[error("LDAP bind as {bind_dn} failed: {source}")]
    Bind {
        bind_dn: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// The environment variable holding the bind password is unset.
    #[error("bind password not set; export {env}")]
    MissingPassword { env: String },

    /// Search request failed or returned a non-success result code.
    #[error("LDAP search under '{base}' failed: {source}")]
    Search {
        base: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// Modify request could not be sent.
    #[error("LDAP modify of '{dn}' failed: {source}")]
    Modify {
        dn: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// The server answered the modify with an error.
    #[error("modify of '{dn}' rejected: {reason}")]
    Rejected { dn: String, reason: String },

    /// No partition of the forest matches the identifier.
    #[error("domain '{identifier}' not found in forest")]
    DomainNotFound { identifier: String },

    /// No server could be located for the domain.
    #[error("no reachable directory server for domain '{domain}'")]
    NoServer { domain: String },

    /// A required rootDSE attribute is missing.
    #[error("rootDSE of {host} has no {attribute}")]
    RootDse { host: String, attribute: String },
}
