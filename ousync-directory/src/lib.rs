//! # ousync-directory
//!
//! Access to the directory service behind the [`Directory`] trait.
//!
//! - [`LdapDirectory`] talks to Active Directory over LDAP (`ldap3`, blocking).
//! - [`MemoryDirectory`] keeps everything in process; the sync tests use it.
//!
//! [`ObjectQuery`] builds the mail-enabled user/group filter and the list of
//! attributes every backend must return; [`entry`] turns raw attribute maps
//! into [`ousync_core::DirectoryObject`]s.

pub mod directory;
pub mod entry;
pub mod error;
pub mod filter;
pub mod ldap;
pub mod memory;

pub use directory::Directory;
pub use error::DirectoryError;
pub use filter::ObjectQuery;
pub use ldap::LdapDirectory;
pub use memory::{MemoryDirectory, WriteCall};
