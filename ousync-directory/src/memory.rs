//! In-process [`Directory`].
//!
//! Holds a fixed forest, a list of objects per domain and a single custom
//! attribute per object (`DirectoryObject::stored_path`). Query filtering is
//! the server's job, so `find_objects` returns every object registered for the
//! domain. Failures can be injected for the forest, per domain and per DN.

use std::collections::{BTreeMap, HashSet};

use ousync_core::{DirectoryObject, Domain, DomainController};

use crate::directory::Directory;
use crate::error::DirectoryError;
use crate::filter::ObjectQuery;

/// A write that reached the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub server: String,
    pub dn: String,
    pub attribute: String,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    domains: Vec<Domain>,
    /// Objects keyed by lower-cased domain DNS name.
    objects: BTreeMap<String, Vec<DirectoryObject>>,
    unreachable: HashSet<String>,
    rejected: HashSet<String>,
    forest_unavailable: bool,
    enumerations: usize,
    writes: Vec<WriteCall>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a domain partition with its objects.
    pub fn with_domain(mut self, domain: Domain, objects: Vec<DirectoryObject>) -> Self {
        self.objects.insert(domain.dns_name.to_ascii_lowercase(), objects);
        self.domains.push(domain);
        self.domains.sort_by(|a, b| a.dns_name.cmp(&b.dns_name));
        self
    }

    /// Make server discovery fail for `dns_name`.
    pub fn unreachable(mut self, dns_name: &str) -> Self {
        self.unreachable.insert(dns_name.to_ascii_lowercase());
        self
    }

    /// Make forest enumeration fail.
    pub fn forest_unavailable(mut self) -> Self {
        self.forest_unavailable = true;
        self
    }

    /// Make every write to `dn` fail.
    pub fn reject_writes_to(mut self, dn: &str) -> Self {
        self.rejected.insert(dn.to_string());
        self
    }

    /// Writes in the order they were applied.
    pub fn writes(&self) -> &[WriteCall] {
        &self.writes
    }

    /// Number of forest enumerations attempted.
    pub fn enumerations(&self) -> usize {
        self.enumerations
    }

    /// Current state of the object with distinguished name `dn`.
    pub fn object(&self, dn: &str) -> Option<&DirectoryObject> {
        self.objects
            .values()
            .flatten()
            .find(|o| o.distinguished_name == dn)
    }
}

impl Directory for MemoryDirectory {
    fn forest_domains(&mut self) -> Result<Vec<Domain>, DirectoryError> {
        self.enumerations += 1;
        if self.forest_unavailable {
            return Err(DirectoryError::RootDse {
                host: "forest".to_string(),
                attribute: "configurationNamingContext".to_string(),
            });
        }
        Ok(self.domains.clone())
    }

    fn discover_server(&mut self, domain: &Domain) -> Result<DomainController, DirectoryError> {
        let key = domain.dns_name.to_ascii_lowercase();
        if self.unreachable.contains(&key) {
            return Err(DirectoryError::NoServer {
                domain: domain.dns_name.clone(),
            });
        }
        Ok(DomainController {
            host: format!("dc01.{key}"),
            domain: domain.dns_name.clone(),
        })
    }

    fn find_objects(
        &mut self,
        _server: &DomainController,
        domain: &Domain,
        _query: &ObjectQuery,
    ) -> Result<Vec<DirectoryObject>, DirectoryError> {
        Ok(self
            .objects
            .get(&domain.dns_name.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    fn write_attribute(
        &mut self,
        server: &DomainController,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), DirectoryError> {
        if self.rejected.contains(dn) {
            return Err(DirectoryError::Rejected {
                dn: dn.to_string(),
                reason: "insufficient access rights".to_string(),
            });
        }
        let object = self
            .objects
            .values_mut()
            .flatten()
            .find(|o| o.distinguished_name == dn)
            .ok_or_else(|| DirectoryError::Rejected {
                dn: dn.to_string(),
                reason: "no such object".to_string(),
            })?;
        object.stored_path = Some(value.to_string());
        self.writes.push(WriteCall {
            server: server.host.clone(),
            dn: dn.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}
