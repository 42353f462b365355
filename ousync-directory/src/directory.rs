//! The seam between reconciliation and the directory service.

use ousync_core::{DirectoryObject, Domain, DomainController};

use crate::error::DirectoryError;
use crate::filter::ObjectQuery;

/// Blocking access to a forest.
///
/// Every call is synchronous. Implementations may cache connections and the
/// partition list, which is why all methods take `&mut self`.
pub trait Directory {
    /// Every domain partition in the forest, sorted by DNS name.
    fn forest_domains(&mut self) -> Result<Vec<Domain>, DirectoryError>;

    /// Resolve a DNS name, NetBIOS name or naming context to its domain.
    fn resolve_domain(&mut self, identifier: &str) -> Result<Domain, DirectoryError> {
        self.forest_domains()?
            .into_iter()
            .find(|d| d.matches(identifier))
            .ok_or_else(|| DirectoryError::DomainNotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Pick the server that serves all reads and writes for `domain`.
    fn discover_server(&mut self, domain: &Domain) -> Result<DomainController, DirectoryError>;

    /// Objects of `domain` matching `query`, in server order.
    fn find_objects(
        &mut self,
        server: &DomainController,
        domain: &Domain,
        query: &ObjectQuery,
    ) -> Result<Vec<DirectoryObject>, DirectoryError>;

    /// Replace `attribute` on `dn` with the single value `value`.
    fn write_attribute(
        &mut self,
        server: &DomainController,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), DirectoryError>;
}
