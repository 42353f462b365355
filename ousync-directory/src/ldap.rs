//! Active Directory over LDAP.
//!
//! Uses the blocking `ldap3::LdapConn`. One bound connection is cached per
//! server host; a domain's reads and its writes share the same connection,
//! so a write lands on the server the object was read from.
//!
//! ## Discovery
//!
//! 1. rootDSE of the configured forest host → `configurationNamingContext`.
//! 2. `crossRef` entries under `CN=Partitions,<config NC>` → domains.
//! 3. Per domain: configured override, otherwise connect to the domain's DNS
//!    name and pin the `dnsHostName` its rootDSE reports.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{LdapConn, LdapConnSettings, Mod, Scope, SearchEntry};
use tracing::{debug, info};

use ousync_core::{DirectoryConfig, DirectoryObject, Domain, DomainController};

use crate::directory::Directory;
use crate::entry::{domain_from_crossref, first, object_from_attrs};
use crate::error::DirectoryError;
use crate::filter::{ObjectQuery, CROSSREF_ATTRIBUTES, DOMAIN_CROSSREF_FILTER, ROOT_DSE_ATTRIBUTES};

/// [`Directory`] backed by one or more LDAP servers.
pub struct LdapDirectory {
    config: DirectoryConfig,
    password: String,
    /// Bound connections keyed by lower-cased host.
    connections: HashMap<String, LdapConn>,
    /// Partition list, read once per run.
    domains: Option<Vec<Domain>>,
    /// Pinned server per lower-cased domain DNS name.
    discovered: HashMap<String, String>,
}

impl LdapDirectory {
    /// Create a directory client. No connection is opened yet.
    ///
    /// Reads the bind password from the environment variable named by
    /// `config.password_env`.
    pub fn new(config: DirectoryConfig) -> Result<Self, DirectoryError> {
        let password = std::env::var(&config.password_env)
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DirectoryError::MissingPassword {
                env: config.password_env.clone(),
            })?;
        Ok(Self::with_password(config, password))
    }

    /// Create a directory client with an explicit bind password.
    pub fn with_password(config: DirectoryConfig, password: impl Into<String>) -> Self {
        Self {
            config,
            password: password.into(),
            connections: HashMap::new(),
            domains: None,
            discovered: HashMap::new(),
        }
    }

    /// Open and bind a connection to the forest host.
    ///
    /// Fails fast when the directory is unreachable or the credentials are
    /// wrong, before any domain is processed.
    pub fn connect(&mut self) -> Result<(), DirectoryError> {
        let forest = self.config.forest.clone();
        self.connection(&forest).map(|_| ())
    }

    /// Cached connection for `host`, opening and binding one if needed.
    fn connection(&mut self, host: &str) -> Result<&mut LdapConn, DirectoryError> {
        match self.connections.entry(host.to_ascii_lowercase()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(v) => {
                let conn = open(&self.config, &self.password, host)?;
                Ok(v.insert(conn))
            }
        }
    }
}

/// Open a connection to `host` and perform a simple bind.
fn open(config: &DirectoryConfig, password: &str, host: &str) -> Result<LdapConn, DirectoryError> {
    let url = config.url_for(host);
    debug!(url = %url, "connecting to LDAP server");

    let settings = LdapConnSettings::new()
        .set_conn_timeout(Duration::from_secs(config.connect_timeout_secs))
        .set_starttls(config.use_starttls);
    let mut conn = LdapConn::with_settings(settings, &url)
        .map_err(|source| DirectoryError::Connect { url: url.clone(), source })?;

    debug!(bind_dn = %config.bind_dn, "performing LDAP bind");
    conn.simple_bind(&config.bind_dn, password)
        .and_then(|res| res.success())
        .map_err(|source| DirectoryError::Bind {
            bind_dn: config.bind_dn.clone(),
            source,
        })?;
    Ok(conn)
}

/// Read the rootDSE of the server behind `conn`.
fn read_root_dse(conn: &mut LdapConn, host: &str) -> Result<SearchEntry, DirectoryError> {
    let search_err = |source: ldap3::LdapError| DirectoryError::Search {
        base: format!("rootDSE of {host}"),
        source,
    };
    let (entries, _) = conn
        .search("", Scope::Base, "(objectClass=*)", ROOT_DSE_ATTRIBUTES.to_vec())
        .and_then(|res| res.success())
        .map_err(search_err)?;
    entries
        .into_iter()
        .next()
        .map(SearchEntry::construct)
        .ok_or_else(|| DirectoryError::RootDse {
            host: host.to_string(),
            attribute: "entry".to_string(),
        })
}

fn root_attr(root: &SearchEntry, host: &str, attribute: &str) -> Result<String, DirectoryError> {
    first(&root.attrs, attribute)
        .map(str::to_owned)
        .ok_or_else(|| DirectoryError::RootDse {
            host: host.to_string(),
            attribute: attribute.to_string(),
        })
}

impl Directory for LdapDirectory {
    fn forest_domains(&mut self) -> Result<Vec<Domain>, DirectoryError> {
        if let Some(domains) = &self.domains {
            return Ok(domains.clone());
        }

        let forest = self.config.forest.clone();
        let conn = self.connection(&forest)?;
        let root = read_root_dse(conn, &forest)?;
        let partitions = format!(
            "CN=Partitions,{}",
            root_attr(&root, &forest, "configurationNamingContext")?
        );

        let (entries, _) = conn
            .search(
                &partitions,
                Scope::OneLevel,
                DOMAIN_CROSSREF_FILTER,
                CROSSREF_ATTRIBUTES.to_vec(),
            )
            .and_then(|res| res.success())
            .map_err(|source| DirectoryError::Search {
                base: partitions.clone(),
                source,
            })?;

        let mut domains: Vec<Domain> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .filter_map(|e| domain_from_crossref(&e.attrs))
            .collect();
        domains.sort_by(|a, b| a.dns_name.cmp(&b.dns_name));
        info!(count = domains.len(), forest = %forest, "enumerated forest domains");

        self.domains = Some(domains.clone());
        Ok(domains)
    }

    fn discover_server(&mut self, domain: &Domain) -> Result<DomainController, DirectoryError> {
        if let Some(host) = self.config.server_override(&domain.dns_name) {
            debug!(domain = %domain, server = %host, "using configured server");
            return Ok(DomainController {
                host: host.to_string(),
                domain: domain.dns_name.clone(),
            });
        }

        let key = domain.dns_name.to_ascii_lowercase();
        if let Some(host) = self.discovered.get(&key) {
            return Ok(DomainController {
                host: host.clone(),
                domain: domain.dns_name.clone(),
            });
        }

        // The domain name may resolve to any DC; pin the one that answered.
        let mut conn = open(&self.config, &self.password, &domain.dns_name)?;
        let root = read_root_dse(&mut conn, &domain.dns_name)?;
        let host = root_attr(&root, &domain.dns_name, "dnsHostName")?;
        match self.connections.entry(host.to_ascii_lowercase()) {
            Entry::Occupied(_) => debug!(server = %host, "reusing cached connection"),
            Entry::Vacant(v) => {
                v.insert(conn);
            }
        }
        self.discovered.insert(key, host.clone());

        debug!(domain = %domain, server = %host, "discovered server");
        Ok(DomainController {
            host,
            domain: domain.dns_name.clone(),
        })
    }

    fn find_objects(
        &mut self,
        server: &DomainController,
        domain: &Domain,
        query: &ObjectQuery,
    ) -> Result<Vec<DirectoryObject>, DirectoryError> {
        let page_size = self.config.page_size;
        let base = domain.naming_context.as_str();
        let filter = query.ldap_filter();
        debug!(base = %base, filter = %filter, server = %server, "searching");

        let search_err = |source: ldap3::LdapError| DirectoryError::Search {
            base: base.to_string(),
            source,
        };
        let conn = self.connection(&server.host)?;
        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(page_size)),
        ];
        let mut stream = conn
            .streaming_search_with(adapters, base, Scope::Subtree, &filter, query.attributes())
            .map_err(search_err)?;

        let mut objects = Vec::new();
        while let Some(entry) = stream.next().map_err(search_err)? {
            let entry = SearchEntry::construct(entry);
            objects.push(object_from_attrs(&entry.dn, &entry.attrs, &query.target_attribute));
        }
        stream.result().success().map_err(search_err)?;

        info!(domain = %domain, count = objects.len(), "retrieved objects");
        Ok(objects)
    }

    fn write_attribute(
        &mut self,
        server: &DomainController,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), DirectoryError> {
        let conn = self.connection(&server.host)?;
        let mods = vec![Mod::Replace(
            attribute.to_string(),
            HashSet::from([value.to_string()]),
        )];
        let result = conn
            .modify(dn, mods)
            .map_err(|source| DirectoryError::Modify {
                dn: dn.to_string(),
                source,
            })?;
        if result.rc != 0 {
            return Err(DirectoryError::Rejected {
                dn: dn.to_string(),
                reason: format!("code {}: {}", result.rc, result.text),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("forest", &self.config.forest)
            .field("bind_dn", &self.config.bind_dn)
            .field("connections", &self.connections.keys().collect::<Vec<_>>())
            .finish()
    }
}
