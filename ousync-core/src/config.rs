//! YAML configuration file.
//!
//! # Storage layout
//!
//! ```text
//! ~/.ousync/
//!   config.yaml   (mode 0600, directory mode 0700)
//! ```
//!
//! # API pattern
//!
//! Every function touching the default location has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! A caller that already holds an explicit file path uses [`load_from`] /
//! [`save_to`] directly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Current on-disk format version.
pub const CONFIG_VERSION: u32 = 1;

/// Downstream attribute length limit used by opt-in truncation.
pub const MAX_PATH_LEN: usize = 448;

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub directory: DirectoryConfig,
    pub sync: SyncConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            directory: DirectoryConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

/// How to reach and authenticate against the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Host queried for the rootDSE and forest partitions.
    pub forest: String,
    pub port: u16,
    pub use_ssl: bool,
    pub use_starttls: bool,
    /// DN or UPN for simple bind.
    pub bind_dn: String,
    /// Name of the environment variable holding the bind password.
    pub password_env: String,
    pub connect_timeout_secs: u64,
    pub page_size: i32,
    /// Domain DNS name → server host. Skips discovery for listed domains.
    pub servers: BTreeMap<String, String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            forest: "contoso.com".to_string(),
            port: 389,
            use_ssl: false,
            use_starttls: false,
            bind_dn: "svc-ousync@contoso.com".to_string(),
            password_env: "OUSYNC_BIND_PASSWORD".to_string(),
            connect_timeout_secs: 10,
            page_size: 500,
            servers: BTreeMap::new(),
        }
    }
}

impl DirectoryConfig {
    /// `ldap://host:port` or `ldaps://host:port` for `host`.
    pub fn url_for(&self, host: &str) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{scheme}://{host}:{}", self.port)
    }

    /// Configured server override for a domain, matched case-insensitively.
    pub fn server_override(&self, dns_name: &str) -> Option<&str> {
        self.servers
            .iter()
            .find(|(domain, _)| domain.eq_ignore_ascii_case(dns_name))
            .map(|(_, host)| host.as_str())
    }
}

/// What to query and where to store the derived path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Custom attribute receiving the OU path.
    pub target_attribute: String,
    /// Attribute whose presence marks an object as mail-enabled.
    pub address_list_attribute: String,
    /// `cn` pattern of system mailboxes to leave alone.
    pub excluded_user_pattern: String,
    /// `msExchRecipientTypeDetails` of groups that are cloud-only write-backs.
    pub excluded_group_recipient_type: u64,
    /// Truncate derived paths to [`MAX_PATH_LEN`] characters.
    pub truncate_paths: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target_attribute: "extensionAttribute10".to_string(),
            address_list_attribute: "showInAddressBook".to_string(),
            excluded_user_pattern: "SystemMailbox*".to_string(),
            excluded_group_recipient_type: 8_796_093_022_208,
            truncate_paths: false,
        }
    }
}

impl Config {
    /// Reject values that would only fail later against the directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            })
        };
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid {
                message: format!(
                    "unsupported config version {} (expected {CONFIG_VERSION})",
                    self.version
                ),
            });
        }
        if self.directory.forest.trim().is_empty() {
            return invalid("directory.forest cannot be empty");
        }
        if self.directory.port == 0 {
            return invalid("directory.port must be greater than 0");
        }
        if self.directory.page_size <= 0 {
            return invalid("directory.page_size must be greater than 0");
        }
        if self.directory.use_ssl && self.directory.use_starttls {
            return invalid("directory.use_ssl and directory.use_starttls are mutually exclusive");
        }
        if self.sync.target_attribute.trim().is_empty() {
            return invalid("sync.target_attribute cannot be empty");
        }
        if self.sync.address_list_attribute.trim().is_empty() {
            return invalid("sync.address_list_attribute cannot be empty");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.ousync/config.yaml`. No I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".ousync").join("config.yaml")
}

/// Default config path under the user's home directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load and validate a config file.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `<home>/.ousync/config.yaml`.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 4. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save `config` to `path`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// The parent directory is created with mode `0700` if absent.
pub fn save_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            set_dir_permissions(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config.yaml".to_string());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Save to `<home>/.ousync/config.yaml`.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    save_to(&config_path_at(home), config)
}

// ---------------------------------------------------------------------------
// 5. Init
// ---------------------------------------------------------------------------

/// Write a default config to `path`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn init_to(path: &Path, force: bool) -> Result<Config, ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    let config = Config::default();
    save_to(path, &config)?;
    Ok(config)
}

/// `init_to` for `<home>/.ousync/config.yaml`.
pub fn init_at(home: &Path, force: bool) -> Result<Config, ConfigError> {
    init_to(&config_path_at(home), force)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_home() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    #[test]
    fn config_path_is_correct() {
        let home = make_home();
        assert!(config_path_at(home.path()).ends_with(".ousync/config.yaml"));
    }

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().expect("default must validate");
    }

    #[test]
    fn init_creates_file_with_perms() {
        let home = make_home();
        init_at(home.path(), false).expect("init");
        let path = config_path_at(home.path());
        assert!(path.exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
            let dir_mode = std::fs::metadata(path.parent().unwrap())
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(dir_mode, 0o700);
        }
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let home = make_home();
        init_at(home.path(), false).expect("first init");
        let err = init_at(home.path(), false).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
        init_at(home.path(), true).expect("forced init");
    }

    #[test]
    fn save_cleans_up_tmp() {
        let home = make_home();
        save_at(home.path(), &Config::default()).expect("save");
        let tmp = config_path_at(home.path()).with_file_name("config.yaml.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn load_missing_returns_not_found() {
        let home = make_home();
        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn server_override_is_case_insensitive() {
        let mut dir = DirectoryConfig::default();
        dir.servers
            .insert("EMEA.contoso.com".to_string(), "dc01.emea.contoso.com".to_string());
        assert_eq!(
            dir.server_override("emea.contoso.com"),
            Some("dc01.emea.contoso.com")
        );
        assert_eq!(dir.server_override("apac.contoso.com"), None);
    }

    #[test]
    fn url_for_respects_ssl() {
        let mut dir = DirectoryConfig::default();
        assert_eq!(dir.url_for("dc01"), "ldap://dc01:389");
        dir.use_ssl = true;
        dir.port = 636;
        assert_eq!(dir.url_for("dc01"), "ldaps://dc01:636");
    }

    #[test]
    fn ssl_and_starttls_are_exclusive() {
        let mut cfg = Config::default();
        cfg.directory.use_ssl = true;
        cfg.directory.use_starttls = true;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}
