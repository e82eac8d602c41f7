//! Configuration resolution.
//!
//! # Storage layout
//!
//! ```text
//! ~/.campaign-sync/
//!   config.yaml     (mode 0600, written by `init`)
//!   logs/
//!     sync.log      (execution log, appended by every run)
//! ```
//!
//! # Precedence
//!
//! Environment variable → config file → built-in default. Credentials and the
//! table id have no default; the file may be absent entirely when the
//! environment provides them.
//!
//! # API pattern
//!
//! As with every filesystem-touching function in this workspace:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_SOURCE_API_KEY: &str = "BREVO_API_KEY";
pub const ENV_SOURCE_API_URL: &str = "BREVO_API_URL";
pub const ENV_STORE_API_KEY: &str = "NOCODB_API_KEY";
pub const ENV_STORE_API_URL: &str = "NOCODB_API_URL";
pub const ENV_STORE_TABLE_ID: &str = "NOCODB_TABLE_ID";

pub const DEFAULT_SOURCE_API_URL: &str = "https://api.brevo.com/v3";
pub const DEFAULT_CAMPAIGN_URL_BASE: &str = "https://app.brevo.com/campaigns";
pub const DEFAULT_STORE_API_URL: &str = "https://app.nocodb.com/api/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_WRITE_DELAY_MS: u64 = 200;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Largest `limit` the campaign source accepts per page.
pub const MAX_PAGE_SIZE: u32 = 100;

const CONFIG_TEMPLATE: &str = "\
# campaign-sync configuration.
# Environment variables take precedence over the values below:
#   BREVO_API_KEY, BREVO_API_URL, NOCODB_API_KEY, NOCODB_API_URL, NOCODB_TABLE_ID

brevo:
  api_url: https://api.brevo.com/v3
  api_key: \"\"
  campaign_url_base: https://app.brevo.com/campaigns

nocodb:
  api_url: https://app.nocodb.com/api/v2
  api_key: \"\"
  table_id: \"\"

sync:
  timeout_secs: 10
  write_delay_ms: 200
  page_size: 100  # 1 to 100, the most the campaign source accepts

log:
  file: ~/.campaign-sync/logs/sync.log
";

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved, immutable run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub sync: SyncSettings,
    pub log: LogSettings,
}

/// Connection settings for the campaign source.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub api_url: String,
    pub api_key: String,
    /// Base of the per-campaign link stored in each record.
    pub campaign_url_base: String,
}

/// Connection settings for the record store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub api_url: String,
    pub api_key: String,
    pub table_id: String,
}

impl StoreConfig {
    /// `<api_url>/tables/<table_id>/records`
    pub fn records_url(&self) -> String {
        format!(
            "{}/tables/{}/records",
            self.api_url.trim_end_matches('/'),
            self.table_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Per-request timeout applied to every HTTP call.
    pub timeout: Duration,
    /// Pause between consecutive record writes.
    pub write_delay: Duration,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub file: PathBuf,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("campaign_url_base", &self.campaign_url_base)
            .finish()
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("table_id", &self.table_id)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

/// Raw `config.yaml` document. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub brevo: SourceSection,
    pub nocodb: StoreSection,
    pub sync: SyncSection,
    pub log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub campaign_url_base: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub table_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub timeout_secs: Option<u64>,
    pub write_delay_ms: Option<u64>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.campaign-sync/`. Pure, no I/O.
pub fn config_dir_at(home: &Path) -> PathBuf {
    home.join(".campaign-sync")
}

/// `<home>/.campaign-sync/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("config.yaml")
}

/// `<home>/.campaign-sync/logs/sync.log`. Pure, no I/O.
pub fn default_log_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("logs").join("sync.log")
}

// ---------------------------------------------------------------------------
// 2. Load + resolve
// ---------------------------------------------------------------------------

/// Read `path` if it exists. A missing file yields an empty [`ConfigFile`].
///
/// Returns `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Resolve the run configuration.
///
/// `config_path` overrides the default `<home>/.campaign-sync/config.yaml`.
/// `env` looks up environment variables; pass `|k| std::env::var(k).ok()` in
/// production and a closure over a map in tests.
pub fn resolve_at<F>(home: &Path, config_path: Option<&Path>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_path_at(home));
    let file = load_file(&path)?;
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let source = SourceConfig {
        api_url: env(ENV_SOURCE_API_URL)
            .or(non_empty(file.brevo.api_url))
            .unwrap_or_else(|| DEFAULT_SOURCE_API_URL.to_string()),
        api_key: env(ENV_SOURCE_API_KEY)
            .or(non_empty(file.brevo.api_key))
            .ok_or(ConfigError::Missing {
                field: "brevo.api_key",
                env: ENV_SOURCE_API_KEY,
            })?,
        campaign_url_base: non_empty(file.brevo.campaign_url_base)
            .unwrap_or_else(|| DEFAULT_CAMPAIGN_URL_BASE.to_string()),
    };

    let store = StoreConfig {
        api_url: env(ENV_STORE_API_URL)
            .or(non_empty(file.nocodb.api_url))
            .unwrap_or_else(|| DEFAULT_STORE_API_URL.to_string()),
        api_key: env(ENV_STORE_API_KEY)
            .or(non_empty(file.nocodb.api_key))
            .ok_or(ConfigError::Missing {
                field: "nocodb.api_key",
                env: ENV_STORE_API_KEY,
            })?,
        table_id: env(ENV_STORE_TABLE_ID)
            .or(non_empty(file.nocodb.table_id))
            .ok_or(ConfigError::Missing {
                field: "nocodb.table_id",
                env: ENV_STORE_TABLE_ID,
            })?,
    };

    let timeout_secs = file.sync.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            field: "sync.timeout_secs",
            reason: "must be greater than zero".to_string(),
        });
    }
    let page_size = file.sync.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Invalid {
            field: "sync.page_size",
            reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
        });
    }

    let sync = SyncSettings {
        timeout: Duration::from_secs(timeout_secs),
        write_delay: Duration::from_millis(file.sync.write_delay_ms.unwrap_or(DEFAULT_WRITE_DELAY_MS)),
        page_size,
    };

    let log = LogSettings {
        file: file
            .log
            .file
            .map(|p| expand_home(home, &p))
            .unwrap_or_else(|| default_log_path_at(home)),
    };

    Ok(Config {
        source,
        store,
        sync,
        log,
    })
}

/// `resolve_at` convenience wrapper reading the process environment.
pub fn resolve(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    resolve_at(&home()?, config_path, |key| std::env::var(key).ok())
}

// ---------------------------------------------------------------------------
// 3. Init
// ---------------------------------------------------------------------------

/// Write the commented template to `path` (default `<home>/.campaign-sync/config.yaml`).
///
/// Write flow: template → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// Returns `ConfigError::AlreadyExists` rather than overwriting.
pub fn init_at(home: &Path, config_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_path_at(home));
    if path.exists() {
        return Err(ConfigError::AlreadyExists { path });
    }

    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            set_dir_permissions(dir)?;
        }
    }

    let tmp_path = path.with_extension("yaml.tmp");
    std::fs::write(&tmp_path, CONFIG_TEMPLATE)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(path)
}

/// `init_at` convenience wrapper.
pub fn init(config_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    init_at(&home()?, config_path)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~/` against `home`.
fn expand_home(home: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
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
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn make_home() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (ENV_SOURCE_API_KEY, "brevo-key".to_string()),
            (ENV_STORE_API_KEY, "nocodb-key".to_string()),
            (ENV_STORE_TABLE_ID, "m123".to_string()),
        ])
    }

    #[test]
    fn config_path_is_correct() {
        let home = make_home();
        assert!(config_path_at(home.path()).ends_with(".campaign-sync/config.yaml"));
    }

    #[test]
    fn env_alone_is_enough() {
        let home = make_home();
        let env = full_env();
        let config = resolve_at(home.path(), None, |k| env.get(k).cloned()).expect("resolve");
        assert_eq!(config.source.api_key, "brevo-key");
        assert_eq!(config.source.api_url, DEFAULT_SOURCE_API_URL);
        assert_eq!(config.store.table_id, "m123");
        assert_eq!(config.sync.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.log.file, default_log_path_at(home.path()));
    }

    #[test]
    fn missing_source_key_is_reported_with_env_name() {
        let home = make_home();
        let mut env = full_env();
        env.remove(ENV_SOURCE_API_KEY);
        let err = resolve_at(home.path(), None, |k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "brevo.api_key", .. }));
        assert!(err.to_string().contains(ENV_SOURCE_API_KEY));
    }

    #[test]
    fn blank_env_value_counts_as_missing() {
        let home = make_home();
        let mut env = full_env();
        env.insert(ENV_STORE_TABLE_ID, "  ".to_string());
        let err = resolve_at(home.path(), None, |k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "nocodb.table_id", .. }));
    }

    #[test]
    fn records_url_joins_table_id() {
        let store = StoreConfig {
            api_url: "https://db.example.com/api/v2/".to_string(),
            api_key: "k".to_string(),
            table_id: "m1".to_string(),
        };
        assert_eq!(
            store.records_url(),
            "https://db.example.com/api/v2/tables/m1/records"
        );
    }

    #[test]
    fn debug_output_redacts_keys() {
        let home = make_home();
        let env = full_env();
        let config = resolve_at(home.path(), None, |k| env.get(k).cloned()).expect("resolve");
        let debug = format!("{config:?}");
        assert!(!debug.contains("brevo-key"));
        assert!(!debug.contains("nocodb-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn tilde_log_path_expands_against_home() {
        let home = make_home();
        let expanded = expand_home(home.path(), Path::new("~/logs/run.log"));
        assert_eq!(expanded, home.path().join("logs/run.log"));
        let absolute = expand_home(home.path(), Path::new("/var/log/run.log"));
        assert_eq!(absolute, PathBuf::from("/var/log/run.log"));
    }

    #[test]
    fn init_writes_template_with_perms() {
        let home = make_home();
        let path = init_at(home.path(), None).expect("init");
        assert!(path.exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
        let parsed = load_file(&path).expect("template parses");
        assert_eq!(parsed.sync.page_size, Some(DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}
