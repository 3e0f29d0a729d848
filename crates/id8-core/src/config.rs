//! Configuration for the ID8 services.
//!
//! Configuration is resolved in three layers:
//!
//! 1. Built-in defaults ([`Id8Config::default`])
//! 2. A TOML file (explicit path, else `<config dir>/id8/config.toml`)
//! 3. `ID8_*` environment variables, e.g. `ID8_SERVER_PORT=8080` or
//!    `ID8_CATALOG_API_KEY=...`
//!
//! The [`ConfigManager`] trait is what the CLI's `config` subcommands are
//! written against.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "ID8";

/// Dotted keys that may be overridden from the environment.
pub const ENV_KEYS: &[&str] = &[
    "server.host",
    "server.port",
    "server.request_timeout_secs",
    "server.trust_proxy_headers",
    "rate_limit.max_requests",
    "rate_limit.window_secs",
    "rate_limit.max_entries",
    "catalog.backend",
    "catalog.url",
    "catalog.api_key",
    "catalog.request_timeout_secs",
    "catalog.connect_timeout_secs",
    "catalog.seed_path",
    "catalog.event_log_capacity",
    "stack.storage_path",
    "auth.enabled",
    "auth.admin_token",
    "logging.filter",
];

// ============================================================================
// ConfigManager
// ============================================================================

/// Loading, locating and exporting a project configuration.
pub trait ConfigManager: Serialize + DeserializeOwned + Default {
    /// Project name, used for the config directory and messages.
    fn project_name() -> &'static str;

    /// Default location of the config file for this platform.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(Self::project_name()).join("config.toml"))
    }

    /// Explicit path if given, otherwise the platform default.
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        match explicit {
            Some(p) => Some(PathBuf::from(p)),
            None => Self::default_config_path(),
        }
    }

    /// Load the configuration, applying environment overrides.
    fn load(explicit: Option<&str>) -> Result<Self>;

    /// Serialize the configuration as pretty TOML.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten the configuration into `PREFIX_SECTION_KEY=value` pairs.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>>;
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Upper bound on the time spent handling one request.
    pub request_timeout_secs: u64,
    /// Key rate limits on `X-Forwarded-For` / `X-Real-IP` instead of the
    /// socket peer. Enable only behind a proxy that overwrites them.
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 10,
            trust_proxy_headers: false,
        }
    }
}

/// Fixed-window limits applied to the tracking endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests allowed per client per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Maximum number of tracked clients before eviction kicks in.
    pub max_entries: usize,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
            max_entries: 10_000,
        }
    }
}

/// Catalog backend selection and managed-database credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Backend type: "memory" or "rest".
    pub backend: String,
    /// Base URL of the managed database's REST endpoint.
    pub url: Option<String>,
    /// Service key for the managed database.
    pub api_key: Option<String>,
    /// Per-request timeout for database calls.
    pub request_timeout_secs: u64,
    /// Connect timeout for database calls.
    pub connect_timeout_secs: u64,
    /// JSON file of items used to seed the memory backend.
    pub seed_path: Option<String>,
    /// Events kept per log by the memory backend.
    pub event_log_capacity: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            url: None,
            api_key: None,
            request_timeout_secs: 5,
            connect_timeout_secs: 3,
            seed_path: None,
            event_log_capacity: 1_000,
        }
    }
}

/// Client-side stack persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Where the stack file lives; defaults to the platform data dir.
    pub storage_path: Option<String>,
}

impl StackConfig {
    /// The configured path, or `<data dir>/id8/stack.json`.
    pub fn resolved_storage_path(&self) -> Option<PathBuf> {
        match &self.storage_path {
            Some(p) => Some(PathBuf::from(p)),
            None => dirs::data_dir().map(|d| d.join("id8").join("stack.json")),
        }
    }
}

/// Admin authentication.
///
/// Enabled by default: with no `admin_token` set, admin routes answer 503
/// until one is configured or auth is explicitly disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// When false, admin routes are open (local development).
    pub enabled: bool,
    /// Bearer token accepted on admin routes.
    pub admin_token: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_token: None,
        }
    }
}

/// Logging filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,id8=debug".to_string(),
        }
    }
}

// ============================================================================
// Id8Config
// ============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Id8Config {
    /// Project name reported by the health endpoint.
    pub project_name: String,
    /// HTTP listener.
    pub server: ServerConfig,
    /// Tracking rate limits.
    pub rate_limit: RateLimitSettings,
    /// Catalog backend.
    pub catalog: CatalogConfig,
    /// Stack persistence.
    pub stack: StackConfig,
    /// Admin authentication.
    pub auth: AuthSettings,
    /// Logging.
    pub logging: LoggingConfig,
}

impl Default for Id8Config {
    fn default() -> Self {
        Self {
            project_name: "id8".to_string(),
            server: ServerConfig::default(),
            rate_limit: RateLimitSettings::default(),
            catalog: CatalogConfig::default(),
            stack: StackConfig::default(),
            auth: AuthSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Id8Config {
    /// Parse a TOML document, filling omitted keys with defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid config: {e}")))
    }

    /// Apply `ID8_*` overrides using `lookup` to read variables.
    ///
    /// Values are coerced to the type of the key they replace; keys that are
    /// currently unset take the raw string.
    pub fn apply_env_overrides_with<F>(self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut root = toml::Value::try_from(&self).map_err(|e| Error::config(e.to_string()))?;
        let mut applied = 0usize;

        for key in ENV_KEYS {
            let var = env_var_name(key);
            let Some(raw) = lookup(&var) else {
                continue;
            };
            let value = match get_nested_value(&root, key) {
                Some(toml::Value::Integer(_)) => raw
                    .trim()
                    .parse::<i64>()
                    .map(toml::Value::Integer)
                    .map_err(|_| Error::config(format!("{var} must be an integer, got '{raw}'")))?,
                Some(toml::Value::Boolean(_)) => match raw.trim() {
                    "1" | "true" | "yes" => toml::Value::Boolean(true),
                    "0" | "false" | "no" => toml::Value::Boolean(false),
                    _ => {
                        return Err(Error::config(format!(
                            "{var} must be a boolean, got '{raw}'"
                        )));
                    }
                },
                _ => toml::Value::String(raw),
            };
            set_nested_value(&mut root, key, value)?;
            applied += 1;
        }

        if applied == 0 {
            return Ok(self);
        }
        log::debug!("Applied {applied} environment override(s)");
        root.try_into()
            .map_err(|e: toml::de::Error| Error::config(e.to_string()))
    }

    /// Whether the managed database has everything it needs to connect.
    pub fn catalog_credentials_present(&self) -> bool {
        self.catalog.url.as_deref().is_some_and(|u| !u.is_empty())
            && self.catalog.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl ConfigManager for Id8Config {
    fn project_name() -> &'static str {
        "id8"
    }

    fn load(explicit: Option<&str>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit);
        let config = match path {
            Some(path) if path.exists() => {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                log::debug!("Loading config from {}", path.display());
                Self::from_toml_str(&content)?
            }
            Some(path) if explicit.is_some() => {
                return Err(Error::config(format!(
                    "Config file does not exist at {}",
                    path.display()
                )));
            }
            _ => Self::default(),
        };
        config.apply_env_overrides_with(|name| std::env::var(name).ok())
    }

    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let root = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_env(&root, ENV_PREFIX, &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Environment variable name for a dotted key: `server.port` → `ID8_SERVER_PORT`.
pub fn env_var_name(key: &str) -> String {
    format!("{ENV_PREFIX}_{}", key.replace('.', "_").to_uppercase())
}

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    let mut current = value;
    for part in key.split('.') {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return Err(Error::config("Empty key path"));
    };

    let mut current = root;
    for part in parents {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?;
    table.insert(last.to_string(), value);
    Ok(())
}

fn flatten_env(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (k, v) in table {
                flatten_env(v, &format!("{prefix}_{}", k.to_uppercase()), out);
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Array(items) => {
            let joined = items
                .iter()
                .map(|v| match v {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",");
            out.push((prefix.to_string(), joined));
        }
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
