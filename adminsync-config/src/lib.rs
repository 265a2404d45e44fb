use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Pre-compiled regex for database hostname validation (compiled once at first use)
static HOSTNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9\.]*[a-zA-Z0-9]$").unwrap());

/// Default allow-list applied when neither the config file nor the
/// environment supplies one.
pub const DEFAULT_ADMIN_LOGINS: &[&str] = &["admin", "administrator"];

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub database: Option<DatabaseSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub sync: Option<SyncSection>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSection {
    pub driver: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ssl_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SyncSection {
    #[serde(default)]
    pub admin_logins: Option<Vec<String>>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

/// Parse configuration from a string with optional format hint
#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try to parse config by attempting each enabled format
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s; // suppress unused warning
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseConfig {
    pub driver: String,
    pub path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncConfig {
    pub admin_logins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                driver: "sqlite".to_string(),
                path: Some("adminsync.sqlite".to_string()),
                host: None,
                port: None,
                database: None,
                username: None,
                password: None,
                ssl_mode: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            sync: SyncConfig {
                admin_logins: DEFAULT_ADMIN_LOGINS.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(()),
    }
}

#[inline]
fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .filter_map(|p| {
            let trimmed = p.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
}

/// Helper macro to apply option field directly if it has a value
macro_rules! apply_opt_field {
    ($target:expr, $source:expr) => {
        if $source.is_some() {
            $target = $source;
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    // Start with file values if provided
    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        if let Some(db) = raw.database {
            cfg.database.driver = db.driver;
            apply_opt_field!(cfg.database.path, db.path);
            apply_opt_field!(cfg.database.host, db.host);
            apply_opt_field!(cfg.database.port, db.port);
            apply_opt_field!(cfg.database.database, db.database);
            apply_opt_field!(cfg.database.username, db.username);
            apply_opt_field!(cfg.database.password, db.password);
            apply_opt_field!(cfg.database.ssl_mode, db.ssl_mode);
        }
        if let Some(logging) = raw.logging {
            apply_opt!(cfg.logging.level, logging.level);
            apply_opt!(cfg.logging.json, logging.json);
        }
        if let Some(sync) = raw.sync {
            apply_opt!(cfg.sync.admin_logins, sync.admin_logins);
        }
    }

    // Apply environment variable overrides (env takes precedence)
    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Helper to parse env var as bool
#[inline]
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

/// Helper to get env var as string
#[inline]
fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // Database
    if let Some(v) = env_str("ADMINSYNC_DATABASE_DRIVER") {
        cfg.database.driver = v;
    }
    if let Some(v) = env_str("ADMINSYNC_DATABASE_PATH") {
        cfg.database.path = Some(v);
    }
    if let Some(v) = env_str("ADMINSYNC_DATABASE_HOST") {
        cfg.database.host = Some(v);
    }
    if let Some(v) = env_parse::<u16>("ADMINSYNC_DATABASE_PORT")? {
        cfg.database.port = Some(v);
    }
    if let Some(v) = env_str("ADMINSYNC_DATABASE_NAME") {
        cfg.database.database = Some(v);
    }
    if let Some(v) = env_str("ADMINSYNC_DATABASE_USERNAME") {
        cfg.database.username = Some(v);
    }
    if let Some(v) = env_str("ADMINSYNC_DATABASE_PASSWORD") {
        cfg.database.password = Some(v);
    }
    if let Some(v) = env_str("ADMINSYNC_DATABASE_SSL_MODE") {
        cfg.database.ssl_mode = Some(v);
    }
    // Backwards-compatible alias: a full URL lands in `path`
    if let Some(v) = env_str("ADMINSYNC_DATABASE_URL") {
        cfg.database.path = Some(v);
    }

    // Logging
    if let Some(v) = env_str("ADMINSYNC_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("ADMINSYNC_LOG_JSON")? {
        cfg.logging.json = v;
    }

    // Sync
    if let Some(v) = env_str("ADMINSYNC_ADMIN_LOGINS") {
        cfg.sync.admin_logins = split_csv(&v);
    }

    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    // database driver supported
    match cfg.database.driver.as_str() {
        "sqlite" | "postgres" | "mysql" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "unsupported database driver: {}",
                other
            )))
        }
    }
    // non-sqlite must have host and database
    if cfg.database.driver != "sqlite" {
        let host = cfg.database.host.as_deref().unwrap_or("");
        if host.is_empty() {
            return Err(ConfigError::Validation(
                "database.host must be set for non-sqlite drivers".to_string(),
            ));
        }
        let host_ok = host.parse::<std::net::IpAddr>().is_ok() || HOSTNAME_REGEX.is_match(host);
        if !host_ok {
            return Err(ConfigError::Validation(format!(
                "invalid database.host: {}",
                host
            )));
        }
        if cfg
            .database
            .database
            .as_deref()
            .map(|s| s.is_empty())
            .unwrap_or(true)
        {
            return Err(ConfigError::Validation(
                "database.database must be set for non-sqlite drivers".to_string(),
            ));
        }
    }

    if cfg.sync.admin_logins.is_empty() {
        return Err(ConfigError::Validation(
            "sync.admin_logins must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Render the database section into a SQLx connection URL.
///
/// For sqlite the `path` is used verbatim when it already carries a scheme,
/// so `ADMINSYNC_DATABASE_URL` style values pass through untouched.
pub fn database_url(db: &DatabaseConfig) -> Result<String, ConfigError> {
    match db.driver.as_str() {
        "sqlite" => {
            let path = db.path.as_deref().unwrap_or("adminsync.sqlite");
            if path.contains("://") || path.starts_with("sqlite:") {
                Ok(path.to_string())
            } else {
                Ok(format!("sqlite://{}", path))
            }
        }
        "postgres" | "mysql" => {
            let host = db.host.as_deref().ok_or_else(|| {
                ConfigError::Validation("database.host must be set".to_string())
            })?;
            let name = db.database.as_deref().ok_or_else(|| {
                ConfigError::Validation("database.database must be set".to_string())
            })?;
            let mut url = format!("{}://", db.driver);
            match (db.username.as_deref(), db.password.as_deref()) {
                (Some(user), Some(pass)) => {
                    url.push_str(user);
                    url.push(':');
                    url.push_str(pass);
                    url.push('@');
                }
                (Some(user), None) => {
                    url.push_str(user);
                    url.push('@');
                }
                _ => {}
            }
            url.push_str(host);
            if let Some(port) = db.port {
                url.push_str(&format!(":{}", port));
            }
            url.push('/');
            url.push_str(name);
            if db.driver == "postgres" {
                if let Some(ssl) = db.ssl_mode.as_deref() {
                    url.push_str(&format!("?sslmode={}", ssl));
                }
            }
            Ok(url)
        }
        other => Err(ConfigError::Validation(format!(
            "unsupported database driver: {}",
            other
        ))),
    }
}
