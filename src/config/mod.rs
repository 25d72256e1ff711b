//! Configuration management
//!
//! This module handles loading and parsing configuration for Folio.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Content store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Read cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Admin editor configuration
    #[serde(default)]
    pub admin: AdminConfig,
    /// Site presentation configuration
    #[serde(default)]
    pub site: SiteConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin for the admin editor
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store driver (sqlite or rest)
    #[serde(default)]
    pub driver: StoreDriver,
    /// SQLite path or hosted backend base URL
    #[serde(default = "default_store_url")]
    pub url: String,
    /// API key for the hosted backend
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            driver: StoreDriver::default(),
            url: default_store_url(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_store_url() -> String {
    "data/folio.db".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Content store driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreDriver {
    /// Local SQLite document store (default)
    #[default]
    Sqlite,
    /// Hosted PostgREST-compatible backend
    Rest,
}

/// Read cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Staleness window for fetched lists, in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    60
}

fn default_max_capacity() -> u64 {
    1_000
}

/// Object storage driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// Local filesystem served under /uploads (default)
    #[default]
    Local,
    /// Hosted storage bucket
    Rest,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub driver: StorageDriver,
    /// Local upload directory
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// URL prefix returned for locally stored objects
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Bucket name for hosted storage
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Maximum file size in bytes (default: 5MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            path: default_storage_path(),
            public_base_url: default_public_base_url(),
            bucket: default_bucket(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_public_base_url() -> String {
    "/uploads".to_string()
}

fn default_bucket() -> String {
    "images".to_string()
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/svg+xml".to_string(),
    ]
}

/// Admin editor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Bearer token for admin routes; admin is disabled when unset
    #[serde(default)]
    pub token: Option<String>,
}

/// Site presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_title")]
    pub title: String,
    /// Directory with template overrides
    #[serde(default = "default_templates_path")]
    pub templates_path: PathBuf,
    /// Delay before the first item of a section animates in
    #[serde(default)]
    pub animation_base_delay_ms: u64,
    /// Extra delay per list position
    #[serde(default = "default_stagger")]
    pub animation_stagger_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            templates_path: default_templates_path(),
            animation_base_delay_ms: 0,
            animation_stagger_ms: default_stagger(),
        }
    }
}

fn default_site_title() -> String {
    "Portfolio".to_string()
}

fn default_templates_path() -> PathBuf {
    PathBuf::from("themes/default")
}

fn default_stagger() -> u64 {
    100
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides,
    /// then validate the result.
    ///
    /// Environment variables follow the pattern:
    /// - FOLIO_SERVER_HOST, FOLIO_SERVER_PORT, FOLIO_SERVER_CORS_ORIGIN
    /// - FOLIO_STORE_DRIVER, FOLIO_STORE_URL, FOLIO_STORE_API_KEY, FOLIO_STORE_TIMEOUT_SECONDS
    /// - FOLIO_CACHE_TTL_SECONDS
    /// - FOLIO_STORAGE_DRIVER, FOLIO_STORAGE_PATH, FOLIO_STORAGE_BUCKET
    /// - FOLIO_ADMIN_TOKEN
    /// - FOLIO_SITE_TITLE
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the services cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.driver == StoreDriver::Rest && self.store.api_key.is_none() {
            return Err(ConfigError::ValidationError(
                "store.api_key is required when store.driver is 'rest'".to_string(),
            ));
        }
        if self.storage.driver == StorageDriver::Rest && self.store.api_key.is_none() {
            return Err(ConfigError::ValidationError(
                "store.api_key is required when storage.driver is 'rest'".to_string(),
            ));
        }
        if self.store.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "store.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("FOLIO_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("FOLIO_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("FOLIO_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("FOLIO_STORE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.store.driver = StoreDriver::Sqlite,
                "rest" => self.store.driver = StoreDriver::Rest,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("FOLIO_STORE_URL") {
            self.store.url = url;
        }
        if let Ok(key) = std::env::var("FOLIO_STORE_API_KEY") {
            self.store.api_key = Some(key);
        }
        if let Ok(timeout) = std::env::var("FOLIO_STORE_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.store.timeout_seconds = timeout;
            }
        }

        if let Ok(ttl) = std::env::var("FOLIO_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(driver) = std::env::var("FOLIO_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "local" => self.storage.driver = StorageDriver::Local,
                "rest" => self.storage.driver = StorageDriver::Rest,
                _ => {}
            }
        }
        if let Ok(path) = std::env::var("FOLIO_STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Ok(bucket) = std::env::var("FOLIO_STORAGE_BUCKET") {
            self.storage.bucket = bucket;
        }

        if let Ok(token) = std::env::var("FOLIO_ADMIN_TOKEN") {
            if !token.is_empty() {
                self.admin.token = Some(token);
            }
        }

        if let Ok(title) = std::env::var("FOLIO_SITE_TITLE") {
            self.site.title = title;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "FOLIO_SERVER_HOST",
    "FOLIO_SERVER_PORT",
    "FOLIO_SERVER_CORS_ORIGIN",
    "FOLIO_STORE_DRIVER",
    "FOLIO_STORE_URL",
    "FOLIO_STORE_API_KEY",
    "FOLIO_STORE_TIMEOUT_SECONDS",
    "FOLIO_CACHE_TTL_SECONDS",
    "FOLIO_STORAGE_DRIVER",
    "FOLIO_STORAGE_PATH",
    "FOLIO_STORAGE_BUCKET",
    "FOLIO_ADMIN_TOKEN",
    "FOLIO_SITE_TITLE",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.driver, StoreDriver::Sqlite);
        assert_eq!(config.store.url, "data/folio.db");
        assert_eq!(config.store.timeout_seconds, 10);
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.storage.driver, StorageDriver::Local);
        assert_eq!(config.storage.public_base_url, "/uploads");
        assert!(config.admin.token.is_none());
        assert_eq!(config.site.animation_stagger_ms, 100);
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.site.title, "Portfolio");
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\nsite:\n  title: \"Jane Doe\"\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.site.title, "Jane Doe");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.site.animation_stagger_ms, 100);
        assert_eq!(config.store.driver, StoreDriver::Sqlite);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"
server:
  host: "127.0.0.1"
  port: 9000
store:
  driver: rest
  url: "https://example.supabase.co"
  api_key: "anon-key"
  timeout_seconds: 5
cache:
  ttl_seconds: 30
storage:
  driver: rest
  bucket: "portfolio"
admin:
  token: "s3cret"
site:
  title: "Ada"
  animation_stagger_ms: 50
"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.store.driver, StoreDriver::Rest);
        assert_eq!(config.store.url, "https://example.supabase.co");
        assert_eq!(config.store.api_key.as_deref(), Some("anon-key"));
        assert_eq!(config.store.timeout(), Duration::from_secs(5));
        assert_eq!(config.cache.ttl_seconds, 30);
        assert_eq!(config.storage.driver, StorageDriver::Rest);
        assert_eq!(config.storage.bucket, "portfolio");
        assert_eq!(config.admin.token.as_deref(), Some("s3cret"));
        assert_eq!(config.site.animation_stagger_ms, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_validate_rest_store_requires_api_key() {
        let mut config = Config::default();
        config.store.driver = StoreDriver::Rest;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_key"));

        config.store.api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout_rejected() {
        let mut config = Config::default();
        config.store.timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_env_override_server_and_store() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("FOLIO_SERVER_HOST", "192.168.1.1");
        std::env::set_var("FOLIO_SERVER_PORT", "4000");
        std::env::set_var("FOLIO_STORE_DRIVER", "rest");
        std::env::set_var("FOLIO_STORE_URL", "https://db.example.com");
        std::env::set_var("FOLIO_STORE_API_KEY", "k");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.store.driver, StoreDriver::Rest);
        assert_eq!(config.store.url, "https://db.example.com");
        assert_eq!(config.store.api_key.as_deref(), Some("k"));

        clear_env();
    }

    #[test]
    fn test_env_override_admin_and_storage() {
        let _guard = lock_env();
        clear_env();

        let file = NamedTempFile::new().unwrap();

        std::env::set_var("FOLIO_ADMIN_TOKEN", "token-123");
        std::env::set_var("FOLIO_STORAGE_PATH", "/srv/uploads");
        std::env::set_var("FOLIO_CACHE_TTL_SECONDS", "15");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.admin.token.as_deref(), Some("token-123"));
        assert_eq!(config.storage.path, PathBuf::from("/srv/uploads"));
        assert_eq!(config.cache.ttl_seconds, 15);

        clear_env();
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("FOLIO_SERVER_PORT", "not_a_number");
        std::env::set_var("FOLIO_STORE_DRIVER", "postgres");
        std::env::set_var("FOLIO_ADMIN_TOKEN", "");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.driver, StoreDriver::Sqlite);
        assert!(config.admin.token.is_none());

        clear_env();
    }
}
