//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend client configuration (used by the session front end)
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Attempts per log-food POST (searches and lookups are not retried)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    1000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// Session behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Commit a food as soon as it is selected
    #[serde(default)]
    pub auto_commit_on_select: bool,

    /// Seconds between outbox retries; 0 disables the background task
    #[serde(default = "default_outbox_interval")]
    pub outbox_retry_interval_secs: u64,

    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

fn default_outbox_interval() -> u64 {
    30
}

fn default_notification_capacity() -> usize {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_commit_on_select: false,
            outbox_retry_interval_secs: default_outbox_interval(),
            notification_capacity: default_notification_capacity(),
        }
    }
}

/// Backend server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_spoonacular_url")]
    pub spoonacular_base_url: String,

    #[serde(default)]
    pub spoonacular_api_key: Option<String>,

    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_spoonacular_url() -> String {
    "https://api.spoonacular.com".to_string()
}

fn default_search_limit() -> u32 {
    10
}

fn default_upstream_timeout() -> u64 {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            spoonacular_base_url: default_spoonacular_url(),
            spoonacular_api_key: None,
            search_limit: default_search_limit(),
            upstream_timeout_ms: default_upstream_timeout(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("nutrilog").join("config.toml")),
            Some(PathBuf::from("/etc/nutrilog/config.toml")),
            Some(PathBuf::from("./nutrilog.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Client overrides
        if let Ok(url) = std::env::var("NUTRILOG_API_URL") {
            self.client.base_url = url;
        }
        if let Some(timeout) = env_parse("NUTRILOG_REQUEST_TIMEOUT_MS") {
            self.client.request_timeout_ms = timeout;
        }

        // Session overrides
        if let Ok(flag) = std::env::var("NUTRILOG_AUTO_COMMIT") {
            self.session.auto_commit_on_select = parse_flag(&flag);
        }
        if let Some(secs) = env_parse("NUTRILOG_OUTBOX_RETRY_SECS") {
            self.session.outbox_retry_interval_secs = secs;
        }

        // Server overrides
        if let Ok(host) = std::env::var("NUTRILOG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("PORT").or_else(|| env_parse("NUTRILOG_PORT")) {
            self.server.port = port;
        }
        if let Ok(key) = std::env::var("SPOONACULAR_API_KEY") {
            if !key.is_empty() {
                self.server.spoonacular_api_key = Some(key);
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("NUTRILOG_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("NUTRILOG_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value != "false" && value != "0" && !value.is_empty()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Nutrilog Configuration
#
# Environment variables override these settings:
# - NUTRILOG_API_URL
# - NUTRILOG_REQUEST_TIMEOUT_MS
# - NUTRILOG_AUTO_COMMIT
# - NUTRILOG_OUTBOX_RETRY_SECS
# - NUTRILOG_HOST
# - NUTRILOG_PORT (or PORT)
# - SPOONACULAR_API_KEY
# - NUTRILOG_LOG_LEVEL
# - NUTRILOG_LOG_FORMAT

[client]
# Backend the session talks to
base_url = "http://localhost:5000"

# Per-request timeout (ms)
request_timeout_ms = 5000

# Attempts per log-food request
max_retries = 3

# Base delay between log-food attempts (ms)
retry_backoff_ms = 1000

[session]
# Log a food as soon as it is selected
auto_commit_on_select = false

# Retry failed log writes every N seconds (0 = manual only)
outbox_retry_interval_secs = 30

# Buffered notifications per subscriber
notification_capacity = 64

[server]
host = "0.0.0.0"
port = 5000

# Allowed CORS origins (empty = any)
cors_origins = ["http://localhost:3000"]

# Spoonacular upstream
spoonacular_base_url = "https://api.spoonacular.com"
# spoonacular_api_key = ""

# Results per search
search_limit = 10

# Upstream request timeout (ms)
upstream_timeout_ms = 10000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
