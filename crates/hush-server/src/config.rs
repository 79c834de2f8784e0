//! Configuration file management.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration load failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HushConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Defaults applied to new surveys and publish requests.
    #[serde(default)]
    pub anonymity: AnonymityConfig,
    /// Batch-secret protection.
    #[serde(default)]
    pub secrets: SecretsConfig,
    /// Admin route protection.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Prefix for shareable survey links. Empty = relative links.
    #[serde(default)]
    pub public_base_url: String,
    /// Per-request deadline.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Where the database and key file live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Empty selects the per-user default.
    #[serde(default)]
    pub data_dir: String,
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

/// Anonymity defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymityConfig {
    #[serde(default = "default_threshold")]
    pub default_threshold: u32,
    #[serde(default = "default_jitter_minutes")]
    pub default_jitter_minutes: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_publish: u32,
    #[serde(default = "default_token_count")]
    pub default_token_count: u32,
}

/// Secret protection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// 64 hex chars. Empty = generate and persist `$data_dir/master.key`.
    #[serde(default)]
    pub master_key_hex: String,
}

/// Admin authentication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Required in `X-Api-Key` on admin routes. Empty = admin routes open.
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for the `hush` tracing target. `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_database_file() -> String {
    "hush.db".to_string()
}

fn default_threshold() -> u32 {
    hush_types::DEFAULT_ANONYMITY_THRESHOLD
}

fn default_jitter_minutes() -> u32 {
    hush_types::DEFAULT_JITTER_MINUTES
}

fn default_max_tokens() -> u32 {
    10_000
}

fn default_token_count() -> u32 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_base_url: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            database_file: default_database_file(),
        }
    }
}

impl Default for AnonymityConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            default_jitter_minutes: default_jitter_minutes(),
            max_tokens_per_publish: default_max_tokens(),
            default_token_count: default_token_count(),
        }
    }
}

impl LoggingConfig {
    /// Filter directives for the service's own spans and the HTTP
    /// request spans emitted by `tower_http::trace`.
    pub fn directives(&self) -> [String; 2] {
        [
            format!("hush={}", self.level),
            format!("tower_http={}", self.level),
        ]
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl HushConfig {
    /// Read the config file (if any), then apply `HUSH_*` overrides and
    /// validate. A missing file means all defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file();
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. Missing sections and fields take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if let Ok(bind) = std::env::var("HUSH_BIND") {
            self.server.bind = bind;
        }
        if let Ok(key) = std::env::var("HUSH_API_KEY") {
            self.auth.api_key = key;
        }
        if let Ok(dir) = std::env::var("HUSH_DATA_DIR") {
            self.storage.data_dir = dir;
        }
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.anonymity.default_threshold == 0 {
            return Err(ConfigError::Invalid(
                "anonymity.default_threshold must be at least 1".into(),
            ));
        }
        if self.anonymity.max_tokens_per_publish == 0 {
            return Err(ConfigError::Invalid(
                "anonymity.max_tokens_per_publish must be at least 1".into(),
            ));
        }
        if self.anonymity.default_token_count == 0
            || self.anonymity.default_token_count > self.anonymity.max_tokens_per_publish
        {
            return Err(ConfigError::Invalid(
                "anonymity.default_token_count must be between 1 and max_tokens_per_publish".into(),
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address '{}'", self.server.bind)))
    }

    /// `storage.data_dir` if set, else the per-user default.
    pub fn data_dir(&self) -> PathBuf {
        match self.storage.data_dir.as_str() {
            "" => platform_data_dir(),
            dir => PathBuf::from(dir),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.database_file)
    }

    pub fn master_key_path(&self) -> PathBuf {
        self.data_dir().join("master.key")
    }
}

/// `$HUSH_CONFIG`, else `config.toml` in the default data directory.
fn config_file() -> PathBuf {
    std::env::var_os("HUSH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| platform_data_dir().join("config.toml"))
}

/// `$HUSH_DATA_DIR`, else a dot directory under `$HOME`.
fn platform_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("HUSH_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let leaf = if cfg!(target_os = "macos") {
        "Library/Application Support/Hush"
    } else {
        ".hush"
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(leaf),
        None => std::env::temp_dir().join("hush"),
    }
}
