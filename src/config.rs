//! Configuration for the LFS S3 gateway

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default `tracing` filter when neither config nor `RUST_LOG` set one.
pub const DEFAULT_LOG_LEVEL: &str = "lfs_s3_gateway=info,tower_http=info";

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to listen on in `serve` mode
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// S3 client configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Log level filter string. Overridden by RUST_LOG.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// S3 client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// S3 endpoint URL (for MinIO, LocalStack, or custom S3-compatible services)
    /// If not specified, uses AWS default endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Use path-style URLs (required for MinIO, LocalStack).
    /// Presigned URLs inherit this style.
    #[serde(default)]
    pub force_path_style: bool,

    /// AWS access key ID (falls back to AWS_ACCESS_KEY_ID)
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// AWS secret access key (falls back to AWS_SECRET_ACCESS_KEY)
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials (falls back to AWS_SESSION_TOKEN)
    #[serde(default)]
    pub session_token: Option<String>,
}

// Default value functions for serde
fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9000))
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            backend: BackendConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl BackendConfig {
    /// Fill unset credentials from the standard AWS variables.
    ///
    /// The Lambda runtime injects the execution role's credentials this way.
    /// Values already present in the config win.
    pub fn fill_credentials_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.access_key_id.is_none() {
            self.access_key_id = lookup("AWS_ACCESS_KEY_ID");
        }
        if self.secret_access_key.is_none() {
            self.secret_access_key = lookup("AWS_SECRET_ACCESS_KEY");
        }
        if self.session_token.is_none() {
            self.session_token = lookup("AWS_SESSION_TOKEN");
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("LFSGW_LISTEN_ADDR") {
            if let Ok(parsed) = addr.parse() {
                config.listen_addr = parsed;
            }
        }

        config.backend.endpoint = lookup("LFSGW_S3_ENDPOINT");
        if let Some(region) = lookup("LFSGW_S3_REGION").or_else(|| lookup("AWS_REGION")) {
            config.backend.region = region;
        }
        if let Some(path_style) = lookup("LFSGW_S3_PATH_STYLE") {
            config.backend.force_path_style = path_style == "true" || path_style == "1";
        }
        config.backend.access_key_id = lookup("LFSGW_AWS_ACCESS_KEY_ID");
        config.backend.secret_access_key = lookup("LFSGW_AWS_SECRET_ACCESS_KEY");

        if let Some(level) = lookup("LFSGW_LOG_LEVEL") {
            config.log_level = level;
        }

        config.backend.fill_credentials_from(lookup);
        config
    }

    /// Load configuration from file if it exists, otherwise from environment
    pub fn load() -> Self {
        let mut config = Self::load_file().unwrap_or_else(Self::from_env);
        config
            .backend
            .fill_credentials_from(|key| std::env::var(key).ok());
        config
    }

    fn load_file() -> Option<Self> {
        if let Ok(path) = std::env::var("LFSGW_CONFIG") {
            if let Ok(config) = Self::from_file(&path) {
                return Some(config);
            }
        }

        for path in &["lfs_s3_gateway.toml", "/etc/lfs_s3_gateway/config.toml"] {
            if std::path::Path::new(path).exists() {
                if let Ok(config) = Self::from_file(path) {
                    return Some(config);
                }
            }
        }

        None
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
