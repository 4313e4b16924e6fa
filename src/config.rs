//! Layered configuration: built-in defaults, then content_ledger.toml (or an
//! explicit path), then CONTENT_LEDGER_* environment variables.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ContentError, ContentResult};

pub const DEFAULT_CONFIG_FILE: &str = "content_ledger.toml";
pub const ENV_PREFIX: &str = "CONTENT_LEDGER_";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// Location of the store document
    pub data_path: PathBuf,
    /// Shared secret for content signatures. Required; there is no built-in key.
    pub signing_secret: String,
    /// Identity recorded on trust-chain links and history entries
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin; any origin when unset
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

fn default_authority() -> String {
    "system".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Serialize)]
struct LedgerConfigDefaults {
    data_path: PathBuf,
    authority: String,
    server: ServerConfig,
    log_level: String,
}

impl LedgerConfig {
    /// Configuration for a given data path and secret, everything else default
    pub fn new(data_path: impl Into<PathBuf>, signing_secret: impl Into<String>) -> Self {
        Self {
            data_path: data_path.into(),
            signing_secret: signing_secret.into(),
            authority: default_authority(),
            server: ServerConfig::default(),
            log_level: default_log_level(),
        }
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

        Figment::from(Serialized::defaults(LedgerConfigDefaults {
            data_path: PathBuf::from("data/content.json"),
            authority: default_authority(),
            server: ServerConfig::default(),
            log_level: default_log_level(),
        }))
        .merge(Toml::file(file))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> ContentResult<()> {
        if self.signing_secret.trim().is_empty() {
            return Err(ContentError::config("signing_secret must be set"));
        }
        if self.authority.trim().is_empty() {
            return Err(ContentError::config("authority must not be empty"));
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(ContentError::config("data_path must not be empty"));
        }
        Ok(())
    }
}

pub fn load_config(path: Option<&Path>) -> ContentResult<LedgerConfig> {
    let config: LedgerConfig = LedgerConfig::figment(path)
        .extract()
        .map_err(|e| ContentError::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
