//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Which onboarding store backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Single JSON document (the default).
    Json,
    /// libSQL database file.
    LibSql,
    /// In-process only; lost on restart.
    Memory,
}

impl StoreBackend {
    /// File name used under the data directory when no path is configured.
    fn default_file(&self) -> Option<&'static str> {
        match self {
            Self::Json => Some("onboarding.json"),
            Self::LibSql => Some("onboarding.db"),
            Self::Memory => None,
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "libsql" | "sqlite" => Ok(Self::LibSql),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store '{other}' (expected json, libsql or memory)")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    pub port: u16,
    /// Directory holding the knowledge files and the default store file.
    pub data_dir: PathBuf,
    pub store: StoreBackend,
    /// Store file. `None` only for the memory backend.
    pub db_path: Option<PathBuf>,
    /// When set, logs are also written to a daily rolling file here.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            data_dir: PathBuf::from("./data"),
            store: StoreBackend::Json,
            db_path: Some(PathBuf::from("./data/onboarding.json")),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Build config from `HELPDESK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source. Unset or blank
    /// variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let host = get("HELPDESK_HOST").unwrap_or(defaults.host);

        let port = match get("HELPDESK_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "HELPDESK_PORT".to_string(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => defaults.port,
        };

        let data_dir = get("HELPDESK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let store = match get("HELPDESK_STORE") {
            Some(raw) => raw
                .parse::<StoreBackend>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "HELPDESK_STORE".to_string(),
                    message,
                })?,
            None => defaults.store,
        };

        let db_path = get("HELPDESK_DB_PATH")
            .map(PathBuf::from)
            .or_else(|| store.default_file().map(|file| data_dir.join(file)));

        let log_dir = get("HELPDESK_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            host,
            port,
            data_dir,
            store,
            db_path,
            log_dir,
        })
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
