//! Service configuration read from the environment.
//!
//! `USER_STORE_*` keys take precedence; the legacy `PORTOEDU_API_KEY` and
//! `PORTOEDU_DATA_DIR` names are honoured as fallbacks.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_KEY: &str = "devkey";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8001;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset or empty keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("USER_STORE_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Invalid port '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            api_key: get("USER_STORE_API_KEY")
                .or_else(|| get("PORTOEDU_API_KEY"))
                .unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            data_dir: get("USER_STORE_DATA_DIR")
                .or_else(|| get("PORTOEDU_DATA_DIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            host: get("USER_STORE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_default_key(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }
}
