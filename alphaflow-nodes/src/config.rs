// src/config.rs
//! Process-level configuration for the Zylon node.

use std::env;
use std::sync::Once;

use tracing::debug;

pub const ZYLON_HOST_VAR: &str = "ZYLON_HOST";
pub const DEFAULT_ZYLON_HOST: &str = "http://localhost:8001";

static DOTENV: Once = Once::new();

/// Load a `.env` file from the working directory, at most once per process.
pub fn load_dotenv() {
    DOTENV.call_once(|| {
        if let Ok(path) = dotenv::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZylonConfig {
    /// Endpoint every Zylon client is pointed at.
    pub host: String,
}

impl Default for ZylonConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ZYLON_HOST.to_string(),
        }
    }
}

impl ZylonConfig {
    /// Read `ZYLON_HOST` from the process environment (after `.env`).
    pub fn from_env() -> Self {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// An empty value counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ZYLON_HOST_VAR)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_ZYLON_HOST.to_string());
        Self { host }
    }

    pub fn with_host(host: &str) -> Self {
        Self {
            host: host.to_string(),
        }
    }
}
