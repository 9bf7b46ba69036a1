//! Runtime configuration read from the environment.
//!
//! | variable     | default     |
//! |--------------|-------------|
//! | `HOST`       | `127.0.0.1` |
//! | `PORT`       | `3000`      |
//! | `STORE_URL`  | `memory://` |
//! | `BASE_PATH`  | `/api`      |
//! | `STATIC_DIR` | `assets`    |

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("HOST='{0}' is not an IP address")]
    InvalidHost(String),

    #[error("PORT='{0}' is not a valid port number")]
    InvalidPort(String),

    #[error("STORE_URL='{0}' must be memory:// or file://<path>")]
    InvalidStoreUrl(String),
}

/// Where todos are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    Memory,
    /// A JSON document on disk holding the whole collection.
    File(PathBuf),
}

impl FromStr for StoreUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "memory" || s == "memory://" {
            return Ok(StoreUrl::Memory);
        }
        match s.strip_prefix("file://") {
            Some(path) if !path.is_empty() => Ok(StoreUrl::File(PathBuf::from(path))),
            _ => Err(ConfigError::InvalidStoreUrl(s.to_string())),
        }
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreUrl::Memory => write!(f, "memory://"),
            StoreUrl::File(path) => write!(f, "file://{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub store_url: StoreUrl,
    /// Always starts with `/` and has no trailing slash, except the root `/`.
    pub base_path: String,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            store_url: StoreUrl::Memory,
            base_path: "/api".to_string(),
            static_dir: PathBuf::from("assets"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or blank keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host.parse().map_err(|_| ConfigError::InvalidHost(host))?;
        }
        if let Some(port) = get("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(url) = get("STORE_URL") {
            config.store_url = url.parse()?;
        }
        if let Some(base_path) = get("BASE_PATH") {
            config.base_path = normalize_base_path(&base_path);
        }
        if let Some(dir) = get("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}
