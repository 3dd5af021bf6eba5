//! Service configuration loaded from the environment

use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {name} value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("{0} must be set for the postgres storage backend")]
    Missing(&'static str),
}

/// Where templates are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local store, contents are lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    /// Required when `storage` is `Postgres`
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Call `dotenv::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = parse(&lookup, "STORAGE_BACKEND", StorageBackend::default())?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse(&lookup, "PORT", 8086)?,
            storage,
            database_url,
            max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST",
                value: self.host.clone(),
            })
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
