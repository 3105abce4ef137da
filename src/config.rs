use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown storage backend '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    /// `None` only for the memory backend.
    pub database: Option<DatabaseConfig>,
    pub server: ServerConfig,
}

/// Loads configuration from the process environment.
pub fn load() -> Result<Config> {
    from_lookup(|key| std::env::var(key).ok())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| anyhow!("Invalid value for {key}: {err}")),
        None => Ok(default),
    }
}

pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let storage = parse_or(&lookup, "STORAGE_BACKEND", StorageBackend::Postgres)?;

    let database = match storage {
        StorageBackend::Postgres => Some(DatabaseConfig {
            url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        }),
        StorageBackend::Memory => None,
    };

    let server = ServerConfig {
        host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
        port: parse_or(&lookup, "SERVER_PORT", 8080)?,
        request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
    };

    Ok(Config {
        storage,
        database,
        server,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/orders")])).unwrap();

        assert_eq!(config.storage, StorageBackend::Postgres);
        let database = config.database.unwrap();
        assert_eq!(database.url, "postgres://localhost/orders");
        assert_eq!(database.max_connections, 10);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout, Duration::from_secs(30));
        assert_eq!(config.server.addr().unwrap().port(), 8080);
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let config = from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("SERVER_PORT", "9000"),
        ]))
        .unwrap();

        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.database.is_none());
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        let err = from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("REQUEST_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
    }
}
