//! Configuration loading and representation.

use thiserror::Error;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const DB_MAX_CONNECTIONS_ENV: &str = "STOCKBOOK_DB_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Settings for the storage adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraConfig {
    /// Postgres connection string. `None` means in-memory adapters only.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl InfraConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (the process environment in `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty());

        let db_max_connections = match lookup(DB_MAX_CONNECTIONS_ENV) {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        name: DB_MAX_CONNECTIONS_ENV,
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            database_url,
            db_max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = InfraConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, InfraConfig::default());
    }

    #[test]
    fn reads_url_and_pool_size() {
        let config = InfraConfig::from_lookup(lookup(&[
            (DATABASE_URL_ENV, "postgres://localhost/stockbook"),
            (DB_MAX_CONNECTIONS_ENV, "12"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/stockbook"));
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn rejects_bad_pool_size() {
        for bad in ["0", "-1", "many"] {
            let err = InfraConfig::from_lookup(lookup(&[(DB_MAX_CONNECTIONS_ENV, bad)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidNumber { .. }));
        }
    }
}
