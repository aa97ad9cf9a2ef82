//! Runtime configuration read from the environment (after `.env` is loaded).

use std::env;
use std::net::SocketAddr;

pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
pub const BIND_ADDR_ENV_VAR: &str = "BIND_ADDR";
pub const DB_MAX_CONNECTIONS_ENV_VAR: &str = "DB_MAX_CONNECTIONS";
pub const CORS_ORIGINS_ENV_VAR: &str = "CORS_ORIGINS";
pub const DEFAULT_USER_ENV_VAR: &str = "DEFAULT_USER";
/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "FORECAST_LOG";

const DEFAULT_DATABASE_URL: &str = "sqlite://./forecast_tracker.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";
const DEFAULT_USER: &str = "Current User";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub cors_origins: Vec<String>,
    /// Recorded as submitter/creator when a request names nobody.
    pub default_user: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
            default_user: DEFAULT_USER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup(BIND_ADDR_ENV_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind.parse().map_err(|_| ConfigError::Invalid {
            var: BIND_ADDR_ENV_VAR,
            value: bind.clone(),
        })?;

        let max_connections = match lookup(DB_MAX_CONNECTIONS_ENV_VAR) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: DB_MAX_CONNECTIONS_ENV_VAR,
                        value: raw,
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: lookup(DATABASE_URL_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            max_connections,
            cors_origins: split_origins(
                &lookup(CORS_ORIGINS_ENV_VAR).unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            default_user: lookup(DEFAULT_USER_ENV_VAR)
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER.to_string()),
        })
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

/// Initialize tracing with the FORECAST_LOG filter, defaulting to "info".
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_ENV_VAR, "sqlite::memory:"),
            (BIND_ADDR_ENV_VAR, "0.0.0.0:8080"),
            (DB_MAX_CONNECTIONS_ENV_VAR, "2"),
            (CORS_ORIGINS_ENV_VAR, " http://a , ,http://b"),
            (DEFAULT_USER_ENV_VAR, "ola"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.cors_origins, vec!["http://a", "http://b"]);
        assert_eq!(config.default_user, "ola");
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = AppConfig::from_lookup(lookup_from(&[(BIND_ADDR_ENV_VAR, "nowhere")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid { var: BIND_ADDR_ENV_VAR, value: "nowhere".to_string() }
        );

        assert!(AppConfig::from_lookup(lookup_from(&[(DB_MAX_CONNECTIONS_ENV_VAR, "0")])).is_err());
    }
}
