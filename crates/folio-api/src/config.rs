//! Server configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | `postgres://localhost/folio` |
//! | `HOST` / `PORT` | `0.0.0.0` / `5000` |
//! | `ALLOWED_ORIGINS` | `http://localhost:5173,http://localhost:3000` |
//! | `DB_MAX_CONNECTIONS` / `DB_MIN_CONNECTIONS` | `10` / `1` |
//! | `DB_ACQUIRE_TIMEOUT_SECS` | `30` |
//! | `DB_IDLE_TIMEOUT_SECS` | `600` (`0` disables) |
//! | `DB_MAX_LIFETIME_SECS` | `1800` (`0` disables) |
//! | `SEARCH_RESULT_LIMIT` | `500` |
//! | `LOG_FORMAT` | `text` (or `json`) |
//! | `LOG_FILE` | unset (stdout only) |
//! | `LOG_ANSI` | auto |

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use folio_core::defaults;
use folio_core::Error;
use folio_db::{pool::seconds_or_disabled, PoolConfig};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<HeaderValue>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// `0` disables the idle timeout.
    pub db_idle_timeout_secs: u64,
    /// `0` disables connection recycling.
    pub db_max_lifetime_secs: u64,
    /// Maximum number of pages a single search returns.
    pub search_result_limit: i64,
    pub log_format: String,
    pub log_file: Option<String>,
    pub log_ansi: Option<bool>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or unparseable values fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_or(&lookup, "PORT", defaults::PORT);
        let db_max_connections =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults::DB_MAX_CONNECTIONS);
        let search_result_limit =
            parse_or(&lookup, "SEARCH_RESULT_LIMIT", defaults::SEARCH_RESULT_LIMIT).max(1);

        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            host: lookup("HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            allowed_origins: parse_allowed_origins(&lookup("ALLOWED_ORIGINS").unwrap_or_default()),
            db_max_connections: db_max_connections.max(1),
            db_min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", defaults::DB_MIN_CONNECTIONS),
            db_acquire_timeout_secs: parse_or(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults::DB_ACQUIRE_TIMEOUT_SECS,
            )
            .max(1),
            db_idle_timeout_secs: parse_or(
                &lookup,
                "DB_IDLE_TIMEOUT_SECS",
                defaults::DB_IDLE_TIMEOUT_SECS,
            ),
            db_max_lifetime_secs: parse_or(
                &lookup,
                "DB_MAX_LIFETIME_SECS",
                defaults::DB_MAX_LIFETIME_SECS,
            ),
            search_result_limit,
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
            log_file: lookup("LOG_FILE").filter(|p| !p.trim().is_empty()),
            log_ansi: lookup("LOG_ANSI").map(|v| v == "true" || v == "1"),
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
            .idle_timeout(seconds_or_disabled(self.db_idle_timeout_secs))
            .max_lifetime(seconds_or_disabled(self.db_max_lifetime_secs))
            .normalized()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid HOST/PORT: {}", e)))
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(subsystem = "api", key, value = %raw, "Ignoring unparseable setting");
            default
        }),
        None => default,
    }
}

/// Parse a comma-separated origin list. Blank input yields the defaults;
/// entries that are not valid header values are dropped.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    if origins.trim().is_empty() {
        return defaults::ALLOWED_ORIGINS
            .iter()
            .map(|o| HeaderValue::from_static(o))
            .collect();
    }

    origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.database_url, "postgres://localhost/folio");
        assert_eq!(config.search_result_limit, 500);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.allowed_origins.len(), 2);
        assert_eq!(config.log_format, "text");
        assert!(config.log_file.is_none());
        assert!(config.log_ansi.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("SEARCH_RESULT_LIMIT", "25"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("LOG_ANSI", "false"),
            ("LOG_FORMAT", "json"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.search_result_limit, 25);
        assert_eq!(config.pool_config().max_connections, 3);
        assert_eq!(config.log_ansi, Some(false));
        assert_eq!(config.log_format, "json");
    }

    #[test]
    fn test_pool_settings_flow_into_pool_config() {
        let pool = config_from(&[
            ("DB_MAX_CONNECTIONS", "6"),
            ("DB_MIN_CONNECTIONS", "2"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "7"),
            ("DB_IDLE_TIMEOUT_SECS", "0"),
            ("DB_MAX_LIFETIME_SECS", "120"),
        ])
        .pool_config();

        assert_eq!(pool.max_connections, 6);
        assert_eq!(pool.min_connections, 2);
        assert_eq!(pool.acquire_timeout, Duration::from_secs(7));
        assert_eq!(pool.idle_timeout, None);
        assert_eq!(pool.max_lifetime, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_default_pool_config_matches_db_defaults() {
        assert_eq!(ServerConfig::default().pool_config(), PoolConfig::default());
    }

    #[test]
    fn test_pool_min_clamped_to_max() {
        let pool = config_from(&[("DB_MAX_CONNECTIONS", "3"), ("DB_MIN_CONNECTIONS", "9")])
            .pool_config();
        assert_eq!(pool.min_connections, 3);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("SEARCH_RESULT_LIMIT", "-4")]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.search_result_limit, 1);
    }

    #[test]
    fn test_socket_addr() {
        let config = config_from(&[("HOST", "127.0.0.1"), ("PORT", "5001")]);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:5001");

        let config = config_from(&[("HOST", "not a host")]);
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_allowed_origins_parsing() {
        let origins = parse_allowed_origins("https://archive.example.org, http://localhost:3000 ,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0].to_str().unwrap(), "https://archive.example.org");
        assert_eq!(origins[1].to_str().unwrap(), "http://localhost:3000");

        let origins = parse_allowed_origins("");
        assert_eq!(origins[0].to_str().unwrap(), "http://localhost:5173");
    }
}
