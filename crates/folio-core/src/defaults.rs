//! Centralized default constants for folio.
//!
//! **This module is the single source of truth** for shared default values.
//! The API and database crates reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// SERVER
// =============================================================================

/// Default bind address.
pub const HOST: &str = "0.0.0.0";

/// Default HTTP port.
pub const PORT: u16 = 5000;

/// Default database URL when `DATABASE_URL` is unset.
pub const DATABASE_URL: &str = "postgres://localhost/folio";

/// Origins allowed by CORS when `ALLOWED_ORIGINS` is unset.
pub const ALLOWED_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

/// Maximum accepted request body (bytes).
pub const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

// =============================================================================
// DATABASE POOL
// =============================================================================

pub const DB_MAX_CONNECTIONS: u32 = 10;

pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Seconds to wait for a free pooled connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Seconds an idle connection is kept; 0 keeps it indefinitely.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Seconds before a connection is recycled; 0 never recycles.
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// SEARCH
// =============================================================================

/// Maximum number of pages returned by a single search.
pub const SEARCH_RESULT_LIMIT: i64 = 500;

// =============================================================================
// EXPORT
// =============================================================================

/// Number of trailing id characters used when a project has no title.
pub const SHORT_ID_LEN: usize = 6;

/// Separator between topics in the export Topics column.
pub const TOPIC_SEPARATOR: &str = "; ";

/// Separator between flattened passages in the export Passages column.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origins_are_valid_urls() {
        for origin in ALLOWED_ORIGINS {
            assert!(origin.starts_with("http://") || origin.starts_with("https://"));
        }
    }

    #[test]
    fn test_search_limit_positive() {
        assert!(SEARCH_RESULT_LIMIT > 0);
    }
}
