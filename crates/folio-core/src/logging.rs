//! Structured logging field names shared by every folio crate.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Store failure surfaced to a client as a 500 |
//! | WARN  | Malformed input repaired or skipped, dangling references |
//! | INFO  | Lifecycle events, writes (create, update, delete, export) |
//! | DEBUG | Decision points, query shapes, result counts |
//!
//! ## Field names
//!
//! Events carry `subsystem` ("api", "core", "database"), `component` and
//! `op`, plus `project_id` / `page_id` where an entity is addressed and
//! `duration_ms` / `result_count` for timed queries. Pool events add
//! `pool_size` and `pool_idle`.

/// Header carrying the request id (UUIDv7) in and out of the API.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_header_is_valid_header_name() {
        assert_eq!(REQUEST_ID_HEADER, REQUEST_ID_HEADER.to_ascii_lowercase());
        assert!(REQUEST_ID_HEADER
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }
}
