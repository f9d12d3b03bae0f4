//! UUID helpers for project and page identifiers.
//!
//! Projects created through the API get UUIDv7 ids, so listing projects by id
//! also lists them in creation order.

use uuid::Uuid;

use crate::defaults::SHORT_ID_LEN;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use folio_core::uuid_utils::new_v7;
///
/// let a = new_v7();
/// let b = new_v7();
/// assert!(a <= b);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Last [`SHORT_ID_LEN`] characters of the hyphenated id.
///
/// Used as a human-readable stand-in when a project has no title.
pub fn short_id(id: &Uuid) -> String {
    let s = id.hyphenated().to_string();
    s[s.len() - SHORT_ID_LEN..].to_string()
}

/// Parse an id sent by a client, tolerating surrounding whitespace.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_is_version_7() {
        assert_eq!(new_v7().get_version_num(), 7);
    }

    #[test]
    fn test_short_id_takes_suffix() {
        let id = Uuid::parse_str("0190a5b2-7c3d-7e4f-8a9b-0c1d2e3f4a5b").unwrap();
        assert_eq!(short_id(&id), "3f4a5b");
    }

    #[test]
    fn test_parse_id_trims() {
        let id = new_v7();
        assert_eq!(parse_id(&format!("  {}\n", id)), Some(id));
        assert_eq!(parse_id("not-a-uuid"), None);
        assert_eq!(parse_id(""), None);
    }
}
