//! Page search request types.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::annotation::coerce_string;

/// Filters for the page search.
///
/// Every non-empty list is one AND-ed condition; values inside a list are
/// alternatives. Blank values are discarded when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageSearchRequest {
    #[serde(default, deserialize_with = "string_list")]
    pub volume: Vec<String>,
    #[serde(default, rename = "pageNumber", deserialize_with = "string_list")]
    pub page_number: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub date: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub year: Option<String>,
}

impl PageSearchRequest {
    /// True when no filter is set.
    pub fn is_empty(&self) -> bool {
        self.volume.is_empty()
            && self.page_number.is_empty()
            && self.date.is_empty()
            && self.topics.is_empty()
            && self.keywords.is_empty()
            && self.year.is_none()
    }
}

/// Accept a list of strings or numbers, or a single scalar.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        scalar => vec![scalar],
    };
    Ok(items
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| coerce_string(v).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Accept a string or number; blank becomes `None`.
fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let s = coerce_string(&value).trim().to_string();
    Ok((!s.is_empty()).then_some(s))
}
