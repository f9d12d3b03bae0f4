//! Project annotation merge engine.
//!
//! Client patches arrive from a free-text annotation UI and are frequently
//! half-formed (a passage dragged mid-edit, a notes map sent as a string).
//! Everything here parses such input once, at the boundary, into typed values:
//! malformed sub-elements are dropped and the rest of the patch still applies.
//!
//! The same lenient parsing is used for annotations read back from the store,
//! so a damaged stored entry degrades to defaults instead of failing the read.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{PageAnnotation, PageMetadataUpdate, Passage, ProjectUpdate};
use crate::uuid_utils::parse_id;

// =============================================================================
// COERCION
// =============================================================================

/// Coerce any JSON value to a string. `null` becomes empty.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Coerce a text offset. Anything that is not an integer-like number or
/// numeric string becomes 0.
pub fn coerce_offset(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f as i64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

// =============================================================================
// PASSAGES & NOTES
// =============================================================================

/// Normalize one passage. Returns `None` unless the value is a mapping with a
/// non-null `text`.
pub fn parse_passage(value: &Value) -> Option<Passage> {
    let obj = value.as_object()?;
    let text = match obj.get("text") {
        None | Some(Value::Null) => return None,
        Some(text) => coerce_string(text),
    };

    Some(Passage {
        id: obj.get("id").map(coerce_string).unwrap_or_default(),
        text,
        start: coerce_offset(obj.get("start")),
        end: coerce_offset(obj.get("end")),
    })
}

/// Normalize a passage list, skipping malformed elements.
///
/// A value that is not a sequence yields an empty list.
pub fn parse_passages(value: &Value) -> Vec<Passage> {
    let Some(items) = value.as_array() else {
        warn!(
            subsystem = "core",
            component = "annotation",
            "passages is not a list; replacing with empty list"
        );
        return Vec::new();
    };

    let passages: Vec<Passage> = items.iter().filter_map(parse_passage).collect();
    if passages.len() < items.len() {
        debug!(
            subsystem = "core",
            component = "annotation",
            dropped = items.len() - passages.len(),
            kept = passages.len(),
            "Dropped malformed passages"
        );
    }
    passages
}

/// Normalize a passage-notes mapping.
///
/// A value that is not a mapping is replaced wholesale by an empty mapping.
pub fn parse_passage_notes(value: &Value) -> BTreeMap<String, String> {
    let Some(obj) = value.as_object() else {
        warn!(
            subsystem = "core",
            component = "annotation",
            "passage_notes is not a mapping; replacing with empty mapping"
        );
        return BTreeMap::new();
    };

    obj.iter()
        .map(|(k, v)| (k.clone(), coerce_string(v)))
        .collect()
}

// =============================================================================
// PATCH
// =============================================================================

/// A sanitized annotation patch. `None` fields were absent from the request
/// and leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationPatch {
    pub passages: Option<Vec<Passage>>,
    pub page_notes: Option<String>,
    pub passage_notes: Option<BTreeMap<String, String>>,
}

impl AnnotationPatch {
    /// Parse a client patch. Unknown keys are ignored; a non-mapping patch is
    /// treated as empty.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            warn!(
                subsystem = "core",
                component = "annotation",
                "annotation patch is not a mapping; ignoring"
            );
            return Self::default();
        };
        Self::from_map(obj)
    }

    fn from_map(obj: &Map<String, Value>) -> Self {
        Self {
            passages: obj.get("passages").map(parse_passages),
            page_notes: obj.get("page_notes").map(coerce_string),
            passage_notes: obj.get("passage_notes").map(parse_passage_notes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_none() && self.page_notes.is_none() && self.passage_notes.is_none()
    }
}

impl PageAnnotation {
    /// Leniently parse a stored annotation; anything unusable becomes default.
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(obj) => Self::default().merged(&AnnotationPatch::from_map(obj)),
            None => Self::default(),
        }
    }

    /// Apply a patch field by field. Unpatched fields are preserved.
    pub fn merged(&self, patch: &AnnotationPatch) -> Self {
        Self {
            passages: patch
                .passages
                .clone()
                .unwrap_or_else(|| self.passages.clone()),
            page_notes: patch
                .page_notes
                .clone()
                .unwrap_or_else(|| self.page_notes.clone()),
            passage_notes: patch
                .passage_notes
                .clone()
                .unwrap_or_else(|| self.passage_notes.clone()),
        }
    }
}

// =============================================================================
// PROJECT MAPS
// =============================================================================

/// Parse a stored or submitted `page_metadata` map.
///
/// Non-mapping input yields an empty map; entries whose key is not a page id
/// are dropped.
pub fn parse_page_metadata(value: &Value) -> BTreeMap<Uuid, PageAnnotation> {
    let Some(obj) = value.as_object() else {
        return BTreeMap::new();
    };

    obj.iter()
        .filter_map(|(key, annotation)| match parse_id(key) {
            Some(page_id) => Some((page_id, PageAnnotation::from_value(annotation))),
            None => {
                warn!(
                    subsystem = "core",
                    component = "annotation",
                    key = %key,
                    "Dropping page_metadata entry with non-uuid key"
                );
                None
            }
        })
        .collect()
}

/// Parse a `page_keywords` map; values are coerced to strings.
pub fn parse_page_keywords(value: &Value) -> BTreeMap<Uuid, String> {
    let Some(obj) = value.as_object() else {
        return BTreeMap::new();
    };

    obj.iter()
        .filter_map(|(key, keywords)| parse_id(key).map(|id| (id, coerce_string(keywords))))
        .collect()
}

// =============================================================================
// UPDATE REQUESTS
// =============================================================================

impl PageMetadataUpdate {
    /// Pick the recognized universal fields out of a client payload.
    ///
    /// `date` may be a string or null (clears it); `topics` must be a list
    /// and its null elements are dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let date = obj.get("date").map(|d| match d {
            Value::Null => None,
            other => Some(coerce_string(other)),
        });
        let topics = obj.get("topics").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter(|t| !t.is_null())
                .map(coerce_string)
                .collect()
        });

        Self { date, topics }
    }
}

impl ProjectUpdate {
    /// Parse the editable project fields out of a client payload.
    ///
    /// `pages` must be a list of page ids; an unparseable id is rejected since
    /// silently dropping it would detach the page from the project.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("Project update must be an object".to_string()))?;

        let pages = match obj.get("pages") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .and_then(parse_id)
                            .ok_or_else(|| Error::InvalidInput(format!("Invalid page id: {}", item)))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "pages must be a list, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            title: obj.get("title").map(coerce_string),
            description: obj.get("description").map(coerce_string),
            pages,
            page_keywords: obj.get("page_keywords").map(parse_page_keywords),
            page_metadata: obj.get("page_metadata").map(parse_page_metadata),
        })
    }
}
