//! Core data models for folio.
//!
//! A [`Page`] is a scanned archive record shared by every project. A
//! [`Project`] groups pages and carries project-scoped annotations
//! ([`PageAnnotation`]) keyed by page id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::uuid_utils::short_id;

// =============================================================================
// PAGE TYPES
// =============================================================================

/// A single scanned page with its universal (cross-project) metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub volume_title: String,
    /// Page number as printed; usually numeric but not guaranteed.
    pub page_number: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub keywords: String,
}

impl Page {
    /// Numeric value of `page_number`; anything non-numeric counts as 0.
    pub fn page_number_value(&self) -> i64 {
        page_number_value(&self.page_number)
    }
}

/// Longest digit run treated as numeric; the store's sort key uses the same
/// bound so database and in-memory ordering agree.
pub const PAGE_NUMBER_MAX_DIGITS: usize = 18;

/// Numeric value of a page number string.
///
/// An optional sign followed by 1 to [`PAGE_NUMBER_MAX_DIGITS`] ASCII digits,
/// surrounded by optional whitespace; anything else counts as 0.
pub fn page_number_value(page_number: &str) -> i64 {
    let trimmed = page_number.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty()
        || digits.len() > PAGE_NUMBER_MAX_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return 0;
    }
    trimmed.parse::<i64>().unwrap_or(0)
}

/// Which neighbour of a page to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjacentDirection {
    Next,
    Previous,
}

impl std::str::FromStr for AdjacentDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "next" => Ok(AdjacentDirection::Next),
            "previous" | "prev" => Ok(AdjacentDirection::Previous),
            other => Err(format!(
                "Invalid direction '{}': expected 'next' or 'previous'",
                other
            )),
        }
    }
}

/// Update of the universal page fields.
///
/// `date` is doubly optional: `None` leaves the date untouched while
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadataUpdate {
    pub date: Option<Option<String>>,
    pub topics: Option<Vec<String>>,
}

impl PageMetadataUpdate {
    /// True when neither recognized field was supplied.
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.topics.is_none()
    }
}

// =============================================================================
// ANNOTATION TYPES
// =============================================================================

/// A highlighted sub-range of a page's text.
///
/// `start`/`end` index into the page text but are not validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
}

/// Project-scoped annotations for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAnnotation {
    #[serde(default)]
    pub passages: Vec<Passage>,
    #[serde(default)]
    pub page_notes: String,
    /// Notes keyed by passage id. Entries may outlive their passage.
    #[serde(default)]
    pub passage_notes: BTreeMap<String, String>,
}

impl PageAnnotation {
    /// Whether at least one passage is highlighted.
    pub fn has_passages(&self) -> bool {
        !self.passages.is_empty()
    }

    /// The note for a passage, if one exists and is not blank.
    pub fn note_for(&self, passage_id: &str) -> Option<&str> {
        self.passage_notes
            .get(passage_id)
            .map(String::as_str)
            .filter(|note| !note.trim().is_empty())
    }
}

// =============================================================================
// PROJECT TYPES
// =============================================================================

/// A user-defined grouping of pages with project-scoped annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Referenced page ids in display order, without duplicates.
    #[serde(default)]
    pub pages: Vec<Uuid>,
    #[serde(default)]
    pub page_keywords: BTreeMap<Uuid, String>,
    #[serde(default)]
    pub page_metadata: BTreeMap<Uuid, PageAnnotation>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl Project {
    /// A new project with no pages or annotations.
    pub fn empty(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::new(),
            description: String::new(),
            pages: Vec::new(),
            page_keywords: BTreeMap::new(),
            page_metadata: BTreeMap::new(),
            created_at_utc: now,
            updated_at_utc: now,
        }
    }

    /// Whether the project references the page.
    pub fn contains_page(&self, page_id: Uuid) -> bool {
        self.pages.contains(&page_id)
    }

    /// The project's annotation for a page, if any.
    pub fn annotation(&self, page_id: Uuid) -> Option<&PageAnnotation> {
        self.page_metadata.get(&page_id)
    }

    /// Title for display; untitled projects get a label from their id.
    pub fn display_title(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            format!("Project {}", short_id(&self.id))
        } else {
            title.to_string()
        }
    }

    /// Apply an update in place. Fields absent from the update are kept.
    pub fn apply_update(&mut self, update: &ProjectUpdate, now: DateTime<Utc>) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(pages) = &update.pages {
            self.pages = dedup_page_ids(pages);
        }
        if let Some(page_keywords) = &update.page_keywords {
            self.page_keywords = page_keywords.clone();
        }
        if let Some(page_metadata) = &update.page_metadata {
            self.page_metadata = page_metadata.clone();
        }
        self.updated_at_utc = now;
    }
}

/// Partial project update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pages: Option<Vec<Uuid>>,
    pub page_keywords: Option<BTreeMap<Uuid, String>>,
    pub page_metadata: Option<BTreeMap<Uuid, PageAnnotation>>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.pages.is_none()
            && self.page_keywords.is_none()
            && self.page_metadata.is_none()
    }
}

/// A project together with the page records it references.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithPages {
    #[serde(flatten)]
    pub project: Project,
    pub page_docs: Vec<Page>,
}

/// Drop repeated page ids, keeping the first occurrence of each.
pub fn dedup_page_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Arrange fetched pages in the order of `ids`, dropping ids with no page.
pub fn order_pages(ids: &[Uuid], pages: Vec<Page>) -> Vec<Page> {
    let mut by_id: std::collections::HashMap<Uuid, Page> =
        pages.into_iter().map(|p| (p.id, p)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

// =============================================================================
// LOOKUP & EXPORT TYPES
// =============================================================================

/// Passages another project highlighted on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageOccurrence {
    pub project_id: Uuid,
    pub project_title: String,
    pub passages: Vec<Passage>,
    pub passage_notes: BTreeMap<String, String>,
}

/// Distinct years found across page dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    pub years: Vec<i32>,
    /// `"<first>-<last>"` for dates that mention several years.
    pub ranges: Vec<String>,
}
