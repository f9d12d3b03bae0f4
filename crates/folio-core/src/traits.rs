//! Core traits for folio storage.
//!
//! The API talks to storage only through these traits, so the PostgreSQL
//! implementation in `folio-db` can be swapped for an in-memory one in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::annotation::AnnotationPatch;
use crate::error::Result;
use crate::models::*;
use crate::search::PageSearchRequest;

// =============================================================================
// PAGE REPOSITORY
// =============================================================================

/// Repository for page records.
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Insert a page (used by ingestion tooling and tests).
    async fn insert(&self, page: &Page) -> Result<()>;

    /// Get a page by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Page>>;

    /// Fetch many pages in one call. Missing ids are silently absent from the
    /// result; order is unspecified.
    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Page>>;

    /// Search pages, ordered by volume then numeric page number.
    async fn search(&self, request: &PageSearchRequest, limit: i64) -> Result<Vec<Page>>;

    /// The nearest page in the same volume in the given direction.
    async fn adjacent(&self, page: &Page, direction: AdjacentDirection) -> Result<Option<Page>>;

    /// All distinct non-empty page dates.
    async fn list_dates(&self) -> Result<Vec<String>>;

    /// Apply a universal metadata update. Returns whether a page matched.
    async fn update_metadata(&self, id: Uuid, update: &PageMetadataUpdate) -> Result<bool>;
}

// =============================================================================
// PROJECT REPOSITORY
// =============================================================================

/// Repository for projects and their annotations.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Create and return an empty project.
    async fn create(&self) -> Result<Project>;

    /// Get a project by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Project>>;

    /// List every project in creation order.
    async fn list(&self) -> Result<Vec<Project>>;

    /// Apply a partial update. Returns whether the project matched.
    async fn update(&self, id: Uuid, update: &ProjectUpdate) -> Result<bool>;

    /// Delete a project. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Merge a sanitized patch into the annotation of one page.
    ///
    /// Only the addressed page's entry is rewritten. Fails with
    /// `Error::ProjectNotFound` when the project does not exist; otherwise
    /// returns whether the write matched.
    async fn merge_page_annotation(
        &self,
        project_id: Uuid,
        page_id: Uuid,
        patch: &AnnotationPatch,
    ) -> Result<bool>;
}
