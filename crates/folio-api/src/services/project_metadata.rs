//! Project-scoped writes: whole-project updates and the per-page
//! annotation merge.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use folio_core::{
    order_pages, AnnotationPatch, Error, PageRepository, ProjectRepository, ProjectUpdate,
    ProjectWithPages, Result,
};

pub struct ProjectMetadataService {
    pages: Arc<dyn PageRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl ProjectMetadataService {
    pub fn new(pages: Arc<dyn PageRepository>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self { pages, projects }
    }

    /// A project with its page records, in project order.
    ///
    /// Pages that no longer exist are left out of `page_docs`.
    pub async fn project_with_pages(&self, project_id: Uuid) -> Result<ProjectWithPages> {
        let project = self
            .projects
            .get(project_id)
            .await?
            .ok_or(Error::ProjectNotFound(project_id))?;

        let fetched = self.pages.get_many(&project.pages).await?;
        let page_docs = order_pages(&project.pages, fetched);

        Ok(ProjectWithPages { project, page_docs })
    }

    /// Apply the fields present in a raw update body.
    pub async fn update_project(&self, project_id: Uuid, body: &Value) -> Result<()> {
        let update = ProjectUpdate::from_value(body)?;
        if !self.projects.update(project_id, &update).await? {
            return Err(Error::ProjectNotFound(project_id));
        }

        info!(
            subsystem = "api",
            component = "project_metadata",
            op = "update_project",
            project_id = %project_id,
            title = update.title.is_some(),
            pages = update.pages.as_ref().map(Vec::len),
            "Updated project"
        );
        Ok(())
    }

    /// Merge a raw annotation patch into one page of a project.
    ///
    /// Malformed parts of the patch are dropped while parsing; fields the
    /// patch does not mention keep their stored values.
    pub async fn update_page_annotation(
        &self,
        project_id: Uuid,
        page_id: Uuid,
        patch: &Value,
    ) -> Result<bool> {
        let patch = AnnotationPatch::from_value(patch);
        let success = self
            .projects
            .merge_page_annotation(project_id, page_id, &patch)
            .await?;

        info!(
            subsystem = "api",
            component = "project_metadata",
            op = "merge_annotation",
            project_id = %project_id,
            page_id = %page_id,
            passages = patch.passages.as_ref().map(Vec::len),
            page_notes = patch.page_notes.is_some(),
            passage_notes = patch.passage_notes.as_ref().map(|n| n.len()),
            success,
            "Merged page annotation"
        );
        Ok(success)
    }
}
