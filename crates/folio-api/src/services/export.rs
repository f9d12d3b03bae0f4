//! Project CSV export.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use folio_core::{build_export, Error, PageRepository, ProjectExport, ProjectRepository, Result};

pub struct ExportService {
    pages: Arc<dyn PageRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl ExportService {
    pub fn new(pages: Arc<dyn PageRepository>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self { pages, projects }
    }

    /// Merge every page of a project with its annotations, sorted for export.
    pub async fn export_project(&self, project_id: Uuid) -> Result<ProjectExport> {
        let start = Instant::now();
        let project = self
            .projects
            .get(project_id)
            .await?
            .ok_or(Error::ProjectNotFound(project_id))?;

        let pages = self.pages.get_many(&project.pages).await?;
        let export = build_export(&project, &pages);

        info!(
            subsystem = "api",
            component = "export",
            op = "export_project",
            project_id = %project_id,
            result_count = export.rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Exported project"
        );
        Ok(export)
    }
}
