//! Which other projects highlighted passages on a page.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use folio_core::{find_passages_elsewhere, PassageOccurrence, ProjectRepository, Result};

pub struct PassageLookupService {
    projects: Arc<dyn ProjectRepository>,
}

impl PassageLookupService {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    /// Scans every project, in creation order.
    pub async fn passages_elsewhere(
        &self,
        page_id: Uuid,
        current_project: Option<Uuid>,
    ) -> Result<Vec<PassageOccurrence>> {
        let projects = self.projects.list().await?;
        let found = find_passages_elsewhere(&projects, page_id, current_project);

        debug!(
            subsystem = "api",
            component = "passage_lookup",
            page_id = %page_id,
            scanned = projects.len(),
            result_count = found.len(),
            "Cross-project passage lookup"
        );
        Ok(found)
    }
}
