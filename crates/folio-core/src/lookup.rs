//! Cross-project passage lookup: which other projects highlighted this page.

use uuid::Uuid;

use crate::models::{PassageOccurrence, Project};

/// Scan projects for passages on `page_id`.
///
/// A project is included when it references the page, is not `exclude`, and
/// has at least one passage on the page. Input order is preserved.
pub fn find_passages_elsewhere(
    projects: &[Project],
    page_id: Uuid,
    exclude: Option<Uuid>,
) -> Vec<PassageOccurrence> {
    projects
        .iter()
        .filter(|project| Some(project.id) != exclude)
        .filter(|project| project.contains_page(page_id))
        .filter_map(|project| {
            let annotation = project.annotation(page_id)?;
            if !annotation.has_passages() {
                return None;
            }
            Some(PassageOccurrence {
                project_id: project.id,
                project_title: project.display_title(),
                passages: annotation.passages.clone(),
                passage_notes: annotation.passage_notes.clone(),
            })
        })
        .collect()
}
