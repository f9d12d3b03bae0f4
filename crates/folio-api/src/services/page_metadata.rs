//! Universal page metadata (`date`, `topics`), shared by every project.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use folio_core::{PageMetadataUpdate, PageRepository, Result};

pub struct PageMetadataService {
    pages: Arc<dyn PageRepository>,
}

impl PageMetadataService {
    pub fn new(pages: Arc<dyn PageRepository>) -> Self {
        Self { pages }
    }

    /// Apply `date` and/or `topics` from a raw metadata object to a page.
    ///
    /// Unrecognized keys are ignored. When neither field is present nothing
    /// is written and the result is `false`; otherwise the result is whether
    /// a page matched.
    pub async fn update(&self, page_id: Uuid, metadata: &Value) -> Result<bool> {
        let update = PageMetadataUpdate::from_value(metadata);
        if update.is_empty() {
            debug!(
                subsystem = "api",
                component = "page_metadata",
                page_id = %page_id,
                "No recognized metadata fields; nothing to update"
            );
            return Ok(false);
        }

        let matched = self.pages.update_metadata(page_id, &update).await?;
        info!(
            subsystem = "api",
            component = "page_metadata",
            op = "update",
            page_id = %page_id,
            date = update.date.is_some(),
            topics = update.topics.is_some(),
            success = matched,
            "Updated page metadata"
        );
        Ok(matched)
    }
}
