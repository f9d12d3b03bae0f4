//! Page reads, navigation and universal metadata updates.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use super::{require_id, JsonBody};
use crate::services::PageMetadataService;
use crate::{ApiError, AppState};
use folio_core::{AdjacentDirection, Error};

#[derive(Debug, Deserialize)]
pub struct GetPageRequest {
    #[serde(rename = "_id", default)]
    pub id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AdjacentPageRequest {
    #[serde(default)]
    pub page_id: Option<Value>,
    #[serde(default)]
    pub direction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePageMetadataRequest {
    #[serde(default)]
    pub page_id: Option<Value>,
    #[serde(default)]
    pub metadata: Value,
}

/// Get a single page.
pub async fn get_page(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<GetPageRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id(request.id.as_ref(), "_id")?;
    let page = state.pages.get(id).await?.ok_or(Error::PageNotFound(id))?;
    Ok(Json(serde_json::json!({ "page": page })))
}

/// The next or previous page of the same volume.
///
/// # Returns
/// - 200 OK with `{page}`
/// - 400 Bad Request for a missing id or unknown direction
/// - 404 Not Found when the page does not exist or is at the end of its volume
pub async fn adjacent_page(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AdjacentPageRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id(request.page_id.as_ref(), "page_id")?;
    let direction: AdjacentDirection = request
        .direction
        .as_deref()
        .unwrap_or("next")
        .parse()
        .map_err(ApiError::BadRequest)?;

    let page = state.pages.get(id).await?.ok_or(Error::PageNotFound(id))?;

    let adjacent = state
        .pages
        .adjacent(&page, direction)
        .await?
        .ok_or_else(|| {
            let label = match direction {
                AdjacentDirection::Next => "next",
                AdjacentDirection::Previous => "previous",
            };
            Error::NotFound(format!(
                "No {} page for {} page {}",
                label, page.volume_title, page.page_number
            ))
        })?;
    Ok(Json(serde_json::json!({ "page": adjacent })))
}

/// Update a page's `date` and/or `topics` for every project at once.
pub async fn update_page_metadata(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdatePageMetadataRequest>,
) -> Result<Json<Value>, ApiError> {
    let page_id = require_id(request.page_id.as_ref(), "page_id")?;
    let service = PageMetadataService::new(state.pages.clone());
    let success = service.update(page_id, &request.metadata).await?;

    let message = if success {
        "Page metadata updated"
    } else {
        "No page metadata updated"
    };
    Ok(Json(serde_json::json!({
        "success": success,
        "message": message,
    })))
}
