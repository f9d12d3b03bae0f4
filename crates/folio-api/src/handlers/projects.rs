//! Project HTTP handlers.
//!
//! Projects are addressed by `_id` in the body; the annotation and export
//! endpoints take `project_id` / `page_id` instead.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{optional_id, require_id, JsonBody};
use crate::services::{ExportService, PassageLookupService, ProjectMetadataService};
use crate::{ApiError, AppState};
use folio_core::Error;

#[derive(Debug, Deserialize)]
pub struct ProjectIdRequest {
    #[serde(rename = "_id", default)]
    pub id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectPageMetadataRequest {
    #[serde(default)]
    pub project_id: Option<Value>,
    #[serde(default)]
    pub page_id: Option<Value>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub project_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct PassageLookupRequest {
    #[serde(default)]
    pub page_id: Option<Value>,
    #[serde(default)]
    pub current_project_id: Option<Value>,
}

fn metadata_service(state: &AppState) -> ProjectMetadataService {
    ProjectMetadataService::new(state.pages.clone(), state.projects.clone())
}

/// List every project in creation order.
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let projects = state.projects.list().await?;
    Ok(Json(serde_json::json!({ "projects": projects })))
}

/// Get a project together with its page records (`page_docs`).
pub async fn get_project(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ProjectIdRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id(request.id.as_ref(), "_id")?;
    let project = metadata_service(&state).project_with_pages(id).await?;
    Ok(Json(serde_json::json!({ "project": project })))
}

/// Create an empty project.
///
/// # Returns
/// - 201 Created with `{project}`
pub async fn create_project(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let project = state.projects.create().await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "project": project })),
    ))
}

/// Update the project fields present in the body.
///
/// # Returns
/// - 200 OK with `{"good": "good"}`
/// - 400 Bad Request for a missing `_id` or malformed `pages`
/// - 404 Not Found when the project does not exist
pub async fn update_project(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id(body.get("_id"), "_id")?;
    metadata_service(&state).update_project(id, &body).await?;
    Ok(Json(serde_json::json!({ "good": "good" })))
}

/// Delete a project. Pages are untouched.
pub async fn delete_project(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ProjectIdRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = require_id(request.id.as_ref(), "_id")?;
    if !state.projects.delete(id).await? {
        return Err(Error::ProjectNotFound(id).into());
    }

    info!(subsystem = "api", op = "delete_project", project_id = %id, "Deleted project");
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Merge passages and notes for one page of a project.
pub async fn update_project_page_metadata(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdateProjectPageMetadataRequest>,
) -> Result<Json<Value>, ApiError> {
    let project_id = require_id(request.project_id.as_ref(), "project_id")?;
    let page_id = require_id(request.page_id.as_ref(), "page_id")?;

    let success = metadata_service(&state)
        .update_page_annotation(project_id, page_id, &request.metadata)
        .await?;

    let message = if success {
        "Project page metadata updated"
    } else {
        "No project page metadata updated"
    };
    Ok(Json(serde_json::json!({
        "success": success,
        "message": message,
    })))
}

/// Export a project as CSV text.
///
/// # Returns
/// - 200 OK with `{success, csv_data, filename}`
/// - 404 Not Found when the project does not exist
pub async fn export_csv(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ExportRequest>,
) -> Result<Json<Value>, ApiError> {
    let project_id = require_id(request.project_id.as_ref(), "project_id")?;
    let export = ExportService::new(state.pages.clone(), state.projects.clone())
        .export_project(project_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "csv_data": export.to_csv(),
        "filename": export.filename(),
    })))
}

/// Passages other projects highlighted on a page.
pub async fn passages_in_other_projects(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PassageLookupRequest>,
) -> Result<Json<Value>, ApiError> {
    let page_id = require_id(request.page_id.as_ref(), "page_id")?;
    let current = optional_id(request.current_project_id.as_ref(), "current_project_id")?;

    let projects = PassageLookupService::new(state.projects.clone())
        .passages_elsewhere(page_id, current)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "projects": projects,
    })))
}
