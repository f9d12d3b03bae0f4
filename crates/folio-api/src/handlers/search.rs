//! Page search, lookup by id list, and the year index.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use super::JsonBody;
use crate::{ApiError, AppState};
use folio_core::{collect_years, order_pages, PageSearchRequest, YearSummary};

#[derive(Debug, Deserialize)]
pub struct ResultsRequest {
    #[serde(default)]
    pub page_ids: Option<Value>,
}

/// Search pages by volume, page number, date, topic, keyword and year.
pub async fn search(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PageSearchRequest>,
) -> Result<Json<Value>, ApiError> {
    let results = state
        .pages
        .search(&request, state.search_result_limit)
        .await?;
    Ok(Json(serde_json::json!({ "results": results })))
}

/// Fetch pages by id, returned in the order requested.
///
/// # Returns
/// - 200 OK with `{results}`; unknown ids are omitted
/// - 400 Bad Request when the list is missing, empty or holds a non-uuid
pub async fn results(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ResultsRequest>,
) -> Result<Json<Value>, ApiError> {
    let raw = match &request.page_ids {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(ApiError::BadRequest("No page IDs provided".to_string())),
    };

    let ids = raw
        .iter()
        .map(|item| super::require_id(Some(item), "page id"))
        .collect::<Result<Vec<_>, _>>()?;

    let pages = state.pages.get_many(&ids).await?;
    Ok(Json(serde_json::json!({
        "results": order_pages(&ids, pages),
    })))
}

/// Distinct years (and multi-year ranges) mentioned in page dates.
pub async fn years(State(state): State<AppState>) -> Result<Json<YearSummary>, ApiError> {
    let dates = state.pages.list_dates().await?;
    Ok(Json(collect_years(dates.iter().map(String::as_str))))
}
