//! HTTP handlers for folio-api.
//!
//! Every body id is accepted as a loose JSON value and checked here, so a
//! missing or malformed id is a 400 with a readable message. Bodies are read
//! through [`JsonBody`], which turns any unreadable body into the same
//! `{error}` 400.

pub mod pages;
pub mod projects;
pub mod search;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::ApiError;
use folio_core::parse_id;

/// JSON body extractor whose rejection is an [`ApiError::BadRequest`].
///
/// Covers a missing or wrong content type, malformed JSON, and JSON of the
/// wrong shape (e.g. a list where an object is expected).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// A required id field.
pub(crate) fn require_id(value: Option<&Value>, field: &str) -> Result<Uuid, ApiError> {
    optional_id(value, field)?.ok_or_else(|| ApiError::BadRequest(format!("Missing {}", field)))
}

/// An optional id field; null and blank strings count as absent.
pub(crate) fn optional_id(value: Option<&Value>, field: &str) -> Result<Option<Uuid>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_id(s)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid {}: {}", field, s))),
        Some(other) => Err(ApiError::BadRequest(format!(
            "Invalid {}: {}",
            field, other
        ))),
    }
}
