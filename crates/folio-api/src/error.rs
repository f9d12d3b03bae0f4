//! API error type and its JSON mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    Database(folio_core::Error),
    NotFound(String),
    BadRequest(String),
}

impl From<folio_core::Error> for ApiError {
    fn from(err: folio_core::Error) -> Self {
        match &err {
            folio_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
