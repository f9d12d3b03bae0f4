//! folio-api - HTTP API for the folio page archive.
//!
//! The router is built here so integration tests can drive it with
//! `tower::ServiceExt::oneshot` against any repository implementation.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use folio_core::{defaults, logging, PageRepository, ProjectRepository};
use folio_db::Database;

pub use config::ServerConfig;
pub use error::ApiError;

// =============================================================================
// STATE
// =============================================================================

/// Shared handler state: the two stores plus request limits.
#[derive(Clone)]
pub struct AppState {
    pub pages: Arc<dyn PageRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub search_result_limit: i64,
}

impl AppState {
    pub fn new(pages: Arc<dyn PageRepository>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self {
            pages,
            projects,
            search_result_limit: defaults::SEARCH_RESULT_LIMIT,
        }
    }

    /// State backed by the PostgreSQL repositories.
    pub fn from_database(db: &Database) -> Self {
        Self::new(Arc::new(db.pages.clone()), Arc::new(db.projects.clone()))
    }

    pub fn with_search_result_limit(mut self, limit: i64) -> Self {
        self.search_result_limit = limit;
        self
    }
}

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router with middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id_header = HeaderName::from_static(logging::REQUEST_ID_HEADER);

    let api = Router::new()
        .route("/test", get(test_route))
        .route("/test-post", post(test_post))
        .route("/years", get(handlers::search::years))
        .route("/search", post(handlers::search::search))
        .route("/results", post(handlers::search::results))
        .route("/page/get", post(handlers::pages::get_page))
        .route("/page/adjacent", post(handlers::pages::adjacent_page))
        .route(
            "/page/metadata/update",
            post(handlers::pages::update_page_metadata),
        )
        .route(
            "/page/passages/all-projects",
            post(handlers::projects::passages_in_other_projects),
        )
        .route("/projects", get(handlers::projects::list_projects))
        .route("/project", post(handlers::projects::get_project))
        .route("/project/create", post(handlers::projects::create_project))
        .route("/project/update", post(handlers::projects::update_project))
        .route("/project/delete", post(handlers::projects::delete_project))
        .route(
            "/project/page/metadata/update",
            post(handlers::projects::update_project_page_metadata),
        )
        .route("/project/export/csv", post(handlers::projects::export_csv));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .expose_headers([header::CONTENT_TYPE, HeaderName::from_static("x-total-count")])
                .allow_credentials(true),
        )
        .layer(RequestBodyLimitLayer::new(defaults::BODY_LIMIT_BYTES))
        .with_state(state)
}

/// Health check.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness probe for the frontend.
async fn test_route() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "APE TOGETHER STRONG" }))
}

/// Echo a JSON body back, for checking client wiring.
async fn test_post(
    handlers::JsonBody(body): handlers::JsonBody<serde_json::Value>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "received": body }))
}
