//! # HTTP API
//!
//! ```text
//! /functions/v1/generate-debate   POST  debate entry point (initial or reply)
//! /api/v1/debate                  POST  same handler
//! /api/v1/ideas                   GET, POST
//! /api/v1/ideas/:id               GET
//! /api/v1/ideas/:id/debate        POST  regenerate the three viewpoints
//! /api/v1/ideas/:id/responses     GET, POST
//! /api/v1/ideas/:id/thread        GET
//! /api/v1/ideas/:id/events        GET   (SSE)
//! /api/v1/openapi.json            GET
//! /health                         GET
//! ```

pub mod debate;
pub mod docs;
pub mod error;
pub mod ideas;

#[cfg(test)]
pub(crate) mod testing;

use agora_core::debate::DebateService;
use agora_core::state::DebateDb;
use axum::{
    extract::State,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

pub use error::{ApiError, ApiResult};

/// Application state
pub struct AppState {
    pub db: DebateDb,
    pub debate: DebateService,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the debate service to the same database the API reads from
    pub fn new(db: DebateDb, debate: DebateService) -> SharedState {
        Arc::new(Self { db, debate })
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub generation_configured: bool,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        generation_configured: state.debate.is_configured(),
    })
}

/// Browser callers send these on every request
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/functions/v1/generate-debate", post(debate::generate_debate))
        .route("/api/v1/debate", post(debate::generate_debate))
        .nest("/api/v1/ideas", ideas::idea_routes())
        .route("/api/v1/openapi.json", get(docs::serve_openapi))
        .route("/health", get(health))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
