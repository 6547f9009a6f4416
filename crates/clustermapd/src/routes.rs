//! Router and request handlers

use axum::extract::State;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clustermap_core::PresenceEngine;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ApiError;

/// Occupancy report route, relative to the base path
pub const ACTIVE_PATH: &str = "/api/active";

/// Image proxy route, relative to the base path
pub const IMAGES_PATH: &str = "/api/images";

/// Health route, relative to the base path
pub const HEALTH_PATH: &str = "/api/health";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PresenceEngine>,
}

impl AppState {
    pub fn new(engine: PresenceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Build the service router.
///
/// Routes answer GET, HEAD and POST; any other method gets `405` from the
/// method router before a handler runs. `base_path` is either empty or a
/// prefix like `/clustermap`.
pub fn create_router(state: AppState, base_path: &str) -> Router {
    let api = Router::new()
        .route(ACTIVE_PATH, get(active).post(active))
        .route(IMAGES_PATH, get(images).post(images))
        .route(HEALTH_PATH, get(health))
        .with_state(state);

    let app = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(base_path, api)
    };

    app.layer(cors_layer()).layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::POST])
}

async fn active(State(state): State<AppState>) -> Result<Response, ApiError> {
    let occupancy = state.engine.snapshot().await?;
    Ok(Json(occupancy.as_slice()).into_response())
}

async fn images() -> ApiError {
    ApiError::NotImplemented
}

async fn health(State(state): State<AppState>) -> Response {
    Json(state.engine.health().await).into_response()
}
