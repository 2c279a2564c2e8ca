use crate::crowd::CrowdEstimator;
use crate::crowd::clock::Clock;
use crate::recommend::RecommendationEngine;
use crate::spot::Coordinate;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

/// Everything the handlers need, injected at startup.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub state: Arc<RwLock<AppState>>,
    pub estimator: CrowdEstimator,
    pub engine: RecommendationEngine,
    pub clock: Arc<dyn Clock>,
    pub default_origin: Coordinate,
}

pub fn router(context: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/spots", get(handlers::get_spots))
        .route("/api/crowd", get(handlers::get_crowd))
        .route("/api/crowd/refresh", post(handlers::refresh_crowd))
        .route("/api/recommendations", post(handlers::post_recommendations))
        .with_state(context)
}
