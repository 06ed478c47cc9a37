use axum::{middleware, routing, Router};
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers;
use crate::middleware::log_requests;
use crate::state::AppState;

const MAX_BODY_SIZE: usize = 1_000_000;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/bird", routing::post(handlers::post_bird).get(handlers::get_bird))
        .route("/metrics", routing::get(handlers::get_metrics))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .route("/_liveness", routing::get(handlers::liveness))
        .route("/_readiness", routing::get(handlers::readiness))
        .with_state(state)
}
