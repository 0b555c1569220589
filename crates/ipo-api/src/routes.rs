//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::auth::{login, register};
use crate::handlers::health::health;
use crate::handlers::history::get_history;
use crate::handlers::predict::{explain, predict};
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login));

    // Bearer-token protected routes
    let model_routes = Router::new()
        .route("/predict", post(predict))
        .route("/explain", post(explain))
        .route("/history", get(get_history));

    let health_routes = Router::new().route("/health", get(health));

    Router::new()
        .merge(auth_routes)
        .merge(model_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
