//! CSV-backed user record store with per-user context logs, served over HTTP.

pub mod auth;
pub mod config;
pub mod contexts;
pub mod error;
pub mod params;
pub mod routes;
pub mod service;
pub mod storage;
pub mod users_csv;

use axum::routing::{delete, get, post};
use axum::Router;
use routes::AppState;
use std::sync::Arc;

/// All routes, guarded by the API key middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = tower_http::cors::CorsLayer::permissive();

    Router::new()
        .route("/health", get(routes::health))
        .route("/create_user", post(routes::create_user))
        .route("/add_user_data", post(routes::add_user_data))
        .route("/get_user", get(routes::get_user))
        .route("/delete_user", delete(routes::delete_user))
        .route("/add_user_context", post(routes::add_user_context))
        .route("/clear_user_context", post(routes::clear_user_context))
        .route("/get_user_context", get(routes::get_user_context))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .with_state(state)
        .layer(cors)
}
