//! Axum route handlers for the user store API.

use crate::error::ApiError;
use crate::params::{parse_bool_flag, Params};
use crate::service::UserStore;
use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;
use user_store_types::*;

pub struct AppState {
    pub store: UserStore,
    pub api_key: String,
}

// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

// POST /create_user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Params(req): Params<CreateUserRequest>,
) -> Result<Json<UserWriteResponse>, ApiError> {
    let resp = state
        .store
        .create_user(&req.name, &req.id, req.directory.as_deref())?;
    Ok(Json(resp))
}

// POST /add_user_data
pub async fn add_user_data(
    State(state): State<Arc<AppState>>,
    Params(req): Params<AddUserDataRequest>,
) -> Result<Json<UserWriteResponse>, ApiError> {
    let resp = state.store.add_user_data(
        &req.column_name,
        &req.data,
        &req.name,
        &req.id,
        req.directory.as_deref(),
    )?;
    Ok(Json(resp))
}

// GET /get_user
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Params(req): Params<UserLookupRequest>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = state
        .store
        .get_user(&req.name, &req.id, req.directory.as_deref())?;
    Ok(Json(user))
}

// DELETE /delete_user
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Params(req): Params<DeleteUserRequest>,
) -> Result<Json<UserDeletedResponse>, ApiError> {
    let rm_context = parse_bool_flag(req.rm_context.as_deref());
    let resp = state.store.delete_user(
        &req.name,
        &req.id,
        rm_context,
        req.directory.as_deref(),
    )?;
    Ok(Json(resp))
}

// POST /add_user_context
pub async fn add_user_context(
    State(state): State<Arc<AppState>>,
    Params(req): Params<AddUserContextRequest>,
) -> Result<Json<ContextFileResponse>, ApiError> {
    let resp = state.store.add_user_context(
        &req.context,
        &req.user,
        &req.id,
        req.directory.as_deref(),
    )?;
    Ok(Json(resp))
}

// POST /clear_user_context
pub async fn clear_user_context(
    State(state): State<Arc<AppState>>,
    Params(req): Params<UserLookupRequest>,
) -> Result<Json<ContextFileResponse>, ApiError> {
    let resp = state
        .store
        .clear_user_context(&req.name, &req.id, req.directory.as_deref())?;
    Ok(Json(resp))
}

// GET /get_user_context
pub async fn get_user_context(
    State(state): State<Arc<AppState>>,
    Params(req): Params<GetUserContextRequest>,
) -> Result<Json<UserContextResponse>, ApiError> {
    // Without a name the log resolves to `_<id>.txt`, normally absent.
    let name = req.resolved_name().unwrap_or("");
    let resp = state
        .store
        .get_user_context(name, &req.id, req.directory.as_deref())?;
    Ok(Json(resp))
}
