//! Shared-secret check applied to every route.

use crate::error::ApiError;
use crate::routes::AppState;
use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct ApiKeyQuery {
    api_key: Option<String>,
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let mut diff: u8 = if a.len() == b.len() { 0 } else { 1 };
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// A non-empty header wins over the `api_key` query parameter.
fn provided_key(req: &Request) -> Option<String> {
    let header = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.is_empty())
        .map(str::to_string);

    header.or_else(|| {
        Query::<ApiKeyQuery>::try_from_uri(req.uri())
            .ok()
            .and_then(|Query(q)| q.api_key)
            .filter(|k| !k.is_empty())
    })
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match provided_key(&req) {
        Some(key) if constant_time_eq(&key, &state.api_key) => Ok(next.run(req).await),
        Some(_) => {
            log::warn!("Rejected request to {}: invalid API key", req.uri().path());
            Err(ApiError::Unauthorized)
        }
        None => {
            log::warn!("Rejected request to {}: missing API key", req.uri().path());
            Err(ApiError::Unauthorized)
        }
    }
}
