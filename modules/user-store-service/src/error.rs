//! Error types for the store layer and the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::fmt;
use user_store_types::{DetailBody, ErrorBody};

pub const UNAUTHORIZED_DETAIL: &str = "unauthorized: provide X-API-Key header";

#[derive(Debug)]
pub enum StoreError {
    /// `users.csv` does not exist in the storage directory.
    UsersFileMissing,
    UserNotFound,
    Io(std::io::Error),
    Csv(csv::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UsersFileMissing => write!(f, "users.csv not found"),
            StoreError::UserNotFound => write!(f, "user not found"),
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced to HTTP callers.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound(String),
    InvalidParams(String),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "{}", UNAUTHORIZED_DETAIL),
            ApiError::NotFound(msg) | ApiError::InvalidParams(msg) | ApiError::Internal(msg) => {
                write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UsersFileMissing | StoreError::UserNotFound => {
                ApiError::NotFound(e.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(DetailBody {
                    detail: UNAUTHORIZED_DETAIL.to_string(),
                }),
            )
                .into_response(),
            ApiError::NotFound(error) => {
                (StatusCode::NOT_FOUND, Json(ErrorBody { error })).into_response()
            }
            ApiError::InvalidParams(detail) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(DetailBody { detail })).into_response()
            }
            ApiError::Internal(error) => {
                log::error!("Request failed: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error })).into_response()
            }
        }
    }
}
