//! Request parameter extraction.
//!
//! Parameters come from the query string; POST and DELETE requests may also
//! carry them as a urlencoded form body. Query values win on conflict.

use crate::error::ApiError;
use axum::extract::{FromRequest, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

const TRUTHY: [&str; 6] = ["1", "true", "t", "yes", "y", "on"];
const FALSY: [&str; 6] = ["0", "false", "f", "no", "n", "off"];

/// Merged query + form parameters decoded into `T`.
pub struct Params<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[axum::async_trait]
impl<S, T> FromRequest<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut fields: HashMap<String, String> =
            Query::<HashMap<String, String>>::try_from_uri(req.uri())
                .map(|Query(q)| q)
                .map_err(|e| ApiError::InvalidParams(e.body_text()))?;

        if is_form(&req) {
            let Form(body) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::InvalidParams(e.body_text()))?;
            for (key, value) in body {
                fields.entry(key).or_insert(value);
            }
        }

        let value = serde_json::to_value(fields)
            .map_err(|e| ApiError::InvalidParams(e.to_string()))?;
        serde_json::from_value(value)
            .map(Params)
            .map_err(|e| ApiError::InvalidParams(format!("invalid parameters: {}", e)))
    }
}

/// Parse a bool-like flag. Unknown or absent values are `false`.
pub fn parse_bool_flag(raw: Option<&str>) -> bool {
    let Some(raw) = raw else {
        return false;
    };
    let value = raw.trim().to_lowercase();
    if TRUTHY.contains(&value.as_str()) {
        true
    } else if FALSY.contains(&value.as_str()) {
        false
    } else {
        log::debug!("Unrecognised flag value '{}', treating as false", raw);
        false
    }
}
