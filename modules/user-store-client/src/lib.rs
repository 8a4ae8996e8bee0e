//! HTTP client for the standalone user-store-service.
//!
//! Mirrors every route. POST routes send urlencoded form bodies, GET and
//! DELETE routes send query strings, and every request carries `X-API-Key`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use user_store_types::*;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_API_KEY: &str = "devkey";
const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug)]
pub enum ClientError {
    /// `disconnect()` was called on this client.
    Disconnected,
    /// The service answered with a non-success status.
    Api { status: u16, message: String },
    Transport(String),
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Disconnected => write!(f, "Client is disconnected"),
            ClientError::Api { status, message } => write!(f, "[HTTP {}] {}", status, message),
            ClientError::Transport(e) => write!(f, "User store service unavailable: {}", e),
            ClientError::Decode(e) => write!(f, "Invalid response from user store service: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

pub type ClientResult<T> = Result<T, ClientError>;

pub struct UserStoreClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    stopped: AtomicBool,
}

impl UserStoreClient {
    /// `api_key` falls back to `USER_STORE_API_KEY`, `PORTOEDU_API_KEY`, then `devkey`.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(str::to_string)
            .or_else(|| env_key(|k| std::env::var(k).ok()))
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn default_local() -> Self {
        Self::new(DEFAULT_BASE_URL, None)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every later call fails with [`ClientError::Disconnected`].
    pub fn disconnect(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_disconnected(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        let no_params: [(&str, &str); 0] = [];
        self.get("/health", &no_params).await
    }

    pub async fn create_user(
        &self,
        name: &str,
        id: impl ToString,
        directory: Option<&str>,
    ) -> ClientResult<UserWriteResponse> {
        let req = CreateUserRequest {
            name: name.to_string(),
            id: id.to_string(),
            directory: directory.map(str::to_string),
        };
        self.post_form("/create_user", &req).await
    }

    pub async fn add_user_data(
        &self,
        column_name: &str,
        data: impl ToString,
        name: &str,
        id: impl ToString,
        directory: Option<&str>,
    ) -> ClientResult<UserWriteResponse> {
        let req = AddUserDataRequest {
            column_name: column_name.to_string(),
            data: data.to_string(),
            name: name.to_string(),
            id: id.to_string(),
            directory: directory.map(str::to_string),
        };
        self.post_form("/add_user_data", &req).await
    }

    pub async fn get_user(
        &self,
        name: &str,
        id: impl ToString,
        directory: Option<&str>,
    ) -> ClientResult<UserRecord> {
        let req = UserLookupRequest {
            name: name.to_string(),
            id: id.to_string(),
            directory: directory.map(str::to_string),
        };
        self.get("/get_user", &req).await
    }

    pub async fn delete_user(
        &self,
        name: &str,
        id: impl ToString,
        rm_context: bool,
        directory: Option<&str>,
    ) -> ClientResult<UserDeletedResponse> {
        let req = DeleteUserRequest {
            name: name.to_string(),
            id: id.to_string(),
            rm_context: Some(rm_context.to_string()),
            directory: directory.map(str::to_string),
        };
        self.delete("/delete_user", &req).await
    }

    pub async fn add_user_context(
        &self,
        context: &str,
        user: &str,
        id: impl ToString,
        directory: Option<&str>,
    ) -> ClientResult<ContextFileResponse> {
        let req = AddUserContextRequest {
            context: context.to_string(),
            user: user.to_string(),
            id: id.to_string(),
            directory: directory.map(str::to_string),
        };
        self.post_form("/add_user_context", &req).await
    }

    pub async fn clear_user_context(
        &self,
        name: &str,
        id: impl ToString,
        directory: Option<&str>,
    ) -> ClientResult<ContextFileResponse> {
        let req = UserLookupRequest {
            name: name.to_string(),
            id: id.to_string(),
            directory: directory.map(str::to_string),
        };
        self.post_form("/clear_user_context", &req).await
    }

    /// `name` wins over its `user` alias; with neither, the service reads an unnamed log.
    pub async fn get_user_context(
        &self,
        name: Option<&str>,
        user: Option<&str>,
        id: impl ToString,
        directory: Option<&str>,
    ) -> ClientResult<UserContextResponse> {
        let req = GetUserContextRequest {
            name: name.map(str::to_string),
            user: user.map(str::to_string),
            id: id.to_string(),
            directory: directory.map(str::to_string),
        };
        self.get("/get_user_context", &req).await
    }

    fn check(&self) -> ClientResult<()> {
        if self.is_disconnected() {
            return Err(ClientError::Disconnected);
        }
        Ok(())
    }

    async fn get<Q: Serialize, T: DeserializeOwned>(&self, path: &str, query: &Q) -> ClientResult<T> {
        self.check()?;
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        decode(resp).await
    }

    async fn delete<Q: Serialize, T: DeserializeOwned>(&self, path: &str, query: &Q) -> ClientResult<T> {
        self.check()?;
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .delete(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        decode(resp).await
    }

    async fn post_form<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.check()?;
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .form(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        decode(resp).await
    }
}

/// First non-empty API key among the supported environment names.
fn env_key<F: Fn(&str) -> Option<String>>(lookup: F) -> Option<String> {
    ["USER_STORE_API_KEY", "PORTOEDU_API_KEY"]
        .into_iter()
        .find_map(|k| lookup(k).filter(|v| !v.is_empty()))
}

/// Decode a success body as `T`; otherwise pull the message out of the
/// `error` or `detail` field.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> ClientResult<T> {
    let status = resp.status();
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    if status.is_success() {
        return serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()));
    }

    let message = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|body| {
            body.get("error")
                .or_else(|| body.get("detail"))
                .map(|m| match m.as_str() {
                    Some(s) => s.to_string(),
                    None => m.to_string(),
                })
        })
        .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
    log::debug!("User store returned {}: {}", status, message);

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
