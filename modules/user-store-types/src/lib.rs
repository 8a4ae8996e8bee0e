//! Shared types for the user store service and its HTTP clients.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =====================================================
// Domain Types
// =====================================================

pub const NAME_COLUMN: &str = "name";
pub const ID_COLUMN: &str = "id";

/// One row of the user table. Keys follow the table's column order,
/// with `name` and `id` first.
pub type UserRecord = IndexMap<String, String>;

/// Build a record holding only `name` and `id`, with every other column blank.
pub fn blank_record(columns: &[String], name: &str, id: &str) -> UserRecord {
    let mut record: UserRecord = columns
        .iter()
        .map(|c| (c.clone(), String::new()))
        .collect();
    record.insert(NAME_COLUMN.to_string(), name.to_string());
    record.insert(ID_COLUMN.to_string(), id.to_string());
    record
}

// =====================================================
// Request Parameters
// =====================================================
//
// Every route reads these from the query string (and form body for
// POST/DELETE). All values travel as strings.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUserDataRequest {
    pub column_name: String,
    pub data: String,
    pub name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Used by `/get_user` and `/clear_user_context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLookupRequest {
    pub name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    pub name: String,
    pub id: String,
    /// Bool-like string: `1/true/t/yes/y/on` enable context removal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rm_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUserContextRequest {
    pub context: String,
    pub user: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserContextRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl GetUserContextRequest {
    /// `name` wins over the `user` alias; empty values count as absent.
    pub fn resolved_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.user.as_deref().filter(|u| !u.is_empty()))
    }
}

// =====================================================
// Response Types
// =====================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Body of `/create_user` (`status = "created"`) and `/add_user_data`
/// (`status = "updated"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWriteResponse {
    pub status: String,
    pub user: UserRecord,
}

impl UserWriteResponse {
    pub fn created(user: UserRecord) -> Self {
        Self {
            status: "created".to_string(),
            user,
        }
    }

    pub fn updated(user: UserRecord) -> Self {
        Self {
            status: "updated".to_string(),
            user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDeletedResponse {
    pub status: String,
    pub name: String,
    pub id: String,
    pub rm_context: bool,
}

/// Body of `/add_user_context` (`"appended"`) and `/clear_user_context` (`"cleared"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFileResponse {
    pub status: String,
    pub file: String,
}

impl ContextFileResponse {
    pub fn appended(file: impl Into<String>) -> Self {
        Self {
            status: "appended".to_string(),
            file: file.into(),
        }
    }

    pub fn cleared(file: impl Into<String>) -> Self {
        Self {
            status: "cleared".to_string(),
            file: file.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContextResponse {
    pub name: String,
    pub id: String,
    pub context: Vec<String>,
}

/// Body of 404 and 500 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of 401 and 422 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailBody {
    pub detail: String,
}
