//! # Common API Types
//!
//! Response envelope and payload types shared by the handlers.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::models::connection_profile;
use crate::services::ProfilePage;

/// Success envelope: `{success, message, data?}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Success envelope without a `data` member
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Connection profile as returned by the API (the password is never echoed)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileInfo {
    pub id: i32,
    pub server_name: String,
    pub host: String,
    pub port: i32,
    pub database_name: String,
    pub username: String,
    /// Indicates whether a password is stored
    #[schema(example = true)]
    pub has_password: bool,
    pub is_active: bool,
    pub description: Option<String>,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
    /// RFC 3339 timestamp, present on soft-deleted profiles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

impl From<connection_profile::Model> for ProfileInfo {
    fn from(model: connection_profile::Model) -> Self {
        Self {
            id: model.id,
            server_name: model.server_name,
            host: model.host,
            port: model.port,
            database_name: model.database_name,
            username: model.username,
            has_password: !model.password.is_empty(),
            is_active: model.is_active,
            description: model.description,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
            deleted_at: model.deleted_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Page of connection profiles
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedProfiles {
    pub data: Vec<ProfileInfo>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl From<ProfilePage> for PaginatedProfiles {
    fn from(page: ProfilePage) -> Self {
        Self {
            data: page.data.into_iter().map(ProfileInfo::from).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
        }
    }
}

/// Accepts a JSON string, number, boolean or null and yields its text form.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text,
        Some(serde_json::Value::Number(number)) => number.to_string(),
        Some(serde_json::Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    })
}
