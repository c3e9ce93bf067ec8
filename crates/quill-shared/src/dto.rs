//! Data Transfer Objects - request/response types for the API.
//!
//! Required fields deserialize to empty values when absent so that a missing
//! field is reported by validation alongside every other field problem.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Every entry must be a UUID.
fn validate_uuid_list(ids: &[String]) -> Result<(), ValidationError> {
    if ids.iter().all(|id| Uuid::parse_str(id).is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new("uuid").with_message("Every category id must be a UUID".into()))
    }
}

/// Parse ids that already passed [`validate_uuid_list`], dropping repeats.
pub fn parse_uuids(ids: &[String]) -> Vec<Uuid> {
    let mut parsed: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids.iter().filter_map(|id| Uuid::parse_str(id).ok()) {
        if !parsed.contains(&id) {
            parsed.push(id);
        }
    }
    parsed
}

/// POST /users
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,
}

/// PUT /users/{id}
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,

    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    pub is_active: Option<bool>,
}

/// POST /posts
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub content: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub slug: String,

    #[serde(default)]
    pub published: bool,

    #[validate(custom(function = "validate_uuid_list"))]
    pub category_ids: Option<Vec<String>>,
}

/// PUT /posts/{id}
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub content: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,

    pub published: Option<bool>,

    #[validate(custom(function = "validate_uuid_list"))]
    pub category_ids: Option<Vec<String>>,
}

/// POST /categories
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub description: Option<String>,
}

/// PUT /categories/{id}
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    pub description: Option<String>,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response containing an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// GET /auth/me
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: String,
    pub email: String,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}
