use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - represents a user in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Stored exactly as submitted. Never hashed, never written to responses.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied at signup.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
}

impl User {
    /// Create a new active user with generated ID and timestamps.
    pub fn new(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: new.email,
            password: new.password,
            first_name: new.first_name,
            last_name: new.last_name,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, changes: UserChanges) {
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(first_name) = changes.first_name {
            self.first_name = Some(first_name);
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = Some(last_name);
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}
