//! Repository-level error types.

use thiserror::Error;

/// PostgreSQL SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Repository-level errors.
///
/// Store failures that carry a vendor code keep it in [`RepoError::Database`]
/// so the HTTP layer can classify constraint violations without inspecting
/// driver types.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Database error {code}: {message}")]
    Database { code: String, message: String },
}

impl RepoError {
    pub fn unique_violation(message: impl Into<String>) -> Self {
        Self::Database {
            code: UNIQUE_VIOLATION.to_string(),
            message: message.into(),
        }
    }

    pub fn foreign_key_violation(message: impl Into<String>) -> Self {
        Self::Database {
            code: FOREIGN_KEY_VIOLATION.to_string(),
            message: message.into(),
        }
    }

    /// Vendor error code, if the store reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Database { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_constructors_carry_codes() {
        assert_eq!(
            RepoError::unique_violation("email").code(),
            Some(UNIQUE_VIOLATION)
        );
        assert_eq!(
            RepoError::foreign_key_violation("author_id").code(),
            Some(FOREIGN_KEY_VIOLATION)
        );
        assert_eq!(RepoError::Query("boom".to_string()).code(), None);
    }
}
