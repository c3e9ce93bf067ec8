//! Authentication ports.

use uuid::Uuid;

/// Claims carried by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// True when `exp` is present and strictly before `now` (epoch seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp < now)
    }
}

/// Token service trait for JWT operations.
pub trait TokenService: Send + Sync {
    /// Issue an access token for a user.
    fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError>;

    /// Verify the signature and decode the claims.
    ///
    /// Expiry is not enforced here; callers check [`TokenClaims::is_expired_at`].
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens, in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing or invalid authorization header")]
    MissingAuth,

    #[error("Token signing failed: {0}")]
    Signing(String),
}
