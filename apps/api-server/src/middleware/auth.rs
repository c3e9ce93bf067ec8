//! Bearer token extractors.

use std::future::{Ready, ready};

use actix_web::{
    FromRequest, HttpRequest,
    dev::Payload,
    http::header::{self, HeaderValue},
    web,
};
use uuid::Uuid;

use quill_core::ports::{AuthError, TokenClaims, TokenService};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated caller.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub sub: String,
    pub email: String,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

impl Identity {
    /// The subject as a user id. Tokens whose subject is not a UUID cannot
    /// own rows.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::from(AuthError::InvalidToken(self.sub.clone())))
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            sub: claims.sub,
            email: claims.email,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// Run the gate against one `Authorization` header value.
///
/// `now` is epoch seconds; a token expires when `exp < now`.
pub fn authenticate(
    header: Option<&HeaderValue>,
    tokens: &dyn TokenService,
    now: i64,
) -> Result<Identity, AuthError> {
    let token = header
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingAuth)?;

    let claims = tokens.validate_token(token)?;
    if claims.is_expired_at(now) {
        return Err(AuthError::TokenExpired);
    }

    Ok(Identity::from(claims))
}

fn identify(req: &HttpRequest) -> Result<Identity, AppError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AppError::Internal("Server configuration error".to_string()));
    };

    let now = chrono::Utc::now().timestamp();
    authenticate(
        req.headers().get(header::AUTHORIZATION),
        state.tokens.as_ref(),
        now,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Authentication failed");
        AppError::from(e)
    })
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identify(req))
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(identify(req).ok())))
    }
}
