//! Authentication handlers.

use actix_web::{HttpResponse, web};

use quill_core::ports::AuthError;
use quill_shared::ApiResponse;
use quill_shared::dto::{AuthResponse, IdentityResponse, LoginRequest};

use crate::middleware::{AppResult, Identity, ValidatedJson};
use crate::state::AppState;

/// POST /auth/login
///
/// Credentials are compared as stored. Unknown email, wrong password and
/// inactive accounts all get the same 401.
pub async fn login(
    state: web::Data<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .filter(|user| user.is_active && user.password == req.password)
        .ok_or(AuthError::InvalidCredentials)?;

    let token = state.tokens.generate_token(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "Token issued");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })))
}

/// GET /auth/me - Protected route
pub async fn me(identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(IdentityResponse {
        id: identity.sub,
        email: identity.email,
        issued_at: identity.issued_at,
        expires_at: identity.expires_at,
    })))
}
