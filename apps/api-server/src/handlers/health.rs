//! Health check and welcome endpoints.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::middleware::OptionalIdentity;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub environment: &'static str,
}

/// GET /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: state.config.environment.as_str(),
    };

    HttpResponse::Ok().json(response)
}

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// GET / - greets the caller by email when a valid token is sent.
pub async fn welcome(identity: OptionalIdentity) -> HttpResponse {
    let message = match identity.0 {
        Some(identity) => format!("Welcome to the Quill API, {}", identity.email),
        None => "Welcome to the Quill API".to_string(),
    };

    HttpResponse::Ok().json(WelcomeResponse { message })
}
