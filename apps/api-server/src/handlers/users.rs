//! User handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::{NewUser, User, UserChanges};
use quill_shared::ApiResponse;
use quill_shared::dto::{CreateUserRequest, UpdateUserRequest};

use super::parse_id;
use crate::middleware::{AppError, AppResult, Identity, ValidatedJson};
use crate::state::AppState;

/// GET /users
pub async fn list_users(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let users = state.users.find_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(users)))
}

/// GET /users/{id}
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let Some(id) = parse_id(&path) else {
        return Err(AppError::not_found("User"));
    };

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}

/// POST /users
pub async fn create_user(
    state: web::Data<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let user = User::new(NewUser {
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
    });
    let created = state.users.create(user).await?;
    tracing::info!(user_id = %created.id, "User created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(created)))
}

/// PUT /users/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let Some(id) = parse_id(&path) else {
        return Err(AppError::not_found("User"));
    };

    let changes = UserChanges {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        is_active: req.is_active,
    };
    let updated = state
        .users
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let deleted = match parse_id(&path) {
        Some(id) => state.users.delete(id).await?,
        None => false,
    };
    if !deleted {
        return Err(AppError::not_found("User"));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted successfully")))
}
