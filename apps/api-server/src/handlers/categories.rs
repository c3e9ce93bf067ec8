//! Category handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::{Category, CategoryChanges};
use quill_shared::ApiResponse;
use quill_shared::dto::{CreateCategoryRequest, UpdateCategoryRequest};

use super::parse_id;
use crate::middleware::{AppError, AppResult, Identity, ValidatedJson};
use crate::state::AppState;

/// GET /categories
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.categories.find_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(categories)))
}

/// GET /categories/{id}
pub async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let Some(id) = parse_id(&path) else {
        return Err(AppError::not_found("Category"));
    };

    let category = state
        .categories
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(category)))
}

/// POST /categories
pub async fn create_category(
    state: web::Data<AppState>,
    _identity: Identity,
    ValidatedJson(req): ValidatedJson<CreateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let created = state
        .categories
        .create(Category::new(req.name, req.description))
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(created)))
}

/// PUT /categories/{id}
pub async fn update_category(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let Some(id) = parse_id(&path) else {
        return Err(AppError::not_found("Category"));
    };

    let changes = CategoryChanges {
        name: req.name,
        description: req.description,
    };
    let updated = state
        .categories
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated)))
}

/// DELETE /categories/{id} - refused with 400 while posts still link to it.
pub async fn delete_category(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let deleted = match parse_id(&path) {
        Some(id) => state.categories.delete(id).await?,
        None => false,
    };
    if !deleted {
        return Err(AppError::not_found("Category"));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::message("Category deleted successfully")))
}
