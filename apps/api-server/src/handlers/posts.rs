//! Post handlers.
//!
//! Writes go through the repository as one unit: the post row and its
//! category links land (or fail) together.

use actix_web::{HttpResponse, web};

use quill_core::domain::{NewPost, Post, PostChanges};
use quill_shared::ApiResponse;
use quill_shared::dto::{CreatePostRequest, UpdatePostRequest, parse_uuids};

use super::parse_id;
use crate::middleware::{AppError, AppResult, Identity, ValidatedJson};
use crate::state::AppState;

/// GET /posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.find_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let Some(id) = parse_id(&path) else {
        return Err(AppError::not_found("Post"));
    };

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// POST /posts - the caller becomes the author.
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let author_id = identity.user_id()?;

    let category_ids = req
        .category_ids
        .as_deref()
        .map(parse_uuids)
        .unwrap_or_default();
    let post = Post::new(
        author_id,
        NewPost {
            title: req.title,
            content: req.content,
            slug: req.slug,
            published: req.published,
        },
    );

    let created = state.posts.create(post, category_ids).await?;
    tracing::info!(
        post_id = %created.post.id,
        categories = created.categories.len(),
        "Post created"
    );

    Ok(HttpResponse::Created().json(ApiResponse::ok(created)))
}

/// PUT /posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let Some(id) = parse_id(&path) else {
        return Err(AppError::not_found("Post"));
    };

    let changes = PostChanges {
        category_ids: req.category_ids.as_deref().map(parse_uuids),
        title: req.title,
        content: req.content,
        slug: req.slug,
        published: req.published,
    };
    let updated = state
        .posts
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated)))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let deleted = match parse_id(&path) {
        Some(id) => state.posts.delete(id).await?,
        None => false,
    };
    if !deleted {
        return Err(AppError::not_found("Post"));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted successfully")))
}
