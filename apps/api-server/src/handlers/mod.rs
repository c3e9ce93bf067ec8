//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod health;
mod posts;
mod users;

use actix_web::{HttpRequest, HttpResponse, web};
use quill_shared::ErrorBody;
use uuid::Uuid;

use crate::middleware::AppError;

/// Path ids that are not UUIDs cannot match a row.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// JSON syntax errors become 400 `Invalid JSON` before a handler runs.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::bad_request("Invalid JSON", err.to_string()).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::bad_request("Invalid path", err.to_string()).into())
}

/// Fallback for unmatched paths and methods.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorBody::new("Not Found")
            .with_message(format!("The requested path {} was not found", req.path()))
            .with_method(req.method().as_str()),
    )
}

fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/health")
            .route(web::get().to(health::health_check))
            .default_service(web::to(not_found)),
    );
}

fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(health::welcome))
            .default_service(web::to(not_found)),
    )
    .configure(health_routes)
    .service(
        web::scope("/users")
            .service(
                web::resource("")
                    .route(web::get().to(users::list_users))
                    .route(web::post().to(users::create_user))
                    .default_service(web::to(not_found)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(users::get_user))
                    .route(web::put().to(users::update_user))
                    .route(web::delete().to(users::delete_user))
                    .default_service(web::to(not_found)),
            ),
    )
    .service(
        web::scope("/posts")
            .service(
                web::resource("")
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post))
                    .default_service(web::to(not_found)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(posts::get_post))
                    .route(web::put().to(posts::update_post))
                    .route(web::delete().to(posts::delete_post))
                    .default_service(web::to(not_found)),
            ),
    )
    .service(
        web::scope("/categories")
            .service(
                web::resource("")
                    .route(web::get().to(categories::list_categories))
                    .route(web::post().to(categories::create_category))
                    .default_service(web::to(not_found)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(categories::get_category))
                    .route(web::put().to(categories::update_category))
                    .route(web::delete().to(categories::delete_category))
                    .default_service(web::to(not_found)),
            ),
    )
    .service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .route(web::post().to(auth::login))
                    .default_service(web::to(not_found)),
            )
            .service(
                web::resource("/me")
                    .route(web::get().to(auth::me))
                    .default_service(web::to(not_found)),
            ),
    );
}

/// Configure all application routes.
///
/// Health and welcome answer both at the root and under `/api/v1`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(health::welcome))
            .default_service(web::to(not_found)),
    )
    .configure(health_routes)
    .service(web::scope("/api/v1").configure(api_routes));
}
