//! End-to-end HTTP tests against the in-memory store.

use actix_web::http::{StatusCode, header};
use actix_web::test;
use serde_json::{Value, json};
use uuid::Uuid;

use quill_core::ports::TokenService;
use quill_infra::{JwtConfig, JwtTokenService};

use crate::app::build_app;
use crate::config::AppConfig;
use crate::state::AppState;

const SECRET: &str = "http-tests-secret-with-32-characters";

fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| {
        match key {
            "DATABASE_URL" => Some("postgres://localhost/quill_test"),
            "JWT_SECRET" => Some(SECRET),
            "RUST_ENV" => Some("test"),
            _ => None,
        }
        .map(str::to_string)
    })
    .unwrap()
}

fn test_state() -> AppState {
    AppState::in_memory(test_config())
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

/// Issue a token for `user_id` signed with the test secret.
fn token_for(state: &AppState, user_id: &str, email: &str) -> String {
    state
        .tokens
        .generate_token(Uuid::parse_str(user_id).unwrap(), email)
        .unwrap()
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Create a user over HTTP and return `(id, token)`.
macro_rules! signup {
    ($app:expr, $state:expr, $email:expr) => {{
        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/v1/users")
                .set_json(json!({ "email": $email, "password": "password123" }))
        );
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();
        let token = token_for(&$state, &id, $email);
        (id, token)
    }};
}

macro_rules! create_category {
    ($app:expr, $token:expr, $name:expr) => {{
        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/v1/categories")
                .insert_header(bearer(&$token))
                .set_json(json!({ "name": $name }))
        );
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_create_user() {
    let app = test::init_service(build_app(test_state())).await;

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/api/v1/users").set_json(json!({
            "email": "test@example.com",
            "password": "password123",
            "firstName": "John",
            "lastName": "Doe"
        }))
    );

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "test@example.com");
    assert_eq!(body["data"]["firstName"], "John");
    assert_eq!(body["data"]["isActive"], true);
    assert!(body["data"].get("password").is_none());
}

#[actix_web::test]
async fn test_create_user_validation() {
    let app = test::init_service(build_app(test_state())).await;

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(json!({ "email": "invalid-email", "password": "password123" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["details"][0]["field"], "email");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(json!({ "email": "short@example.com", "password": "1234567" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["details"][0]["field"], "password");
}

#[actix_web::test]
async fn test_duplicate_email_conflicts() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    signup!(app, state, "dup@example.com");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(json!({ "email": "dup@example.com", "password": "password123" }))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Resource already exists" }));
}

#[actix_web::test]
async fn test_get_unknown_user() {
    let app = test::init_service(build_app(test_state())).await;

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/api/v1/users/non-existent-id")
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    let (status, _) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/v1/users/{}", Uuid::new_v4()))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_user_update_and_delete() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (id, token) = signup!(app, state, "edit@example.com");
    let uri = format!("/api/v1/users/{id}");

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "lastName": "Lovelace", "isActive": false }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lastName"], "Lovelace");
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["data"]["email"], "edit@example.com");

    let (status, body) = send!(
        app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "User deleted successfully" }));

    let (status, body) = send!(
        app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[actix_web::test]
async fn test_guarded_routes_require_token() {
    let app = test::init_service(build_app(test_state())).await;
    let id = Uuid::new_v4();

    let requests = [
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .set_json(json!({ "title": "t", "content": "c", "slug": "s" })),
        test::TestRequest::put()
            .uri(&format!("/api/v1/posts/{id}"))
            .set_json(json!({})),
        test::TestRequest::delete().uri(&format!("/api/v1/posts/{id}")),
        test::TestRequest::post()
            .uri("/api/v1/categories")
            .set_json(json!({ "name": "rust" })),
        test::TestRequest::delete().uri(&format!("/api/v1/categories/{id}")),
        test::TestRequest::delete().uri(&format!("/api/v1/users/{id}")),
        test::TestRequest::get().uri("/api/v1/auth/me"),
    ];

    for req in requests {
        let (status, body) = send!(app, req);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            json!({
                "error": "Unauthorized",
                "message": "Missing or invalid authorization header"
            })
        );
    }
}

#[actix_web::test]
async fn test_bad_and_expired_tokens() {
    let app = test::init_service(build_app(test_state())).await;

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .insert_header(bearer("not.a.token"))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");

    // Same secret, so the signature is valid; only the expiry is wrong.
    let stale = JwtTokenService::new(JwtConfig {
        secret: SECRET.to_string(),
        expires_in_seconds: -60,
    });
    let token = stale
        .generate_token(Uuid::new_v4(), "stale@example.com")
        .unwrap();

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");
}

#[actix_web::test]
async fn test_login_then_me() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (id, _) = signup!(app, state, "login@example.com");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "login@example.com", "password": "wrong-password" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid credentials" }));

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "login@example.com", "password": "password123" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tokenType"], "Bearer");
    assert_eq!(body["data"]["expiresIn"], 7 * 86_400);
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["email"], "login@example.com");
}

#[actix_web::test]
async fn test_post_categories_round_trip() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (author_id, token) = signup!(app, state, "author@example.com");
    let rust = create_category!(app, token, "rust");
    let web = create_category!(app, token, "web");
    let db = create_category!(app, token, "databases");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&token))
            .set_json(json!({
                "title": "Hello",
                "content": "World",
                "slug": "hello-world",
                "categoryIds": [rust, web, db]
            }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["authorId"], author_id);
    assert_eq!(body["data"]["published"], false);
    assert_eq!(body["data"]["categories"].as_array().unwrap().len(), 3);
    let post_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/posts/{post_id}");

    let (_, body) = send!(app, test::TestRequest::get().uri(&uri));
    assert_eq!(body["data"]["categories"].as_array().unwrap().len(), 3);

    let (_, body) = send!(app, test::TestRequest::get().uri("/api/v1/posts"));
    assert_eq!(body["data"][0]["categories"].as_array().unwrap().len(), 3);

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Hello again", "categoryIds": [web] }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Hello again");
    let categories = body["data"]["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["id"], web);

    let (_, body) = send!(app, test::TestRequest::get().uri(&uri));
    assert_eq!(body["data"]["categories"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["slug"], "hello-world");
}

#[actix_web::test]
async fn test_post_delete_twice() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (_, token) = signup!(app, state, "writer@example.com");

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Gone", "content": "Soon", "slug": "gone" }))
    );
    let uri = format!("/api/v1/posts/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = send!(
        app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post deleted successfully");

    let (status, body) = send!(
        app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Post not found");
}

#[actix_web::test]
async fn test_post_with_unknown_category_rolls_back() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (_, token) = signup!(app, state, "rollback@example.com");
    let real = create_category!(app, token, "real");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&token))
            .set_json(json!({
                "title": "Orphan",
                "content": "Body",
                "slug": "orphan",
                "categoryIds": [real, Uuid::new_v4().to_string()]
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Referenced resource does not exist" }));

    let (_, body) = send!(app, test::TestRequest::get().uri("/api/v1/posts"));
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn test_duplicate_slug_and_category_name() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (_, token) = signup!(app, state, "slugs@example.com");
    create_category!(app, token, "rust");

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/categories")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "rust" }))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let post = json!({ "title": "One", "content": "Body", "slug": "same" });
    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&token))
            .set_json(&post)
    );
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&token))
            .set_json(&post)
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Resource already exists");
}

#[actix_web::test]
async fn test_post_validation() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (_, token) = signup!(app, state, "valid@example.com");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "", "content": "Body", "slug": "s", "categoryIds": ["x"] }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["categoryIds", "title"]);
}

#[actix_web::test]
async fn test_category_crud() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (_, token) = signup!(app, state, "cats@example.com");
    let id = create_category!(app, token, "news");
    let uri = format!("/api/v1/categories/{id}");

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "description": "Daily" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "news");
    assert_eq!(body["data"]["description"], "Daily");

    let (_, body) = send!(app, test::TestRequest::get().uri("/api/v1/categories"));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send!(
        app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send!(app, test::TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Category not found");
}

#[actix_web::test]
async fn test_malformed_json() {
    let state = test_state();
    let app = test::init_service(build_app(state)).await;

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON");
}

#[actix_web::test]
async fn test_not_found_route_and_method() {
    let app = test::init_service(build_app(test_state())).await;

    let (status, body) = send!(app, test::TestRequest::get().uri("/api/v1/nowhere"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "error": "Not Found",
            "message": "The requested path /api/v1/nowhere was not found",
            "method": "GET"
        })
    );

    let (status, body) = send!(app, test::TestRequest::patch().uri("/api/v1/users"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["method"], "PATCH");
}

#[actix_web::test]
async fn test_health_and_welcome() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;

    for uri in ["/health", "/api/v1/health"] {
        let (status, body) = send!(app, test::TestRequest::get().uri(uri));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["environment"], "test");
        assert!(body["timestamp"].is_string());
    }

    let (_, body) = send!(app, test::TestRequest::get().uri("/"));
    assert_eq!(body["message"], "Welcome to the Quill API");

    let token = token_for(&state, &Uuid::new_v4().to_string(), "guest@example.com");
    let (_, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/v1")
            .insert_header(bearer(&token))
    );
    assert_eq!(body["message"], "Welcome to the Quill API, guest@example.com");

    // A bad token on an optional route is ignored.
    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/").insert_header(bearer("junk"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Quill API");
}

#[actix_web::test]
async fn test_pretty_query() {
    let app = test::init_service(build_app(test_state())).await;

    let req = test::TestRequest::get().uri("/health?pretty").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.contains("\n  \"status\": \"OK\""));
}

fn detail_fields(body: &Value) -> Vec<&str> {
    body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect()
}

#[actix_web::test]
async fn test_wrong_shaped_bodies_fail_validation() {
    let app = test::init_service(build_app(test_state())).await;

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(json!({ "email": "a@example.com", "password": 12345678 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(detail_fields(&body), vec!["password"]);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(json!({ "email": null, "password": "password123" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(detail_fields(&body), vec!["email"]);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(json!(["a@example.com", "password123", null, null]))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(detail_fields(&body), vec!["body"]);

    // Nothing was created along the way.
    let (_, body) = send!(app, test::TestRequest::get().uri("/api/v1/users"));
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_cors_preflight_from_allowed_origin() {
    let app = test::init_service(build_app(test_state())).await;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/v1/posts")
        .insert_header((header::ORIGIN, "http://localhost:3000"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            "authorization, content-type",
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(method), "{method} missing from {methods}");
    }
}

#[actix_web::test]
async fn test_cors_ignores_unknown_origin() {
    let app = test::init_service(build_app(test_state())).await;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/v1/posts")
        .insert_header((header::ORIGIN, "https://elsewhere.example"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://elsewhere.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[actix_web::test]
async fn test_any_authenticated_caller_may_edit_posts() {
    let state = test_state();
    let app = test::init_service(build_app(state.clone())).await;
    let (author_id, author) = signup!(app, state, "owner@example.com");
    let (_, other) = signup!(app, state, "other@example.com");

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&author))
            .set_json(json!({ "title": "Mine", "content": "Body", "slug": "mine" }))
    );
    let uri = format!("/api/v1/posts/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&other))
            .set_json(json!({ "title": "Edited" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Edited");
    assert_eq!(body["data"]["authorId"], author_id.as_str());

    let (status, _) = send!(
        app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&other))
    );
    assert_eq!(status, StatusCode::OK);
}
