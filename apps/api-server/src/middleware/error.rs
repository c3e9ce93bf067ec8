//! Error classification and the boundary middleware that applies it.

use std::future::{Future, Ready, ready};
use std::pin::Pin;

use actix_web::{
    Error, HttpResponse, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::StatusCode,
};
use quill_core::error::{FOREIGN_KEY_VIOLATION, RepoError, UNIQUE_VIOLATION};
use quill_core::ports::AuthError;
use quill_shared::{ErrorBody, FieldError};
use validator::{ValidationError, ValidationErrors};

use crate::config::Environment;

/// Every failure a handler or extractor can raise.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Fully formed response, rendered as is.
    #[error("HTTP {status}: {body:?}")]
    Http { status: StatusCode, body: ErrorBody },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Store(#[from] RepoError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// 404 `{error: "<Resource> not found"}`.
    pub fn not_found(resource: &str) -> Self {
        Self::Status {
            status: StatusCode::NOT_FOUND,
            message: format!("{resource} not found"),
        }
    }

    pub fn bad_request(error: &str, message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::new(error).with_message(message),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorBody::unauthorized(message),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => Self::unauthorized(err.to_string()),
            AuthError::TokenExpired => Self::unauthorized(err.to_string()),
            AuthError::InvalidToken(_) => Self::unauthorized("Invalid token"),
            AuthError::InvalidCredentials => Self::Http {
                status: StatusCode::UNAUTHORIZED,
                body: ErrorBody::new("Invalid credentials"),
            },
            AuthError::Signing(msg) => Self::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Map an error onto its status and JSON body. First match wins:
/// passthrough, validation, explicit status, store code, fallback.
pub fn classify(err: &AppError, env: Environment) -> (StatusCode, ErrorBody) {
    match err {
        AppError::Http { status, body } => (*status, body.clone()),
        AppError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::validation(field_errors(errors)),
        ),
        AppError::Status { status, message } => (*status, ErrorBody::new(message.as_str())),
        AppError::Store(store) => match store.code() {
            Some(UNIQUE_VIOLATION) => (StatusCode::CONFLICT, ErrorBody::new("Resource already exists")),
            Some(FOREIGN_KEY_VIOLATION) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Referenced resource does not exist"),
            ),
            Some(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Database error"),
            ),
            None => fallback(&store.to_string(), env),
        },
        AppError::Internal(text) => fallback(text, env),
    }
}

fn fallback(text: &str, env: Environment) -> (StatusCode, ErrorBody) {
    let body = if env.is_development() {
        ErrorBody::new(text)
    } else {
        ErrorBody::internal_error()
    };
    (StatusCode::INTERNAL_SERVER_ERROR, body)
}

/// Flatten validator output into `[{field, code, message}]`, sorted by field.
fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field);
            errs.iter().map(move |e| FieldError {
                field: field.clone(),
                code: e.code.to_string(),
                message: describe(e),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }

    match err.code.as_ref() {
        "length" => match (err.params.get("min"), err.params.get("max")) {
            (Some(min), Some(max)) => format!("Must be between {min} and {max} characters"),
            (Some(min), None) => format!("Must be at least {min} characters"),
            (None, Some(max)) => format!("Must be at most {max} characters"),
            (None, None) => "Invalid length".to_string(),
        },
        "email" => "Invalid email".to_string(),
        code => format!("Failed {code} check"),
    }
}

/// Request bodies are camelCase; validator reports Rust field names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Renders with production redaction. [`ErrorBoundary`] re-renders with the
/// configured environment.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        classify(self, Environment::Production).0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, body) = classify(self, Environment::Production);
        HttpResponse::build(status).json(body)
    }
}

/// Middleware that classifies every failed response for the configured
/// environment and logs it.
pub struct ErrorBoundary {
    env: Environment,
}

impl ErrorBoundary {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ErrorBoundary
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ErrorBoundaryService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorBoundaryService {
            service,
            env: self.env,
        }))
    }
}

pub struct ErrorBoundaryService<S> {
    service: S,
    env: Environment,
}

impl<S, B> Service<ServiceRequest> for ErrorBoundaryService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let env = self.env;
        let method = req.method().clone();
        let path = req.path().to_string();
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;

            let classified = res.response().error().map(|err| match err.as_error::<AppError>() {
                Some(app_err) => {
                    let (status, body) = classify(app_err, env);
                    log_failure(status, &method, &path, app_err);
                    Some((status, body))
                }
                None => {
                    // Framework errors keep their own response.
                    log_failure(res.status(), &method, &path, err);
                    None
                }
            });

            match classified {
                Some(Some((status, body))) => {
                    let (req, _) = res.into_parts();
                    let response = HttpResponse::build(status).json(body);
                    Ok(ServiceResponse::new(req, response).map_into_right_body())
                }
                _ => Ok(res.map_into_left_body()),
            }
        })
    }
}

fn log_failure(
    status: StatusCode,
    method: &actix_web::http::Method,
    path: &str,
    err: &dyn std::fmt::Display,
) {
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), %method, path, error = %err, "Request failed");
    } else {
        tracing::warn!(status = status.as_u16(), %method, path, error = %err, "Request rejected");
    }
}
