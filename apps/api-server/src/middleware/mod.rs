//! Middleware modules.

pub mod auth;
pub mod error;
pub mod json;
pub mod pretty;

pub use auth::{Identity, OptionalIdentity};
pub use error::{AppError, AppResult, ErrorBoundary};
pub use json::ValidatedJson;
pub use pretty::PrettyJson;
