//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL repositories via SeaORM
//!
//! The in-memory store and the JWT token service are always available.

pub mod auth;
pub mod database;

pub use auth::{JwtConfig, JwtTokenService};
pub use database::{DatabaseConfig, InMemoryStore};

#[cfg(feature = "postgres")]
pub use database::{PostgresCategoryRepository, PostgresPostRepository, PostgresUserRepository};
