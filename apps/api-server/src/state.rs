//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{CategoryRepository, PostRepository, TokenService, UserRepository};
use quill_infra::JwtTokenService;

#[cfg(any(test, not(feature = "postgres")))]
use quill_infra::InMemoryStore;

#[cfg(feature = "postgres")]
use quill_infra::{
    PostgresCategoryRepository, PostgresPostRepository, PostgresUserRepository,
    database::connect,
};

use crate::config::AppConfig;

/// Shared application state. Immutable once built.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    #[cfg(any(test, not(feature = "postgres")))]
    pub fn in_memory(config: AppConfig) -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            posts: Arc::new(store.clone()),
            categories: Arc::new(store),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            config: Arc::new(config),
        }
    }

    /// Connect to PostgreSQL and build the repositories on one pool.
    #[cfg(feature = "postgres")]
    pub async fn connect(config: AppConfig) -> std::io::Result<Self> {
        let db = connect(&config.database)
            .await
            .map_err(std::io::Error::other)?;
        tracing::info!("Application state initialized (postgres)");

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db)),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            config: Arc::new(config),
        })
    }
}
