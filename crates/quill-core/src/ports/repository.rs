use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Category, CategoryChanges, Post, PostChanges, PostWithCategories, User, UserChanges,
};
use crate::error::RepoError;

/// Generic read side shared by every repository.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// All rows, in the store's default order.
    async fn find_all(&self) -> Result<Vec<T>, RepoError>;

    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;
}

/// User repository with domain-specific methods.
///
/// `update` and `delete` report an absent row as `Ok(None)` / `Ok(false)`.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn create(&self, user: User) -> Result<User, RepoError>;

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn create(&self, category: Category) -> Result<Category, RepoError>;

    async fn update(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

/// Post repository.
///
/// Every write spans the post row and its category links and is all-or-nothing:
/// a failure at any step leaves no trace of the write.
#[async_trait]
pub trait PostRepository: BaseRepository<PostWithCategories, Uuid> {
    /// Insert `post` and link it to `category_ids`.
    async fn create(
        &self,
        post: Post,
        category_ids: Vec<Uuid>,
    ) -> Result<PostWithCategories, RepoError>;

    /// Apply `changes`; a supplied category list replaces the existing links.
    async fn update(
        &self,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<PostWithCategories>, RepoError>;

    /// Remove the post's category links, then the post.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}
