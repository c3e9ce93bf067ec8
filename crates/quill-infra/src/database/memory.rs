//! In-memory store - used when the postgres feature is off, and by tests.
//!
//! Mirrors the relational schema's rules: unique email, slug and category
//! name, and foreign keys without cascades. Each write holds one write guard
//! from validation to mutation, so a failed post write changes nothing.
//! Data is lost on process restart.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{
    Category, CategoryChanges, Post, PostCategory, PostChanges, PostWithCategories, User,
    UserChanges,
};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, CategoryRepository, PostRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    categories: Vec<Category>,
    post_categories: Vec<PostCategory>,
}

impl Tables {
    fn categories_for(&self, post_id: Uuid) -> Vec<Category> {
        self.post_categories
            .iter()
            .filter(|link| link.post_id == post_id)
            .filter_map(|link| self.categories.iter().find(|c| c.id == link.category_id))
            .cloned()
            .collect()
    }

    fn with_categories(&self, post: &Post) -> PostWithCategories {
        PostWithCategories {
            post: post.clone(),
            categories: self.categories_for(post.id),
        }
    }

    fn check_categories_exist(&self, category_ids: &[Uuid]) -> Result<(), RepoError> {
        match category_ids
            .iter()
            .find(|id| !self.categories.iter().any(|c| c.id == **id))
        {
            Some(missing) => Err(RepoError::foreign_key_violation(format!(
                "post_categories.category_id {missing} is not present in categories"
            ))),
            None => Ok(()),
        }
    }

    fn check_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), RepoError> {
        if self
            .posts
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != except)
        {
            return Err(RepoError::unique_violation(format!("posts.slug {slug}")));
        }
        Ok(())
    }

    fn link(&mut self, post_id: Uuid, category_ids: &[Uuid]) {
        self.post_categories.extend(
            category_ids
                .iter()
                .map(|&category_id| PostCategory::new(post_id, category_id)),
        );
    }
}

/// In-memory implementation of every repository port.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::unique_violation("users.email"));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.users.iter().any(|u| &u.email == email && u.id != id) {
                return Err(RepoError::unique_violation("users.email"));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.apply(changes);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.author_id == id) {
            return Err(RepoError::foreign_key_violation(
                "posts.author_id still references users",
            ));
        }

        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok(tables.users.len() < before)
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Category>, RepoError> {
        Ok(self.tables.read().await.categories.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.name == category.name) {
            return Err(RepoError::unique_violation("categories.name"));
        }
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &changes.name {
            if tables.categories.iter().any(|c| &c.name == name && c.id != id) {
                return Err(RepoError::unique_violation("categories.name"));
            }
        }

        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        category.apply(changes);
        Ok(Some(category.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.post_categories.iter().any(|l| l.category_id == id) {
            return Err(RepoError::foreign_key_violation(
                "post_categories.category_id still references categories",
            ));
        }

        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        Ok(tables.categories.len() < before)
    }
}

#[async_trait]
impl BaseRepository<PostWithCategories, Uuid> for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<PostWithCategories>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .map(|p| tables.with_categories(p))
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithCategories>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.with_categories(p)))
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(
        &self,
        post: Post,
        category_ids: Vec<Uuid>,
    ) -> Result<PostWithCategories, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_slug_free(&post.slug, None)?;
        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(RepoError::foreign_key_violation(format!(
                "posts.author_id {} is not present in users",
                post.author_id
            )));
        }
        tables.check_categories_exist(&category_ids)?;

        let post_id = post.id;
        tables.posts.push(post);
        tables.link(post_id, &category_ids);

        let created = tables.posts.iter().find(|p| p.id == post_id);
        created
            .map(|p| tables.with_categories(p))
            .ok_or_else(|| RepoError::Query("Inserted post vanished".to_string()))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<PostWithCategories>, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == id) {
            return Ok(None);
        }
        if let Some(slug) = &changes.slug {
            tables.check_slug_free(slug, Some(id))?;
        }
        if let Some(category_ids) = &changes.category_ids {
            tables.check_categories_exist(category_ids)?;
        }

        if let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) {
            post.apply(&changes);
        }
        if let Some(category_ids) = &changes.category_ids {
            tables.post_categories.retain(|link| link.post_id != id);
            tables.link(id, category_ids);
        }

        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.with_categories(p)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == id) {
            return Ok(false);
        }

        tables.post_categories.retain(|link| link.post_id != id);
        tables.posts.retain(|p| p.id != id);
        Ok(true)
    }
}
