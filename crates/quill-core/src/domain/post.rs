use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Category;

/// Post entity - represents a blog post or article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub slug: String,
    pub published: bool,
}

/// Partial update.
///
/// `category_ids: Some(..)` replaces the whole category set (an empty list
/// clears it); `None` leaves the associations alone.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub published: Option<bool>,
    pub category_ids: Option<Vec<Uuid>>,
}

/// A post together with the categories it is filed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithCategories {
    #[serde(flatten)]
    pub post: Post,
    pub categories: Vec<Category>,
}

impl Post {
    /// Create a new post owned by `author_id`.
    pub fn new(author_id: Uuid, new: NewPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: new.title,
            content: new.content,
            slug: new.slug,
            published: new.published,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the scalar part of `changes` and bump `updated_at`.
    pub fn apply(&mut self, changes: &PostChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(slug) = &changes.slug {
            self.slug = slug.clone();
        }
        if let Some(published) = changes.published {
            self.published = published;
        }
        self.updated_at = Utc::now();
    }
}
