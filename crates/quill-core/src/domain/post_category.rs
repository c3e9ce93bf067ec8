use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Join row linking a post to a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCategory {
    pub id: Uuid,
    pub post_id: Uuid,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PostCategory {
    pub fn new(post_id: Uuid, category_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            category_id,
            created_at: Utc::now(),
        }
    }
}
