//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DbConn, DbErr,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{
    Category, CategoryChanges, Post, PostCategory, PostChanges, PostWithCategories, User,
    UserChanges,
};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, CategoryRepository, PostRepository, UserRepository};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_category::{self, Entity as PostCategoryEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// `update` on a missing row: `RecordNotUpdated`, or `RecordNotFound` when
/// nothing was set and SeaORM fell back to a lookup.
fn is_missing_row(err: &DbErr) -> bool {
    matches!(err, DbErr::RecordNotUpdated | DbErr::RecordNotFound(_))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.len() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(user)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut active = user::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(Some(last_name));
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }

        match active.update(&self.db).await {
            Ok(model) => Ok(Some(model.into())),
            Err(e) if is_missing_row(&e) => Ok(None),
            Err(e) => Err(map_db_err(e)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        self.delete_by_id(id).await
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, RepoError> {
        let model = category::ActiveModel::from(category)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, RepoError> {
        let mut active = category::ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }

        match active.update(&self.db).await {
            Ok(model) => Ok(Some(model.into())),
            Err(e) if is_missing_row(&e) => Ok(None),
            Err(e) => Err(map_db_err(e)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        self.delete_by_id(id).await
    }
}

/// PostgreSQL post repository.
///
/// Writes run inside a transaction; returning early with `?` drops the
/// transaction uncommitted, which rolls it back.
pub struct PostgresPostRepository {
    pub(crate) db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

/// Categories linked to each of `post_ids`, in link order.
async fn load_categories<C>(
    db: &C,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Category>>, DbErr>
where
    C: ConnectionTrait,
{
    let mut by_post: HashMap<Uuid, Vec<Category>> = HashMap::new();
    if post_ids.is_empty() {
        return Ok(by_post);
    }

    let links = PostCategoryEntity::find()
        .filter(post_category::Column::PostId.is_in(post_ids.to_vec()))
        .all(db)
        .await?;
    if links.is_empty() {
        return Ok(by_post);
    }

    let mut category_ids: Vec<Uuid> = links.iter().map(|link| link.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let categories: HashMap<Uuid, Category> = CategoryEntity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, Category::from(model)))
        .collect();

    for link in links {
        if let Some(category) = categories.get(&link.category_id) {
            by_post
                .entry(link.post_id)
                .or_default()
                .push(category.clone());
        }
    }

    Ok(by_post)
}

async fn link_categories<C>(db: &C, post_id: Uuid, category_ids: &[Uuid]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if category_ids.is_empty() {
        return Ok(());
    }

    let rows = category_ids
        .iter()
        .map(|&category_id| post_category::ActiveModel::from(PostCategory::new(post_id, category_id)));

    PostCategoryEntity::insert_many(rows)
        .exec_without_returning(db)
        .await?;

    Ok(())
}

fn with_categories(
    models: Vec<post::Model>,
    mut categories: HashMap<Uuid, Vec<Category>>,
) -> Vec<PostWithCategories> {
    models
        .into_iter()
        .map(|model| PostWithCategories {
            categories: categories.remove(&model.id).unwrap_or_default(),
            post: model.into(),
        })
        .collect()
}

#[async_trait]
impl BaseRepository<PostWithCategories, Uuid> for PostgresPostRepository {
    async fn find_all(&self) -> Result<Vec<PostWithCategories>, RepoError> {
        let models = PostEntity::find().all(&self.db).await.map_err(map_db_err)?;
        let ids: Vec<Uuid> = models.iter().map(|model| model.id).collect();
        let categories = load_categories(&self.db, &ids)
            .await
            .map_err(map_db_err)?;

        Ok(with_categories(models, categories))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithCategories>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let categories = load_categories(&self.db, &[id])
            .await
            .map_err(map_db_err)?;

        Ok(with_categories(vec![model], categories).pop())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(
        &self,
        post: Post,
        category_ids: Vec<Uuid>,
    ) -> Result<PostWithCategories, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let model = post::ActiveModel::from(post)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
        link_categories(&txn, model.id, &category_ids)
            .await
            .map_err(map_db_err)?;
        let categories = load_categories(&txn, &[model.id])
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(post_id = %model.id, links = category_ids.len(), "Post created");

        with_categories(vec![model], categories)
            .pop()
            .ok_or_else(|| RepoError::Query("Inserted post vanished".to_string()))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<PostWithCategories>, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let mut active = post::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        if let Some(slug) = changes.slug {
            active.slug = Set(slug);
        }
        if let Some(published) = changes.published {
            active.published = Set(published);
        }

        let model = match active.update(&txn).await {
            Ok(model) => model,
            Err(e) if is_missing_row(&e) => {
                txn.rollback().await.map_err(map_db_err)?;
                return Ok(None);
            }
            Err(e) => return Err(map_db_err(e)),
        };

        if let Some(category_ids) = changes.category_ids {
            PostCategoryEntity::delete_many()
                .filter(post_category::Column::PostId.eq(id))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            link_categories(&txn, id, &category_ids)
                .await
                .map_err(map_db_err)?;
        }

        let categories = load_categories(&txn, &[id])
            .await
            .map_err(map_db_err)?;
        txn.commit().await.map_err(map_db_err)?;

        Ok(with_categories(vec![model], categories).pop())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        PostCategoryEntity::delete_many()
            .filter(post_category::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let result = PostEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Ok(false);
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(true)
    }
}
