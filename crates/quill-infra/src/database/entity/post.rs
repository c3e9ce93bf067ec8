//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

// No store-level cascades: join rows are removed by the repository.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::post_category::Entity")]
    PostCategory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::post_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostCategory.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_category::Relation::Post.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for quill_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            content: model.content,
            slug: model.slug,
            published: model.published,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            content: Set(post.content),
            slug: Set(post.slug),
            published: Set(post.published),
            author_id: Set(post.author_id),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
