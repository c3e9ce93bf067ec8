//! Category entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_category::Entity")]
    PostCategory,
}

impl Related<super::post_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostCategory.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_category::Relation::Post.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_category::Relation::Category.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for quill_core::domain::Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at.into(),
        }
    }
}

impl From<quill_core::domain::Category> for ActiveModel {
    fn from(category: quill_core::domain::Category) -> Self {
        Self {
            id: Set(category.id),
            name: Set(category.name),
            description: Set(category.description),
            created_at: Set(category.created_at.into()),
        }
    }
}
