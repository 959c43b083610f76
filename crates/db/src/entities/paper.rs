//! Paper entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paper")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    /// Short description shown in listings.
    #[sea_orm(column_name = "abstract", column_type = "Text", nullable)]
    #[serde(rename = "abstract")]
    pub summary: Option<String>,

    /// Public URL of the uploaded file.
    #[sea_orm(nullable)]
    pub content_url: Option<String>,

    /// Lowercase extension without the dot (`pdf`, `md`, `txt`).
    #[sea_orm(nullable)]
    pub file_type: Option<String>,

    /// Extracted text of markdown and plain text uploads, for search.
    #[sea_orm(column_type = "Text", nullable)]
    pub raw_content: Option<String>,

    /// External reference to the uploading user.
    #[sea_orm(indexed, nullable)]
    pub author_id: Option<String>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
