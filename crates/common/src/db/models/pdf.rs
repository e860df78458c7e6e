//! PDF catalog entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pdfs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub category: Option<String>,

    /// Ordered tag labels as a JSONB array of strings
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    #[sea_orm(column_type = "Text")]
    pub file_url: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub thumbnail: Option<String>,

    pub is_trending: bool,

    pub uploaded_at: DateTimeWithTimeZone,

    /// JSONB array of integers in 1..=5, append-only
    #[sea_orm(column_type = "JsonBinary")]
    pub ratings: Json,

    /// JSONB array of `{comment, date}`, append-only
    #[sea_orm(column_type = "JsonBinary")]
    pub reviews: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
