//! Poll entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// How many choices one vote submission may touch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PollType {
    /// Exactly one choice per vote.
    #[sea_orm(string_value = "single")]
    Single,
    /// One or more choices per vote.
    #[sea_orm(string_value = "multiple")]
    Multiple,
}

/// A poll row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub question: String,

    #[sea_orm(indexed)]
    pub category: String,

    /// Tags (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: JsonValue,

    /// Poll choices (JSON array of strings), fixed at creation
    #[sea_orm(column_type = "Json")]
    pub choices: JsonValue,

    /// Vote counts per choice (JSON array of integers), index-aligned with `choices`
    #[sea_orm(column_type = "Json")]
    pub votes: JsonValue,

    pub poll_type: PollType,

    /// When the poll stops accepting votes (null for never)
    #[sea_orm(nullable)]
    pub close_date: Option<DateTimeWithTimeZone>,

    pub visibility_public: bool,

    #[sea_orm(indexed)]
    pub trending: bool,

    /// Bumped on every tally write; guards against lost updates
    pub version: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
