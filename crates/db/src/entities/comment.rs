//! Comment entity for poll discussions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A comment row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Poll being discussed
    #[sea_orm(indexed)]
    pub poll_id: String,

    /// Author reference
    pub user_id: String,

    /// Comment being replied to (null for top-level comments).
    /// Not a foreign key: replies outlive a deleted parent.
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::poll::Entity",
        from = "Column::PollId",
        to = "super::poll::Column::Id",
        on_delete = "Cascade"
    )]
    Poll,
}

impl Related<super::poll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Poll.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
