//! Create poll table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Poll::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Poll::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Poll::Question).string_len(300).not_null())
                    .col(ColumnDef::new(Poll::Category).string_len(64).not_null())
                    .col(ColumnDef::new(Poll::Tags).json_binary().not_null().default("[]"))
                    .col(ColumnDef::new(Poll::Choices).json().not_null())
                    .col(ColumnDef::new(Poll::Votes).json().not_null())
                    .col(ColumnDef::new(Poll::PollType).string_len(16).not_null())
                    .col(ColumnDef::new(Poll::CloseDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Poll::VisibilityPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Poll::Trending).boolean().not_null().default(false))
                    .col(ColumnDef::new(Poll::Version).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Poll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: category (for filtered listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_category")
                    .table(Poll::Table)
                    .col(Poll::Category)
                    .to_owned(),
            )
            .await?;

        // Index: trending (for the featured listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_trending")
                    .table(Poll::Table)
                    .col(Poll::Trending)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Poll::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
    Question,
    Category,
    Tags,
    Choices,
    Votes,
    PollType,
    CloseDate,
    VisibilityPublic,
    Trending,
    Version,
    CreatedAt,
}
