//! Create vote table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_paper_table::Paper;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vote::UserId).string().not_null())
                    .col(ColumnDef::new(Vote::PaperId).string().not_null())
                    .col(ColumnDef::new(Vote::VoteValue).small_integer().not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Vote::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // ON CONFLICT target of the vote upsert
                    .primary_key(
                        Index::create()
                            .name("pk_vote")
                            .col(Vote::UserId)
                            .col(Vote::PaperId),
                    )
                    .check(Expr::col(Vote::VoteValue).is_in([1, -1]))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_paper")
                            .from(Vote::Table, Vote::PaperId)
                            .to(Paper::Table, Paper::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Aggregates are summed per paper
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_paper_id")
                    .table(Vote::Table)
                    .col(Vote::PaperId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    UserId,
    PaperId,
    VoteValue,
    CreatedAt,
    UpdatedAt,
}
