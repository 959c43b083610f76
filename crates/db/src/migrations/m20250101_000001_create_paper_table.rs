//! Create paper table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Paper::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Paper::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Paper::Title).string_len(300).not_null())
                    .col(ColumnDef::new(Paper::Abstract).text().null())
                    .col(ColumnDef::new(Paper::ContentUrl).string_len(1024).null())
                    .col(ColumnDef::new(Paper::FileType).string_len(8).null())
                    .col(ColumnDef::new(Paper::RawContent).text().null())
                    .col(ColumnDef::new(Paper::AuthorId).string().null())
                    .col(
                        ColumnDef::new(Paper::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_paper_created_at")
                    .table(Paper::Table)
                    .col(Paper::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_paper_author_id")
                    .table(Paper::Table)
                    .col(Paper::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Paper::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Paper {
    Table,
    Id,
    Title,
    Abstract,
    ContentUrl,
    FileType,
    RawContent,
    AuthorId,
    CreatedAt,
}
