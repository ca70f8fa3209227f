//! Migration: Create articles table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240101_000002_create_article_topics_table::ArticleTopics;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Articles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Articles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Articles::UserId).uuid().not_null())
                    .col(ColumnDef::new(Articles::TopicId).uuid().not_null())
                    .col(
                        ColumnDef::new(Articles::CreationDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Articles::Text).string_len(10_000).not_null())
                    .col(
                        ColumnDef::new(Articles::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_articles_user_id")
                            .from(Articles::Table, Articles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_articles_topic_id")
                            .from(Articles::Table, Articles::TopicId)
                            .to(ArticleTopics::Table, ArticleTopics::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Popularity refresh filters on creation date and sorts by views
        manager
            .create_index(
                Index::create()
                    .name("idx_articles_creation_date")
                    .table(Articles::Table)
                    .col(Articles::CreationDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Articles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Articles {
    Table,
    Id,
    UserId,
    TopicId,
    CreationDate,
    Text,
    Views,
}
