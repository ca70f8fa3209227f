//! Migration: Create article topics table and seed the default topics.

use domain::seeded_topics;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ArticleTopics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArticleTopics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArticleTopics::Name)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        let mut seed = Query::insert();
        seed.into_table(ArticleTopics::Table)
            .columns([ArticleTopics::Id, ArticleTopics::Name]);
        for topic in seeded_topics() {
            seed.values([topic.id.into(), topic.name.into()])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }

        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArticleTopics::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ArticleTopics {
    Table,
    Id,
    Name,
}
