//! Article entity. Author and topic names live in their own tables and are
//! joined in on read.

use sea_orm::entity::prelude::*;
use sea_orm::FromQueryResult;

use domain::Article;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic_id: Uuid,
    pub creation_date: DateTimeUtc,
    pub text: String,
    pub views: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::topic::Entity",
        from = "Column::TopicId",
        to = "super::topic::Column::Id",
        on_delete = "Restrict"
    )]
    Topic,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Article row joined with its author's and topic's names
#[derive(Debug, Clone, FromQueryResult)]
pub struct ArticleRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub creation_date: DateTimeUtc,
    pub topic_id: Uuid,
    pub topic_name: String,
    pub text: String,
    pub views: i64,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            creation_date: row.creation_date,
            topic_id: row.topic_id,
            topic_name: row.topic_name,
            text: row.text,
            views: row.views,
        }
    }
}
