//! Article repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Unchanged, ColumnTrait, EntityTrait,
    sea_query::Expr, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use uow::{AsRepository, Capabilities, Capability, Repository, SessionId, StoreSession, UowResult};
use uuid::Uuid;

use super::entities::article::{self, ArticleRow, Entity as ArticleEntity};
use super::entities::{topic, user};
use super::RepositoryName;
use crate::infra::{db_error, DbSession};
use domain::Article;

/// Article data access. Reads return articles joined with their author's
/// and topic's names.
#[async_trait]
pub trait ArticleRepository: Repository + AsRepository {
    async fn create(&self, article: &Article) -> UowResult<()>;

    async fn retrieve(&self, id: Uuid) -> UowResult<Option<Article>>;

    /// Articles written at or after `date_from`, most viewed first, newest
    /// first among equal view counts.
    async fn retrieve_by_date(
        &self,
        date_from: DateTime<Utc>,
        limit: u64,
    ) -> UowResult<Vec<Article>>;

    /// Persist topic and text. Author, creation date and view count are
    /// left as stored.
    async fn update(&self, article: &Article) -> UowResult<()>;

    /// Add one view in place. Returns false when no such article exists.
    async fn increment_views(&self, id: Uuid) -> UowResult<bool>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> UowResult<bool>;
}

/// SeaORM implementation of [`ArticleRepository`]
pub struct ArticleStore {
    session: Arc<DbSession>,
    capabilities: Capabilities,
}

impl ArticleStore {
    pub fn new(session: Arc<DbSession>, capabilities: Capabilities) -> Self {
        Self {
            session,
            capabilities,
        }
    }

    fn joined() -> Select<ArticleEntity> {
        ArticleEntity::find()
            .select_only()
            .column(article::Column::Id)
            .column(article::Column::UserId)
            .column_as(user::Column::Name, "user_name")
            .column(article::Column::CreationDate)
            .column(article::Column::TopicId)
            .column_as(topic::Column::Name, "topic_name")
            .column(article::Column::Text)
            .column(article::Column::Views)
            .join(JoinType::InnerJoin, article::Relation::User.def())
            .join(JoinType::InnerJoin, article::Relation::Topic.def())
    }
}

impl Repository for ArticleStore {
    fn name(&self) -> &str {
        RepositoryName::Articles.as_str()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn session_id(&self) -> SessionId {
        self.session.id()
    }
}

#[async_trait]
impl ArticleRepository for ArticleStore {
    async fn create(&self, article: &Article) -> UowResult<()> {
        self.require(Capability::Create)?;

        let active_model = article::ActiveModel {
            id: Set(article.id),
            user_id: Set(article.user_id),
            topic_id: Set(article.topic_id),
            creation_date: Set(article.creation_date),
            text: Set(article.text.clone()),
            views: Set(article.views),
        };

        let txn = self.session.transaction().await?;
        active_model.insert(&*txn).await.map_err(db_error)?;
        Ok(())
    }

    async fn retrieve(&self, id: Uuid) -> UowResult<Option<Article>> {
        self.require(Capability::Retrieve)?;

        let txn = self.session.transaction().await?;
        let row = Self::joined()
            .filter(article::Column::Id.eq(id))
            .into_model::<ArticleRow>()
            .one(&*txn)
            .await
            .map_err(db_error)?;

        Ok(row.map(Article::from))
    }

    async fn retrieve_by_date(
        &self,
        date_from: DateTime<Utc>,
        limit: u64,
    ) -> UowResult<Vec<Article>> {
        self.require(Capability::Retrieve)?;

        let txn = self.session.transaction().await?;
        let rows = Self::joined()
            .filter(article::Column::CreationDate.gte(date_from))
            .order_by_desc(article::Column::Views)
            .order_by_desc(article::Column::CreationDate)
            .limit(limit)
            .into_model::<ArticleRow>()
            .all(&*txn)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn update(&self, article: &Article) -> UowResult<()> {
        self.require(Capability::Update)?;

        let active_model = article::ActiveModel {
            id: Unchanged(article.id),
            user_id: NotSet,
            topic_id: Set(article.topic_id),
            creation_date: NotSet,
            text: Set(article.text.clone()),
            views: NotSet,
        };

        let txn = self.session.transaction().await?;
        active_model.update(&*txn).await.map_err(db_error)?;
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> UowResult<bool> {
        self.require(Capability::Update)?;

        let txn = self.session.transaction().await?;
        let result = ArticleEntity::update_many()
            .col_expr(
                article::Column::Views,
                Expr::col(article::Column::Views).add(1),
            )
            .filter(article::Column::Id.eq(id))
            .exec(&*txn)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid) -> UowResult<bool> {
        self.require(Capability::Delete)?;

        let txn = self.session.transaction().await?;
        let result = ArticleEntity::delete_by_id(id)
            .exec(&*txn)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected > 0)
    }
}
