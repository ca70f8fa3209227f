//! Article service - article CRUD and the popular-articles cache.
//!
//! Writes that touch both stores go through a composite with the relational
//! unit registered first and the cache unit second. Cache reads that a later
//! step depends on are flushed with an intermediate commit of the cache unit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uow::{scope, take_reply, Capabilities, Capability, Scope};
use uuid::Uuid;

use super::workspace::{composite, UnitBuilder, UowName};
use crate::infra::StoreContext;
use crate::repositories::{ArticleCacheRepository, RepositoryName};
use common::{AppError, AppResult, OptionExt};
use domain::{Article, ArticleChanges};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ArticleService: Send + Sync {
    /// Publish an article under an existing topic
    async fn create_article(&self, author_id: Uuid, topic_id: Uuid, text: String)
        -> AppResult<Article>;

    /// Fetch an article and count the view
    async fn retrieve_article(&self, id: Uuid) -> AppResult<Article>;

    /// Edit an article. Only its author may do so.
    async fn update_article(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: ArticleChanges,
    ) -> AppResult<Article>;

    async fn delete_article(&self, user_id: Uuid, id: Uuid) -> AppResult<()>;

    /// Replace the popular-articles cache with the `count` most viewed
    /// articles created since `date_from`. Returns how many were cached.
    async fn update_popular_articles(&self, date_from: DateTime<Utc>, count: u64)
        -> AppResult<usize>;

    /// Cached popular articles, most viewed first
    async fn retrieve_popular_articles(&self) -> AppResult<Vec<Article>>;
}

pub struct ArticleManager<C: StoreContext> {
    context: Arc<C>,
}

impl<C: StoreContext> ArticleManager<C> {
    pub fn new(context: Arc<C>) -> Self {
        Self { context }
    }
}

fn rank(articles: &mut [Article]) {
    articles.sort_by(|a, b| {
        b.views
            .cmp(&a.views)
            .then(b.creation_date.cmp(&a.creation_date))
    });
}

#[async_trait]
impl<C: StoreContext> ArticleService for ArticleManager<C> {
    async fn create_article(
        &self,
        author_id: Uuid,
        topic_id: Uuid,
        text: String,
    ) -> AppResult<Article> {
        let db = self.context.db_session();
        let users = self.context.users(&db, Capabilities::READ_ONLY);
        let topics = self.context.topics(&db);
        let articles = self
            .context
            .articles(&db, Capabilities::of(&[Capability::Create]));
        let unit = UnitBuilder::new(db)
            .with(RepositoryName::Users, &users)?
            .with(RepositoryName::Topics, &topics)?
            .with(RepositoryName::Articles, &articles)?
            .build();

        scope::run(unit.as_ref(), async {
            let author = users.retrieve(author_id).await?.ok_or_not_found("User")?;
            let topic = topics.retrieve(topic_id).await?.ok_or_not_found("Topic")?;

            let article = Article::new(&author, &topic, text);
            articles.create(&article).await?;
            unit.commit().await?;

            tracing::info!(article_id = %article.id, user_id = %author.id, "Article created");
            Ok::<_, AppError>(article)
        })
        .await
    }

    async fn retrieve_article(&self, id: Uuid) -> AppResult<Article> {
        let db = self.context.db_session();
        let articles = self.context.articles(
            &db,
            Capabilities::of(&[Capability::Retrieve, Capability::Update]),
        );
        let unit = UnitBuilder::new(db)
            .with(RepositoryName::Articles, &articles)?
            .build();

        scope::run(unit.as_ref(), async {
            if !articles.increment_views(id).await? {
                return Err(AppError::not_found("Article"));
            }
            let article = articles.retrieve(id).await?.ok_or_not_found("Article")?;
            unit.commit().await?;
            Ok::<_, AppError>(article)
        })
        .await
    }

    async fn update_article(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: ArticleChanges,
    ) -> AppResult<Article> {
        if changes.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }

        let db = self.context.db_session();
        let articles = self.context.articles(
            &db,
            Capabilities::of(&[Capability::Retrieve, Capability::Update]),
        );
        let topics = self.context.topics(&db);
        let db_unit = UnitBuilder::new(db)
            .with(RepositoryName::Articles, &articles)?
            .with(RepositoryName::Topics, &topics)?
            .build();

        let cache_session = self.context.article_cache_session();
        let cache = Arc::new(ArticleCacheRepository::new(
            cache_session.clone(),
            Capabilities::of(&[Capability::Create, Capability::Retrieve, Capability::Update]),
        ));
        let cache_unit = UnitBuilder::new(cache_session)
            .with(RepositoryName::ArticleCache, &cache)?
            .build();

        let units = composite(vec![
            (UowName::Database, db_unit as Arc<dyn Scope>),
            (UowName::ArticleCache, cache_unit.clone() as Arc<dyn Scope>),
        ])?;

        scope::run(&units, async {
            let mut article = articles.retrieve(id).await?.ok_or_not_found("Article")?;
            article.ensure_author(user_id)?;

            let topic = match changes.topic_id {
                Some(topic_id) => Some(topics.retrieve(topic_id).await?.ok_or_not_found("Topic")?),
                None => None,
            };
            article.apply(topic, changes.text.clone());
            articles.update(&article).await?;

            let index = cache.retrieve(&ArticleCacheRepository::key(article.id))?;
            let mut replies = cache_unit.commit().await?;
            let cached = ArticleCacheRepository::decode(take_reply(&mut replies, index)?)?;

            if cached.is_some() {
                cache.refresh(&article)?;
            } else {
                cache.create(&article)?;
            }
            units.commit_all().await?;

            tracing::info!(article_id = %article.id, "Article updated");
            Ok::<_, AppError>(article)
        })
        .await
    }

    async fn delete_article(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let db = self.context.db_session();
        let articles = self.context.articles(
            &db,
            Capabilities::of(&[Capability::Retrieve, Capability::Delete]),
        );
        let db_unit = UnitBuilder::new(db)
            .with(RepositoryName::Articles, &articles)?
            .build();

        let cache_session = self.context.article_cache_session();
        let cache = Arc::new(ArticleCacheRepository::new(
            cache_session.clone(),
            Capabilities::of(&[Capability::Delete]),
        ));
        let cache_unit = UnitBuilder::new(cache_session)
            .with(RepositoryName::ArticleCache, &cache)?
            .build();

        let units = composite(vec![
            (UowName::Database, db_unit as Arc<dyn Scope>),
            (UowName::ArticleCache, cache_unit as Arc<dyn Scope>),
        ])?;

        scope::run(&units, async {
            let article = articles.retrieve(id).await?.ok_or_not_found("Article")?;
            article.ensure_author(user_id)?;

            articles.delete(article.id).await?;
            cache.delete(vec![ArticleCacheRepository::key(article.id)])?;
            units.commit_all().await?;

            tracing::info!(article_id = %article.id, "Article deleted");
            Ok::<_, AppError>(())
        })
        .await
    }

    async fn update_popular_articles(
        &self,
        date_from: DateTime<Utc>,
        count: u64,
    ) -> AppResult<usize> {
        let db = self.context.db_session();
        let articles = self.context.articles(&db, Capabilities::READ_ONLY);
        let db_unit = UnitBuilder::new(db)
            .with(RepositoryName::Articles, &articles)?
            .build();

        let cache_session = self.context.article_cache_session();
        let cache = Arc::new(ArticleCacheRepository::new(
            cache_session.clone(),
            Capabilities::of(&[Capability::Create, Capability::Retrieve, Capability::Delete]),
        ));
        let cache_unit = UnitBuilder::new(cache_session)
            .with(RepositoryName::ArticleCache, &cache)?
            .build();

        let units = composite(vec![
            (UowName::Database, db_unit as Arc<dyn Scope>),
            (UowName::ArticleCache, cache_unit.clone() as Arc<dyn Scope>),
        ])?;

        scope::run(&units, async {
            let index = cache.retrieve_keys()?;
            let mut replies = cache_unit.commit().await?;
            let stale = take_reply(&mut replies, index)?.into_texts()?;
            let evicted = stale.len();
            cache.delete(stale)?;

            let popular = articles.retrieve_by_date(date_from, count).await?;
            for article in &popular {
                cache.create(article)?;
            }
            units.commit_all().await?;

            tracing::info!(
                evicted,
                cached = popular.len(),
                since = %date_from,
                "Popular articles refreshed"
            );
            Ok::<_, AppError>(popular.len())
        })
        .await
    }

    async fn retrieve_popular_articles(&self) -> AppResult<Vec<Article>> {
        let session = self.context.article_cache_session();
        let cache = Arc::new(ArticleCacheRepository::new(
            session.clone(),
            Capabilities::READ_ONLY,
        ));
        let unit = UnitBuilder::new(session)
            .with(RepositoryName::ArticleCache, &cache)?
            .build();

        scope::run(unit.as_ref(), async {
            let index = cache.retrieve_keys()?;
            let mut replies = unit.commit().await?;
            let keys = take_reply(&mut replies, index)?.into_texts()?;
            if keys.is_empty() {
                return Ok(Vec::new());
            }

            let indices = keys
                .iter()
                .map(|key| cache.retrieve(key))
                .collect::<Result<Vec<_>, _>>()?;
            let mut replies = unit.commit().await?;

            let mut popular = Vec::with_capacity(indices.len());
            for index in indices {
                if let Some(article) =
                    ArticleCacheRepository::decode(take_reply(&mut replies, index)?)?
                {
                    popular.push(article);
                }
            }
            rank(&mut popular);
            Ok::<_, AppError>(popular)
        })
        .await
    }
}
