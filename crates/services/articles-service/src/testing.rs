//! In-memory store context for service tests.
//!
//! The relational store is a [`MemoryStore`] of plain maps; both Redis
//! instances are [`MemoryPipeline`]s. Repositories honour the same
//! capability checks as the SeaORM ones.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uow::testing::{MemoryPipeline, MemorySession, MemoryStore};
use uow::{
    Capabilities, Capability, KvSession, Repository, SessionId, StoreError, StoreSession,
    UowResult,
};
use uuid::Uuid;

use crate::infra::StoreContext;
use crate::repositories::{ArticleRepository, RepositoryName, TopicRepository, UserRepository};
use domain::{seeded_topics, Article, Password, Topic, User};

const MEMORY_STORE: &str = "memory";

/// Relational state
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub users: BTreeMap<Uuid, User>,
    pub topics: BTreeMap<Uuid, Topic>,
    pub articles: BTreeMap<Uuid, Article>,
}

pub type MemoryDb = MemorySession<Tables>;

pub struct MemoryContext {
    pub db: Arc<MemoryStore<Tables>>,
    pub article_cache: Arc<MemoryPipeline>,
    pub tokens: Arc<MemoryPipeline>,
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContext {
    /// Empty stores with the default topics seeded.
    pub fn new() -> Self {
        let tables = Tables {
            topics: seeded_topics().into_iter().map(|t| (t.id, t)).collect(),
            ..Tables::default()
        };
        Self {
            db: MemoryStore::with_state(tables),
            article_cache: Arc::new(MemoryPipeline::new()),
            tokens: Arc::new(MemoryPipeline::new()),
        }
    }

    /// Commit a user whose password is `password`.
    pub fn seed_user(&self, name: &str, password: &str) -> User {
        let hash = Password::new(password)
            .map(Password::into_string)
            .unwrap_or_else(|e| panic!("invalid test password: {e}"));
        let user = User::new(name.to_string(), hash);
        self.db.update(|t| t.users.insert(user.id, user.clone()));
        user
    }

    /// Commit an article by `author` created at `created`.
    pub fn seed_article(
        &self,
        author: &User,
        topic: &Topic,
        text: &str,
        created: DateTime<Utc>,
        views: i64,
    ) -> Article {
        let mut article = Article::new(author, topic, text.to_string());
        article.creation_date = created;
        article.views = views;
        self.db
            .update(|t| t.articles.insert(article.id, article.clone()));
        article
    }

    pub fn committed(&self) -> Tables {
        self.db.snapshot()
    }
}

impl StoreContext for MemoryContext {
    type Db = MemoryDb;

    fn db_session(&self) -> Arc<MemoryDb> {
        Arc::new(self.db.session())
    }

    fn article_cache_session(&self) -> Arc<KvSession> {
        Arc::new(KvSession::new(self.article_cache.clone()))
    }

    fn token_session(&self) -> Arc<KvSession> {
        Arc::new(KvSession::new(self.tokens.clone()))
    }

    fn users(&self, session: &Arc<MemoryDb>, capabilities: Capabilities) -> Arc<dyn UserRepository> {
        Arc::new(MemoryUsers {
            session: session.clone(),
            capabilities,
        })
    }

    fn topics(&self, session: &Arc<MemoryDb>) -> Arc<dyn TopicRepository> {
        Arc::new(MemoryTopics {
            session: session.clone(),
        })
    }

    fn articles(
        &self,
        session: &Arc<MemoryDb>,
        capabilities: Capabilities,
    ) -> Arc<dyn ArticleRepository> {
        Arc::new(MemoryArticles {
            session: session.clone(),
            capabilities,
        })
    }
}

pub struct MemoryUsers {
    session: Arc<MemoryDb>,
    capabilities: Capabilities,
}

impl Repository for MemoryUsers {
    fn name(&self) -> &str {
        RepositoryName::Users.as_str()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn session_id(&self) -> SessionId {
        self.session.id()
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create(&self, user: &User) -> UowResult<()> {
        self.require(Capability::Create)?;
        let inserted = self.session.write(|t| {
            if t.users.values().any(|u| u.name == user.name) {
                return false;
            }
            t.users.insert(user.id, user.clone());
            true
        });
        if !inserted {
            return Err(StoreError::conflict(
                MEMORY_STORE,
                io::Error::new(io::ErrorKind::AlreadyExists, "users.name must be unique"),
            )
            .into());
        }
        Ok(())
    }

    async fn retrieve(&self, id: Uuid) -> UowResult<Option<User>> {
        self.require(Capability::Retrieve)?;
        Ok(self.session.read(|t| t.users.get(&id).cloned()))
    }

    async fn retrieve_by_name(&self, name: &str) -> UowResult<Option<User>> {
        self.require(Capability::Retrieve)?;
        Ok(self
            .session
            .read(|t| t.users.values().find(|u| u.name == name).cloned()))
    }
}

pub struct MemoryTopics {
    session: Arc<MemoryDb>,
}

impl Repository for MemoryTopics {
    fn name(&self) -> &str {
        RepositoryName::Topics.as_str()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ_ONLY
    }

    fn session_id(&self) -> SessionId {
        self.session.id()
    }
}

#[async_trait]
impl TopicRepository for MemoryTopics {
    async fn retrieve(&self, id: Uuid) -> UowResult<Option<Topic>> {
        self.require(Capability::Retrieve)?;
        Ok(self.session.read(|t| t.topics.get(&id).cloned()))
    }
}

pub struct MemoryArticles {
    session: Arc<MemoryDb>,
    capabilities: Capabilities,
}

impl Repository for MemoryArticles {
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
impl ArticleRepository for MemoryArticles {
    async fn create(&self, article: &Article) -> UowResult<()> {
        self.require(Capability::Create)?;
        self.session
            .write(|t| t.articles.insert(article.id, article.clone()));
        Ok(())
    }

    async fn retrieve(&self, id: Uuid) -> UowResult<Option<Article>> {
        self.require(Capability::Retrieve)?;
        Ok(self.session.read(|t| t.articles.get(&id).cloned()))
    }

    async fn retrieve_by_date(
        &self,
        date_from: DateTime<Utc>,
        limit: u64,
    ) -> UowResult<Vec<Article>> {
        self.require(Capability::Retrieve)?;
        let mut articles: Vec<Article> = self.session.read(|t| {
            t.articles
                .values()
                .filter(|a| a.creation_date >= date_from)
                .cloned()
                .collect()
        });
        articles.sort_by(|a, b| {
            b.views
                .cmp(&a.views)
                .then(b.creation_date.cmp(&a.creation_date))
        });
        articles.truncate(limit as usize);
        Ok(articles)
    }

    async fn update(&self, article: &Article) -> UowResult<()> {
        self.require(Capability::Update)?;
        self.session.write(|t| {
            if let Some(row) = t.articles.get_mut(&article.id) {
                row.topic_id = article.topic_id;
                row.topic_name = article.topic_name.clone();
                row.text = article.text.clone();
            }
        });
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> UowResult<bool> {
        self.require(Capability::Update)?;
        Ok(self.session.write(|t| match t.articles.get_mut(&id) {
            Some(row) => {
                row.record_view();
                true
            }
            None => false,
        }))
    }

    async fn delete(&self, id: Uuid) -> UowResult<bool> {
        self.require(Capability::Delete)?;
        Ok(self.session.write(|t| t.articles.remove(&id).is_some()))
    }
}
