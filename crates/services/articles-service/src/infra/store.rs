//! Store context: the per-operation factory for sessions and repositories.

use std::sync::Arc;

use async_trait::async_trait;
use uow::{Capabilities, KvSession, StoreSession};

use super::{Cache, Database, DbSession};
use crate::repositories::{
    ArticleRepository, ArticleStore, TopicRepository, TopicStore, UserRepository, UserStore,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Bundles the store clients. Every call hands out a fresh session or a
/// repository bound to the session it is given; nothing is shared between
/// two business operations.
pub trait StoreContext: Send + Sync + 'static {
    /// Relational store session
    type Db: StoreSession<Output = ()> + 'static;

    fn db_session(&self) -> Arc<Self::Db>;

    fn article_cache_session(&self) -> Arc<KvSession>;

    fn token_session(&self) -> Arc<KvSession>;

    fn users(&self, session: &Arc<Self::Db>, capabilities: Capabilities)
        -> Arc<dyn UserRepository>;

    fn topics(&self, session: &Arc<Self::Db>) -> Arc<dyn TopicRepository>;

    fn articles(
        &self,
        session: &Arc<Self::Db>,
        capabilities: Capabilities,
    ) -> Arc<dyn ArticleRepository>;
}

/// Connectivity checks reported by the health endpoint.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn database(&self) -> Result<(), String>;

    async fn article_cache(&self) -> Result<(), String>;

    async fn token_cache(&self) -> Result<(), String>;
}

/// Production context over PostgreSQL and the two Redis instances.
#[derive(Clone)]
pub struct PgStoreContext {
    database: Database,
    article_cache: Cache,
    tokens: Cache,
}

impl PgStoreContext {
    pub fn new(database: Database, article_cache: Cache, tokens: Cache) -> Self {
        Self {
            database,
            article_cache,
            tokens,
        }
    }
}

impl StoreContext for PgStoreContext {
    type Db = DbSession;

    fn db_session(&self) -> Arc<DbSession> {
        Arc::new(DbSession::new(self.database.get_connection()))
    }

    fn article_cache_session(&self) -> Arc<KvSession> {
        Arc::new(KvSession::new(Arc::new(self.article_cache.pipeline())))
    }

    fn token_session(&self) -> Arc<KvSession> {
        Arc::new(KvSession::new(Arc::new(self.tokens.pipeline())))
    }

    fn users(&self, session: &Arc<DbSession>, capabilities: Capabilities) -> Arc<dyn UserRepository> {
        Arc::new(UserStore::new(session.clone(), capabilities))
    }

    fn topics(&self, session: &Arc<DbSession>) -> Arc<dyn TopicRepository> {
        Arc::new(TopicStore::new(session.clone()))
    }

    fn articles(
        &self,
        session: &Arc<DbSession>,
        capabilities: Capabilities,
    ) -> Arc<dyn ArticleRepository> {
        Arc::new(ArticleStore::new(session.clone(), capabilities))
    }
}

#[async_trait]
impl StoreHealth for PgStoreContext {
    async fn database(&self) -> Result<(), String> {
        self.database.ping().await.map_err(|e| e.to_string())
    }

    async fn article_cache(&self) -> Result<(), String> {
        self.article_cache.ping().await.map_err(|e| e.to_string())
    }

    async fn token_cache(&self) -> Result<(), String> {
        self.tokens.ping().await.map_err(|e| e.to_string())
    }
}
