//! Builders for the per-operation unit-of-work graph.
//!
//! Every business operation builds its own sessions, repositories, units and
//! composite, then drops them when the operation ends.

use std::fmt;
use std::sync::Arc;

use uow::{AsRepository, Scope, StoreSession, UnitOfWork, UowComposite, UowResult};

use crate::repositories::RepositoryName;

/// Names units of work are registered under in a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UowName {
    Database,
    ArticleCache,
    Tokens,
}

impl UowName {
    pub const fn as_str(self) -> &'static str {
        match self {
            UowName::Database => "database",
            UowName::ArticleCache => "article_cache",
            UowName::Tokens => "tokens",
        }
    }
}

impl fmt::Display for UowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collects repositories into a unit over one session.
pub struct UnitBuilder<S: StoreSession> {
    uow: UnitOfWork<S>,
}

impl<S: StoreSession> UnitBuilder<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self {
            uow: UnitOfWork::new(session),
        }
    }

    pub fn with<R>(mut self, name: RepositoryName, repository: &Arc<R>) -> UowResult<Self>
    where
        R: AsRepository + ?Sized,
    {
        self.uow
            .add_repository(name.as_str(), Arc::clone(repository).as_repository())?;
        Ok(self)
    }

    pub fn build(self) -> Arc<UnitOfWork<S>> {
        Arc::new(self.uow)
    }
}

/// Register `units` in order. The relational unit goes first so a cache
/// failure never leaves the cache ahead of the database.
pub fn composite(units: Vec<(UowName, Arc<dyn Scope>)>) -> UowResult<UowComposite> {
    let mut composite = UowComposite::new();
    for (name, unit) in units {
        composite.add_uow(name.as_str(), unit)?;
    }
    Ok(composite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::ArticleCacheRepository;
    use uow::testing::MemoryPipeline;
    use uow::{Capabilities, KvSession, UowError};

    #[test]
    fn test_unit_builder_rejects_repeated_name() {
        let session = Arc::new(KvSession::new(Arc::new(MemoryPipeline::new())));
        let cache = Arc::new(ArticleCacheRepository::new(
            session.clone(),
            Capabilities::CRUD,
        ));

        let result = UnitBuilder::new(session)
            .with(RepositoryName::ArticleCache, &cache)
            .and_then(|b| b.with(RepositoryName::ArticleCache, &cache));

        assert!(matches!(
            result.err(),
            Some(UowError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_composite_keeps_registration_order() {
        let first = UnitBuilder::new(Arc::new(KvSession::new(Arc::new(MemoryPipeline::new()))))
            .build();
        let second = UnitBuilder::new(Arc::new(KvSession::new(Arc::new(MemoryPipeline::new()))))
            .build();

        let composite = composite(vec![
            (UowName::Database, first as Arc<dyn Scope>),
            (UowName::ArticleCache, second as Arc<dyn Scope>),
        ])
        .unwrap();

        assert_eq!(
            composite.unit_names().collect::<Vec<_>>(),
            vec!["database", "article_cache"]
        );
    }
}
