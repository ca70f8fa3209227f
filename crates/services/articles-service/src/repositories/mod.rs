//! Repository layer - data access bound to one store session each.
//!
//! Relational repositories are traits so business code can run against any
//! [`StoreContext`](crate::infra::StoreContext); key-value repositories only
//! stage commands and are store-agnostic structs.

mod article_cache_repository;
mod article_repository;
pub mod entities;
mod token_repository;
mod topic_repository;
mod user_repository;

use std::fmt;

pub use article_cache_repository::{ArticleCacheRepository, ARTICLE_KEY_PREFIX};
pub use article_repository::{ArticleRepository, ArticleStore};
pub use token_repository::{TokenRepository, REFRESH_TOKEN_KEY_PREFIX};
pub use topic_repository::{TopicRepository, TopicStore};
pub use user_repository::{UserRepository, UserStore};

/// Names repositories are registered under in a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryName {
    Users,
    Topics,
    Articles,
    ArticleCache,
    Tokens,
}

impl RepositoryName {
    pub const fn as_str(self) -> &'static str {
        match self {
            RepositoryName::Users => "users",
            RepositoryName::Topics => "topics",
            RepositoryName::Articles => "articles",
            RepositoryName::ArticleCache => "article_cache",
            RepositoryName::Tokens => "tokens",
        }
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
