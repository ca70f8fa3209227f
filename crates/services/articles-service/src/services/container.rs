//! Service Container - Centralized service access.
//!
//! Builds every service over one [`StoreContext`] and hands them out as
//! trait objects so handlers and the scheduler never see the store types.

use std::sync::Arc;

use super::{
    ArticleManager, ArticleService, AuthService, Authenticator, UserManager, UserService,
};
use crate::infra::StoreContext;
use common::JwtConfig;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn articles(&self) -> Arc<dyn ArticleService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    article_service: Arc<dyn ArticleService>,
}

impl Services {
    /// Wire already-built services together
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        article_service: Arc<dyn ArticleService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            article_service,
        }
    }

    /// Build every service over `context`
    pub fn from_context<C: StoreContext>(context: Arc<C>, jwt: JwtConfig) -> Self {
        Self {
            auth_service: Arc::new(Authenticator::new(context.clone(), jwt)),
            user_service: Arc::new(UserManager::new(context.clone())),
            article_service: Arc::new(ArticleManager::new(context)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn articles(&self) -> Arc<dyn ArticleService> {
        self.article_service.clone()
    }
}
