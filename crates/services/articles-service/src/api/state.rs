//! Application state shared by every handler.

use std::sync::Arc;

use crate::infra::StoreHealth;
use crate::services::{ArticleService, AuthService, ServiceContainer, UserService};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub article_service: Arc<dyn ArticleService>,
    /// Store connectivity checks for `/health`
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        article_service: Arc<dyn ArticleService>,
        health: Arc<dyn StoreHealth>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            article_service,
            health,
        }
    }

    /// Take every service from `container`
    pub fn from_container(container: &dyn ServiceContainer, health: Arc<dyn StoreHealth>) -> Self {
        Self::new(
            container.auth(),
            container.users(),
            container.articles(),
            health,
        )
    }
}
