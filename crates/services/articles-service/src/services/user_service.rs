//! User lookups.

use std::sync::Arc;

use async_trait::async_trait;
use uow::{scope, Capabilities};
use uuid::Uuid;

use super::workspace::UnitBuilder;
use crate::infra::StoreContext;
use crate::repositories::RepositoryName;
use common::{AppResult, OptionExt};
use domain::User;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, id: Uuid) -> AppResult<User>;
}

pub struct UserManager<C: StoreContext> {
    context: Arc<C>,
}

impl<C: StoreContext> UserManager<C> {
    pub fn new(context: Arc<C>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl<C: StoreContext> UserService for UserManager<C> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        let db = self.context.db_session();
        let users = self.context.users(&db, Capabilities::READ_ONLY);
        let unit = UnitBuilder::new(db)
            .with(RepositoryName::Users, &users)?
            .build();

        scope::run(unit.as_ref(), async {
            users.retrieve(id).await?.ok_or_not_found("User")
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryContext;
    use common::AppError;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_get_user_found_and_missing() {
        let context = Arc::new(MemoryContext::new());
        let alice = context.seed_user("alice", "secret1");
        let service = UserManager::new(context);

        let found = assert_ok!(service.get_user(alice.id).await);
        assert_eq!(found.name, "alice");

        let missing = assert_err!(service.get_user(Uuid::new_v4()).await);
        assert!(matches!(missing, AppError::NotFound(_)));
    }
}
