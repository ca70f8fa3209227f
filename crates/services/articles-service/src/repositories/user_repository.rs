//! User repository.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uow::{AsRepository, Capabilities, Capability, Repository, SessionId, StoreSession, UowResult};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use super::RepositoryName;
use crate::infra::{db_error, DbSession};
use domain::User;

/// User data access.
#[async_trait]
pub trait UserRepository: Repository + AsRepository {
    async fn create(&self, user: &User) -> UowResult<()>;

    async fn retrieve(&self, id: Uuid) -> UowResult<Option<User>>;

    /// Find a user by unique name
    async fn retrieve_by_name(&self, name: &str) -> UowResult<Option<User>>;
}

/// SeaORM implementation of [`UserRepository`]
pub struct UserStore {
    session: Arc<DbSession>,
    capabilities: Capabilities,
}

impl UserStore {
    pub fn new(session: Arc<DbSession>, capabilities: Capabilities) -> Self {
        Self {
            session,
            capabilities,
        }
    }
}

impl Repository for UserStore {
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
impl UserRepository for UserStore {
    async fn create(&self, user: &User) -> UowResult<()> {
        self.require(Capability::Create)?;

        let active_model = ActiveModel {
            id: Set(user.id),
            name: Set(user.name.clone()),
            password_hash: Set(user.password_hash.clone()),
            registration_date: Set(user.registration_date),
        };

        let txn = self.session.transaction().await?;
        active_model.insert(&*txn).await.map_err(db_error)?;
        Ok(())
    }

    async fn retrieve(&self, id: Uuid) -> UowResult<Option<User>> {
        self.require(Capability::Retrieve)?;

        let txn = self.session.transaction().await?;
        let model = UserEntity::find_by_id(id)
            .one(&*txn)
            .await
            .map_err(db_error)?;

        Ok(model.map(User::from))
    }

    async fn retrieve_by_name(&self, name: &str) -> UowResult<Option<User>> {
        self.require(Capability::Retrieve)?;

        let txn = self.session.transaction().await?;
        let model = UserEntity::find()
            .filter(user::Column::Name.eq(name))
            .one(&*txn)
            .await
            .map_err(db_error)?;

        Ok(model.map(User::from))
    }
}
