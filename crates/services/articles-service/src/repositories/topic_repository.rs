//! Topic repository. Topics are seeded by migration and never written here.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::EntityTrait;
use uow::{AsRepository, Capabilities, Capability, Repository, SessionId, StoreSession, UowResult};
use uuid::Uuid;

use super::entities::topic::Entity as TopicEntity;
use super::RepositoryName;
use crate::infra::{db_error, DbSession};
use domain::Topic;

#[async_trait]
pub trait TopicRepository: Repository + AsRepository {
    async fn retrieve(&self, id: Uuid) -> UowResult<Option<Topic>>;
}

pub struct TopicStore {
    session: Arc<DbSession>,
}

impl TopicStore {
    pub fn new(session: Arc<DbSession>) -> Self {
        Self { session }
    }
}

impl Repository for TopicStore {
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
impl TopicRepository for TopicStore {
    async fn retrieve(&self, id: Uuid) -> UowResult<Option<Topic>> {
        self.require(Capability::Retrieve)?;

        let txn = self.session.transaction().await?;
        let model = TopicEntity::find_by_id(id)
            .one(&*txn)
            .await
            .map_err(db_error)?;

        Ok(model.map(Topic::from))
    }
}
