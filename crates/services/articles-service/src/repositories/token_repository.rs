//! Refresh token store: one token per user under `refresh_token:{user_id}`.

use std::sync::Arc;

use uow::{Capabilities, Capability, KvSession, Repository, SessionId, StoreSession, UowResult};
use uuid::Uuid;

use super::RepositoryName;

pub const REFRESH_TOKEN_KEY_PREFIX: &str = "refresh_token:";

pub struct TokenRepository {
    session: Arc<KvSession>,
    capabilities: Capabilities,
}

impl TokenRepository {
    pub fn new(session: Arc<KvSession>, capabilities: Capabilities) -> Self {
        Self {
            session,
            capabilities,
        }
    }

    pub fn key(user_id: Uuid) -> String {
        format!("{REFRESH_TOKEN_KEY_PREFIX}{user_id}")
    }

    /// Stage storing `token` as the user's current refresh token.
    pub fn set(&self, user_id: Uuid, token: &str, ttl_secs: u64) -> UowResult<usize> {
        self.require(Capability::Create)?;
        Ok(self.session.set(Self::key(user_id), token, Some(ttl_secs)))
    }

    pub fn get(&self, user_id: Uuid) -> UowResult<usize> {
        self.require(Capability::Retrieve)?;
        Ok(self.session.get(Self::key(user_id)))
    }

    pub fn delete(&self, user_id: Uuid) -> UowResult<usize> {
        self.require(Capability::Delete)?;
        Ok(self.session.delete(vec![Self::key(user_id)]))
    }
}

impl Repository for TokenRepository {
    fn name(&self) -> &str {
        RepositoryName::Tokens.as_str()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn session_id(&self) -> SessionId {
        self.session.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uow::testing::MemoryPipeline;
    use uow::Reply;

    #[tokio::test]
    async fn test_set_get_delete_in_staging_order() {
        let pipeline = Arc::new(MemoryPipeline::new());
        let session = Arc::new(KvSession::new(pipeline.clone()));
        let tokens = TokenRepository::new(session.clone(), Capabilities::CRUD);
        let user_id = Uuid::new_v4();

        tokens.set(user_id, "jwt-1", 60).unwrap();
        tokens.get(user_id).unwrap();
        tokens.delete(user_id).unwrap();
        tokens.get(user_id).unwrap();
        let replies = session.commit().await.unwrap();

        assert_eq!(
            replies,
            vec![
                Reply::Ok,
                Reply::Text("jwt-1".into()),
                Reply::Int(1),
                Reply::Nil
            ]
        );
        assert_eq!(pipeline.round_trips(), 1);
    }

    #[tokio::test]
    async fn test_set_records_ttl() {
        let pipeline = Arc::new(MemoryPipeline::new());
        let session = Arc::new(KvSession::new(pipeline.clone()));
        let tokens = TokenRepository::new(session.clone(), Capabilities::CRUD);
        let user_id = Uuid::new_v4();

        tokens.set(user_id, "jwt", 3600).unwrap();
        session.commit().await.unwrap();

        assert_eq!(pipeline.expiration(&TokenRepository::key(user_id)), Some(3600));
    }
}
