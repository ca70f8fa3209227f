//! Unit of Work over a single store session.
//!
//! A unit owns one session and a registry of named repositories bound to it.
//! It is single use: entered once, committed any number of times while
//! entered, exited once. Exiting after a failure rolls the session back
//! before releasing it.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::command::Reply;
use crate::composite::CompositeCommit;
use crate::error::{UowError, UowResult};
use crate::repository::Repository;
use crate::scope::Scope;
use crate::session::StoreSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Entered,
    Exited,
}

/// What a commit produced, independent of the store kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Transactional store committed; nothing to report
    Transaction,
    /// Replies of the flushed key-value commands, in staging order
    Pipeline(Vec<Reply>),
    /// Per-unit outcomes of a nested composite
    Composite(CompositeCommit),
}

impl CommitOutcome {
    pub fn into_replies(self) -> UowResult<Vec<Reply>> {
        match self {
            CommitOutcome::Pipeline(replies) => Ok(replies),
            CommitOutcome::Transaction => Ok(Vec::new()),
            CommitOutcome::Composite(_) => Err(UowError::unexpected_reply(
                "composite outcome has no flat reply list",
            )),
        }
    }
}

impl From<()> for CommitOutcome {
    fn from(_: ()) -> Self {
        CommitOutcome::Transaction
    }
}

impl From<Vec<Reply>> for CommitOutcome {
    fn from(replies: Vec<Reply>) -> Self {
        CommitOutcome::Pipeline(replies)
    }
}

/// Unit of Work bound to one store session.
pub struct UnitOfWork<S: StoreSession> {
    session: Arc<S>,
    repositories: Vec<(String, Arc<dyn Repository>)>,
    phase: Mutex<Phase>,
}

impl<S: StoreSession> UnitOfWork<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self {
            session,
            repositories: Vec::new(),
            phase: Mutex::new(Phase::Idle),
        }
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Register a repository under `name`.
    ///
    /// Fails with `DuplicateName` if the name is taken and with
    /// `SessionMismatch` if the repository talks to another session. The
    /// registry is unchanged on failure.
    pub fn add_repository(
        &mut self,
        name: impl Into<String>,
        repository: Arc<dyn Repository>,
    ) -> UowResult<()> {
        let name = name.into();

        if self.contains(&name) {
            return Err(UowError::DuplicateName {
                kind: "repository",
                name,
            });
        }

        if repository.session_id() != self.session.id() {
            return Err(UowError::SessionMismatch {
                repository: repository.name().to_string(),
            });
        }

        self.repositories.push((name, repository));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.repositories.iter().any(|(n, _)| n == name)
    }

    pub fn repository(&self, name: &str) -> Option<&Arc<dyn Repository>> {
        self.repositories
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, repo)| repo)
    }

    /// Registered names in registration order
    pub fn repository_names(&self) -> impl Iterator<Item = &str> {
        self.repositories.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Open the scope. A unit can be entered only once.
    pub async fn enter(&self) -> UowResult<()> {
        self.transition(Phase::Idle, Phase::Entered, "enter")?;

        if let Err(e) = self.session.begin().await {
            *self.phase.lock() = Phase::Exited;
            if let Err(close_err) = self.session.close().await {
                tracing::error!(
                    session = %self.session.id(),
                    error = %close_err,
                    "Failed to release session after begin error"
                );
            }
            return Err(e);
        }

        tracing::debug!(
            session = %self.session.id(),
            store = self.session.store(),
            repositories = self.repositories.len(),
            "Unit of work entered"
        );
        Ok(())
    }

    /// Commit the session. Only valid while entered.
    pub async fn commit(&self) -> UowResult<S::Output> {
        self.expect_phase(Phase::Entered, "commit")?;
        let output = self.session.commit().await?;
        tracing::debug!(session = %self.session.id(), store = self.session.store(), "Unit of work committed");
        Ok(output)
    }

    /// Close the scope. Rolls back first when `failed`, then always releases
    /// the session. Both steps are attempted even if the first one fails.
    pub async fn exit(&self, failed: bool) -> UowResult<()> {
        self.transition(Phase::Entered, Phase::Exited, "exit")?;

        let mut errors = Vec::new();

        if failed {
            tracing::warn!(
                session = %self.session.id(),
                store = self.session.store(),
                "Rolling back unit of work"
            );
            if let Err(e) = self.session.rollback().await {
                tracing::error!(session = %self.session.id(), error = %e, "Rollback failed");
                errors.push(e);
            }
        }

        if let Err(e) = self.session.close().await {
            tracing::error!(session = %self.session.id(), error = %e, "Session close failed");
            errors.push(e);
        }

        match UowError::from_many(errors) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn expect_phase(&self, expected: Phase, action: &str) -> UowResult<()> {
        let phase = *self.phase.lock();
        if phase != expected {
            return Err(UowError::lifecycle(format!(
                "cannot {action} a unit of work in state {phase:?}"
            )));
        }
        Ok(())
    }

    fn transition(&self, from: Phase, to: Phase, action: &str) -> UowResult<()> {
        let mut phase = self.phase.lock();
        if *phase != from {
            return Err(UowError::lifecycle(format!(
                "cannot {action} a unit of work in state {:?}",
                *phase
            )));
        }
        *phase = to;
        Ok(())
    }
}

#[async_trait]
impl<S> Scope for UnitOfWork<S>
where
    S: StoreSession + 'static,
    S::Output: Into<CommitOutcome>,
{
    async fn enter(&self) -> UowResult<()> {
        UnitOfWork::enter(self).await
    }

    async fn commit(&self) -> UowResult<CommitOutcome> {
        UnitOfWork::commit(self).await.map(Into::into)
    }

    async fn exit(&self, failed: bool) -> UowResult<()> {
        UnitOfWork::exit(self, failed).await
    }
}
