//! Composite of several units of work behind one scope.
//!
//! Units are entered and committed in registration order and exited in
//! reverse. There is no cross-store atomicity: if a later unit fails to
//! commit, earlier ones stay committed and the gap is logged.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{UowError, UowResult};
use crate::scope::Scope;
use crate::unit::CommitOutcome;

/// Ordered per-unit commit outcomes, addressable by index or name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompositeCommit {
    outcomes: Vec<(String, CommitOutcome)>,
}

impl CompositeCommit {
    pub fn get(&self, name: &str) -> Option<&CommitOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn at(&self, index: usize) -> Option<&CommitOutcome> {
        self.outcomes.get(index).map(|(_, outcome)| outcome)
    }

    /// Take one unit's outcome out by name.
    pub fn take(&mut self, name: &str) -> Option<CommitOutcome> {
        let index = self.outcomes.iter().position(|(n, _)| n == name)?;
        Some(self.outcomes.remove(index).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl From<CompositeCommit> for CommitOutcome {
    fn from(commit: CompositeCommit) -> Self {
        CommitOutcome::Composite(commit)
    }
}

/// A set of named units driven as one.
#[derive(Default)]
pub struct UowComposite {
    units: Vec<(String, Arc<dyn Scope>)>,
}

impl UowComposite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit. Registration order is enter and commit order.
    pub fn add_uow(&mut self, name: impl Into<String>, unit: Arc<dyn Scope>) -> UowResult<()> {
        let name = name.into();
        if self.units.iter().any(|(n, _)| *n == name) {
            return Err(UowError::DuplicateName {
                kind: "unit of work",
                name,
            });
        }
        self.units.push((name, unit));
        Ok(())
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Commit every unit in registration order.
    pub async fn commit_all(&self) -> UowResult<CompositeCommit> {
        let mut outcomes = Vec::with_capacity(self.units.len());

        for (name, unit) in &self.units {
            match unit.commit().await {
                Ok(outcome) => outcomes.push((name.clone(), outcome)),
                Err(e) => {
                    if !outcomes.is_empty() {
                        let committed: Vec<&str> =
                            outcomes.iter().map(|(n, _)| n.as_str()).collect();
                        tracing::warn!(
                            failed = %name,
                            committed = ?committed,
                            error = %e,
                            "Partial commit: earlier units stay committed"
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(CompositeCommit { outcomes })
    }
}

#[async_trait]
impl Scope for UowComposite {
    async fn enter(&self) -> UowResult<()> {
        for (index, (name, unit)) in self.units.iter().enumerate() {
            if let Err(e) = unit.enter().await {
                tracing::warn!(unit = %name, error = %e, "Failed to enter unit, unwinding");
                for (entered_name, entered) in self.units[..index].iter().rev() {
                    if let Err(exit_err) = entered.exit(true).await {
                        tracing::error!(
                            unit = %entered_name,
                            error = %exit_err,
                            "Failed to exit unit while unwinding"
                        );
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    async fn commit(&self) -> UowResult<CommitOutcome> {
        self.commit_all().await.map(CommitOutcome::Composite)
    }

    async fn exit(&self, failed: bool) -> UowResult<()> {
        let mut errors = Vec::new();

        for (name, unit) in self.units.iter().rev() {
            if let Err(e) = unit.exit(failed).await {
                tracing::error!(unit = %name, error = %e, "Failed to exit unit");
                errors.push(e);
            }
        }

        match UowError::from_many(errors) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Reply;
    use crate::pipeline::KvSession;
    use crate::testing::{Journal, MemoryPipeline, MemoryStore, Step};
    use crate::unit::UnitOfWork;
    use std::collections::BTreeMap;
    use tokio_test::assert_err;

    type Table = BTreeMap<String, String>;

    fn journaled_unit(
        label: &str,
        journal: &Journal,
        fail: Option<Step>,
    ) -> Arc<UnitOfWork<crate::testing::MemorySession<Table>>> {
        let store = MemoryStore::<Table>::new();
        let session = Arc::new(store.session_with_journal(label, journal));
        if let Some(step) = fail {
            session.fail_on(step);
        }
        Arc::new(UnitOfWork::new(session))
    }

    #[test]
    fn test_add_uow_duplicate_name() {
        let journal = Journal::new();
        let mut composite = UowComposite::new();
        composite
            .add_uow("db", journaled_unit("a", &journal, None))
            .unwrap();

        let err = composite
            .add_uow("db", journaled_unit("b", &journal, None))
            .unwrap_err();

        assert!(matches!(err, UowError::DuplicateName { .. }));
        assert_eq!(composite.unit_names().collect::<Vec<_>>(), vec!["db"]);
    }

    #[tokio::test]
    async fn test_enter_in_order_exit_in_reverse() {
        let journal = Journal::new();
        let mut composite = UowComposite::new();
        composite
            .add_uow("a", journaled_unit("a", &journal, None))
            .unwrap();
        composite
            .add_uow("b", journaled_unit("b", &journal, None))
            .unwrap();

        composite.enter().await.unwrap();
        composite.exit(false).await.unwrap();

        assert_eq!(
            journal.events(),
            vec!["a:begin", "b:begin", "b:close", "a:close"]
        );
    }

    #[tokio::test]
    async fn test_every_exit_attempted_when_one_fails() {
        let journal = Journal::new();
        let mut composite = UowComposite::new();
        composite
            .add_uow("a", journaled_unit("a", &journal, None))
            .unwrap();
        composite
            .add_uow("b", journaled_unit("b", &journal, Some(Step::Close)))
            .unwrap();

        composite.enter().await.unwrap();
        let err = composite.exit(false).await.unwrap_err();

        assert!(matches!(err, UowError::Store(_)));
        assert_eq!(
            journal.events(),
            vec!["a:begin", "b:begin", "b:close", "a:close"]
        );
    }

    #[tokio::test]
    async fn test_several_exit_failures_aggregate() {
        let journal = Journal::new();
        let mut composite = UowComposite::new();
        composite
            .add_uow("a", journaled_unit("a", &journal, Some(Step::Close)))
            .unwrap();
        composite
            .add_uow("b", journaled_unit("b", &journal, Some(Step::Close)))
            .unwrap();

        composite.enter().await.unwrap();
        let err = composite.exit(false).await.unwrap_err();

        match err {
            UowError::Aggregate(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enter_failure_unwinds_entered_units() {
        let journal = Journal::new();
        let mut composite = UowComposite::new();
        composite
            .add_uow("a", journaled_unit("a", &journal, None))
            .unwrap();
        composite
            .add_uow("b", journaled_unit("b", &journal, Some(Step::Begin)))
            .unwrap();
        composite
            .add_uow("c", journaled_unit("c", &journal, None))
            .unwrap();

        assert_err!(composite.enter().await);

        assert_eq!(
            journal.events(),
            vec!["a:begin", "b:begin", "b:close", "a:rollback", "a:close"]
        );
    }

    #[tokio::test]
    async fn test_commit_in_registration_order_with_outcomes() {
        let db_store = MemoryStore::<Table>::new();
        let db_session = Arc::new(db_store.session());
        let db = Arc::new(UnitOfWork::new(db_session.clone()));

        let pipeline = Arc::new(MemoryPipeline::new());
        let kv_session = Arc::new(KvSession::new(pipeline.clone()));
        let kv = Arc::new(UnitOfWork::new(kv_session.clone()));

        let mut composite = UowComposite::new();
        composite.add_uow("db", db).unwrap();
        composite.add_uow("cache", kv).unwrap();

        composite.enter().await.unwrap();
        db_session.write(|t| t.insert("article".into(), "text".into()));
        kv_session.set("article", "text", None);
        let commit = composite.commit_all().await.unwrap();
        composite.exit(false).await.unwrap();

        assert_eq!(commit.names().collect::<Vec<_>>(), vec!["db", "cache"]);
        assert_eq!(commit.get("db"), Some(&CommitOutcome::Transaction));
        assert_eq!(
            commit.at(1),
            Some(&CommitOutcome::Pipeline(vec![Reply::Ok]))
        );
        assert!(db_store.snapshot().contains_key("article"));
        assert_eq!(pipeline.value("article").as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn test_partial_commit_keeps_earlier_units_committed() {
        let db_store = MemoryStore::<Table>::new();
        let db_session = Arc::new(db_store.session());
        let db = Arc::new(UnitOfWork::new(db_session.clone()));

        let pipeline = Arc::new(MemoryPipeline::new());
        pipeline.fail_next();
        let kv_session = Arc::new(KvSession::new(pipeline.clone()));
        let kv = Arc::new(UnitOfWork::new(kv_session.clone()));

        let mut composite = UowComposite::new();
        composite.add_uow("db", db).unwrap();
        composite.add_uow("cache", kv).unwrap();

        composite.enter().await.unwrap();
        db_session.write(|t| t.insert("article".into(), "text".into()));
        kv_session.set("article", "text", None);
        assert_err!(composite.commit_all().await);
        composite.exit(true).await.unwrap();

        assert!(db_store.snapshot().contains_key("article"));
        assert!(pipeline.value("article").is_none());
    }
}
