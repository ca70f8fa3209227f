//! Unit of Work composition over heterogeneous stores.
//!
//! This crate provides:
//! - Capability-checked repositories bound to a single store session
//! - `UnitOfWork`: one session plus a registry of named repositories
//! - `UowComposite`: several units behind the same enter/commit/exit contract
//! - Deferred key-value commands flushed as one batched round trip
//!
//! It knows nothing about concrete stores. Transactional stores plug in by
//! implementing [`StoreSession`]; key-value stores plug in by implementing
//! [`PipelineExecutor`] and using [`KvSession`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut db = UnitOfWork::new(db_session.clone());
//! db.add_repository("articles", articles.clone())?;
//!
//! let mut cache = UnitOfWork::new(cache_session.clone());
//! cache.add_repository("article_cache", article_cache.clone())?;
//!
//! let mut composite = UowComposite::new();
//! composite.add_uow("db", Arc::new(db))?;
//! composite.add_uow("cache", Arc::new(cache))?;
//!
//! scope::run(&composite, async {
//!     articles.delete(id).await?;
//!     article_cache.delete(&[id.to_string()])?;
//!     composite.commit().await?;
//!     Ok::<_, UowError>(())
//! })
//! .await?;
//! ```

pub mod capability;
pub mod command;
pub mod composite;
pub mod error;
pub mod pipeline;
pub mod repository;
pub mod scope;
pub mod session;
pub mod unit;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use capability::{Capabilities, Capability};
pub use command::{take_reply, Command, CommandQueue, Reply};
pub use composite::{CompositeCommit, UowComposite};
pub use error::{StoreError, UowError, UowResult};
pub use pipeline::{KvSession, PipelineExecutor};
pub use repository::{AsRepository, Repository};
pub use scope::Scope;
pub use session::{SessionId, StoreSession};
pub use unit::{CommitOutcome, UnitOfWork};
