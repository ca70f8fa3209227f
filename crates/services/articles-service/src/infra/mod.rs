//! Infrastructure layer - store clients and sessions
//!
//! - PostgreSQL connection, migrations and the transactional session
//! - Redis connections and the batched command executor
//! - The store context handing out fresh sessions and repositories

pub mod cache;
pub mod db;
pub mod session;
pub mod store;

pub use cache::{Cache, RedisPipeline, REDIS_STORE};
pub use db::{Database, Migrator};
pub use session::{db_error, DbSession, POSTGRES_STORE};
pub use store::{PgStoreContext, StoreContext, StoreHealth};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockStoreHealth;
