//! Store sessions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::UowResult;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one store session. Repositories and units compare these to
/// make sure everything registered in a unit talks to the same session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A live connection to one backing store, owned by exactly one unit of work.
///
/// Transactional stores use `Output = ()`. Pipelined key-value stores return
/// the ordered replies of the flushed commands.
#[async_trait]
pub trait StoreSession: Send + Sync {
    type Output: Send;

    fn id(&self) -> SessionId;

    /// Short store label used in logs and errors
    fn store(&self) -> &'static str;

    /// Prepare the session. Must be a no-op when already open.
    async fn begin(&self) -> UowResult<()>;

    /// Make everything done since the last commit durable.
    async fn commit(&self) -> UowResult<Self::Output>;

    /// Discard everything done since the last commit.
    async fn rollback(&self) -> UowResult<()>;

    /// Release the session. Uncommitted work is discarded.
    async fn close(&self) -> UowResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
    }
}
