//! Key-value session with deferred, batched execution.

use std::sync::Arc;

use async_trait::async_trait;

use crate::command::{Command, CommandQueue, Reply};
use crate::error::{UowError, UowResult};
use crate::session::{SessionId, StoreSession};

/// Sends a batch of commands to a key-value store in one round trip.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    /// Label of the store behind this executor
    fn store(&self) -> &'static str;

    /// Execute `commands` in order and return one reply per command.
    async fn execute(&self, commands: Vec<Command>) -> UowResult<Vec<Reply>>;
}

/// Key-value session. Staging calls only append to the command queue and
/// return the index the command's reply will have in the next commit.
pub struct KvSession {
    id: SessionId,
    queue: CommandQueue,
    executor: Arc<dyn PipelineExecutor>,
}

impl KvSession {
    pub fn new(executor: Arc<dyn PipelineExecutor>) -> Self {
        Self {
            id: SessionId::next(),
            queue: CommandQueue::new(),
            executor,
        }
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn hash_set(&self, key: impl Into<String>, fields: Vec<(String, String)>) -> usize {
        self.queue.push(Command::HashSet {
            key: key.into(),
            fields,
        })
    }

    pub fn hash_multi_get(&self, key: impl Into<String>, fields: &[&str]) -> usize {
        self.queue.push(Command::HashMultiGet {
            key: key.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        })
    }

    pub fn delete(&self, keys: Vec<String>) -> usize {
        self.queue.push(Command::Delete { keys })
    }

    pub fn keys(&self, pattern: impl Into<String>) -> usize {
        self.queue.push(Command::Keys {
            pattern: pattern.into(),
        })
    }

    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        expire_secs: Option<u64>,
    ) -> usize {
        self.queue.push(Command::Set {
            key: key.into(),
            value: value.into(),
            expire_secs,
        })
    }

    pub fn get(&self, key: impl Into<String>) -> usize {
        self.queue.push(Command::Get { key: key.into() })
    }

    /// Flush the queue as one batch. Returns an empty vector when nothing
    /// was staged, without contacting the store.
    pub async fn execute(&self) -> UowResult<Vec<Reply>> {
        let commands = self.queue.drain();
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let staged = commands.len();
        tracing::debug!(
            session = %self.id,
            store = self.executor.store(),
            commands = staged,
            "Flushing command pipeline"
        );

        let replies = self.executor.execute(commands).await?;
        if replies.len() != staged {
            return Err(UowError::unexpected_reply(format!(
                "{} commands staged but {} replies received",
                staged,
                replies.len()
            )));
        }

        Ok(replies)
    }
}

#[async_trait]
impl StoreSession for KvSession {
    type Output = Vec<Reply>;

    fn id(&self) -> SessionId {
        self.id
    }

    fn store(&self) -> &'static str {
        self.executor.store()
    }

    async fn begin(&self) -> UowResult<()> {
        Ok(())
    }

    async fn commit(&self) -> UowResult<Vec<Reply>> {
        self.execute().await
    }

    async fn rollback(&self) -> UowResult<()> {
        let dropped = self.queue.len();
        if dropped > 0 {
            tracing::debug!(session = %self.id, dropped, "Discarding staged commands");
        }
        self.queue.clear();
        Ok(())
    }

    async fn close(&self) -> UowResult<()> {
        self.queue.clear();
        Ok(())
    }
}
