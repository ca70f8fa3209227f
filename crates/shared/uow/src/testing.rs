//! In-memory stores for tests.
//!
//! `MemoryStore`/`MemorySession` emulate a transactional store over any
//! cloneable state. `MemoryPipeline` emulates a key-value store behind a
//! [`PipelineExecutor`]. Both can record lifecycle events into a [`Journal`]
//! and inject failures.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use crate::command::{Command, Reply};
use crate::error::{StoreError, UowResult};
use crate::pipeline::PipelineExecutor;
use crate::session::{SessionId, StoreSession};

const MEMORY_STORE: &str = "memory";

/// Session step at which a failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Begin,
    Commit,
    Rollback,
    Close,
}

impl Step {
    fn as_str(self) -> &'static str {
        match self {
            Step::Begin => "begin",
            Step::Commit => "commit",
            Step::Rollback => "rollback",
            Step::Close => "close",
        }
    }
}

#[derive(Debug, Error)]
#[error("injected failure on {0:?}")]
pub struct InjectedFailure(pub Step);

/// Shared, ordered record of session events such as `"db:begin"`.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

/// Committed state of an in-memory transactional store.
pub struct MemoryStore<T> {
    committed: Mutex<T>,
}

impl<T: Clone + Default + Send + 'static> MemoryStore<T> {
    pub fn new() -> Arc<Self> {
        Self::with_state(T::default())
    }

    pub fn with_state(state: T) -> Arc<Self> {
        Arc::new(Self {
            committed: Mutex::new(state),
        })
    }

    /// Copy of the committed state, as a fresh session would see it.
    pub fn snapshot(&self) -> T {
        self.committed.lock().clone()
    }

    /// Change the committed state directly, bypassing any session.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.committed.lock())
    }

    pub fn session(self: &Arc<Self>) -> MemorySession<T> {
        MemorySession {
            id: SessionId::next(),
            store: Arc::clone(self),
            pending: Mutex::new(None),
            journal: None,
            failures: Mutex::new(HashSet::new()),
        }
    }

    pub fn session_with_journal(self: &Arc<Self>, label: &str, journal: &Journal) -> MemorySession<T> {
        let mut session = self.session();
        session.journal = Some((label.to_string(), journal.clone()));
        session
    }
}

/// Transactional session over a [`MemoryStore`]. Reads and writes go to a
/// private copy of the committed state, begun lazily; commit publishes the
/// copy and rollback drops it.
pub struct MemorySession<T> {
    id: SessionId,
    store: Arc<MemoryStore<T>>,
    pending: Mutex<Option<T>>,
    journal: Option<(String, Journal)>,
    failures: Mutex<HashSet<Step>>,
}

impl<T: Clone + Default + Send + 'static> MemorySession<T> {
    pub fn fail_on(&self, step: Step) {
        self.failures.lock().insert(step);
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let mut pending = self.pending.lock();
        let state = pending.get_or_insert_with(|| self.store.snapshot());
        f(state)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut pending = self.pending.lock();
        let state = pending.get_or_insert_with(|| self.store.snapshot());
        f(state)
    }

    fn step(&self, step: Step) -> UowResult<()> {
        if let Some((label, journal)) = &self.journal {
            journal.record(format!("{}:{}", label, step.as_str()));
        }
        if self.failures.lock().contains(&step) {
            return Err(StoreError::new(MEMORY_STORE, InjectedFailure(step)).into());
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Clone + Default + Send + Sync + 'static> StoreSession for MemorySession<T> {
    type Output = ();

    fn id(&self) -> SessionId {
        self.id
    }

    fn store(&self) -> &'static str {
        MEMORY_STORE
    }

    async fn begin(&self) -> UowResult<()> {
        self.step(Step::Begin)?;
        let mut pending = self.pending.lock();
        if pending.is_none() {
            *pending = Some(self.store.snapshot());
        }
        Ok(())
    }

    async fn commit(&self) -> UowResult<()> {
        self.step(Step::Commit)?;
        if let Some(state) = self.pending.lock().take() {
            *self.store.committed.lock() = state;
        }
        Ok(())
    }

    async fn rollback(&self) -> UowResult<()> {
        self.step(Step::Rollback)?;
        self.pending.lock().take();
        Ok(())
    }

    async fn close(&self) -> UowResult<()> {
        self.pending.lock().take();
        self.step(Step::Close)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Text(String),
    Hash(BTreeMap<String, String>),
}

/// In-memory key-value store executing command batches.
#[derive(Default)]
pub struct MemoryPipeline {
    entries: Mutex<HashMap<String, Entry>>,
    expirations: Mutex<HashMap<String, u64>>,
    round_trips: AtomicUsize,
    fail_next: AtomicBool,
}

impl MemoryPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next batch fail without applying any command.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub fn value(&self, key: &str) -> Option<String> {
        match self.entries.lock().get(key) {
            Some(Entry::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn hash(&self, key: &str) -> Option<BTreeMap<String, String>> {
        match self.entries.lock().get(key) {
            Some(Entry::Hash(fields)) => Some(fields.clone()),
            _ => None,
        }
    }

    pub fn expiration(&self, key: &str) -> Option<u64> {
        self.expirations.lock().get(key).copied()
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn insert_value(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .lock()
            .insert(key.into(), Entry::Text(value.into()));
    }

    pub fn insert_hash(&self, key: impl Into<String>, fields: &[(&str, &str)]) {
        let fields = fields
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect();
        self.entries.lock().insert(key.into(), Entry::Hash(fields));
    }

    fn apply(&self, command: Command) -> Reply {
        let mut entries = self.entries.lock();
        match command {
            Command::HashSet { key, fields } => {
                let entry = entries
                    .entry(key)
                    .or_insert_with(|| Entry::Hash(BTreeMap::new()));
                if matches!(entry, Entry::Text(_)) {
                    *entry = Entry::Hash(BTreeMap::new());
                }
                let mut added = 0;
                if let Entry::Hash(hash) = entry {
                    for (field, value) in fields {
                        if hash.insert(field, value).is_none() {
                            added += 1;
                        }
                    }
                }
                Reply::Int(added)
            }
            Command::HashMultiGet { key, fields } => {
                let hash = match entries.get(&key) {
                    Some(Entry::Hash(hash)) => Some(hash),
                    _ => None,
                };
                Reply::Array(
                    fields
                        .iter()
                        .map(|field| match hash.and_then(|h| h.get(field)) {
                            Some(value) => Reply::Text(value.clone()),
                            None => Reply::Nil,
                        })
                        .collect(),
                )
            }
            Command::Delete { keys } => {
                let removed = keys
                    .iter()
                    .filter(|key| entries.remove(key.as_str()).is_some())
                    .count();
                Reply::Int(removed as i64)
            }
            Command::Keys { pattern } => {
                let mut matched: Vec<String> = entries
                    .keys()
                    .filter(|key| glob_match(&pattern, key))
                    .cloned()
                    .collect();
                matched.sort();
                Reply::Array(matched.into_iter().map(Reply::Text).collect())
            }
            Command::Set {
                key,
                value,
                expire_secs,
            } => {
                match expire_secs {
                    Some(secs) => {
                        self.expirations.lock().insert(key.clone(), secs);
                    }
                    None => {
                        self.expirations.lock().remove(&key);
                    }
                }
                entries.insert(key, Entry::Text(value));
                Reply::Ok
            }
            Command::Get { key } => match entries.get(&key) {
                Some(Entry::Text(value)) => Reply::Text(value.clone()),
                _ => Reply::Nil,
            },
        }
    }
}

#[async_trait]
impl PipelineExecutor for MemoryPipeline {
    fn store(&self) -> &'static str {
        MEMORY_STORE
    }

    async fn execute(&self, commands: Vec<Command>) -> UowResult<Vec<Reply>> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::new(MEMORY_STORE, InjectedFailure(Step::Commit)).into());
        }
        Ok(commands.into_iter().map(|c| self.apply(c)).collect())
    }
}

/// Minimal glob: `*` matches any run of characters, everything else is literal.
fn glob_match(pattern: &str, key: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == key,
        Some((prefix, rest)) => {
            let Some(tail) = key.strip_prefix(prefix) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            (0..=tail.len())
                .filter(|i| tail.is_char_boundary(*i))
                .any(|i| glob_match(rest, &tail[i..]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("article:*", "article:1"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("a*c", "abbc"));
        assert!(!glob_match("article:*", "refresh_token:1"));
        assert!(!glob_match("exact", "exactly"));
    }
}
