//! Deferred key-value commands and their replies.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{UowError, UowResult};

/// A key-value operation staged for the next batched flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HSET key field value [field value ...]
    HashSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// HMGET key field [field ...]
    HashMultiGet { key: String, fields: Vec<String> },
    /// DEL key [key ...]
    Delete { keys: Vec<String> },
    /// KEYS pattern
    Keys { pattern: String },
    /// SET key value [EX seconds]
    Set {
        key: String,
        value: String,
        expire_secs: Option<u64>,
    },
    /// GET key
    Get { key: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::HashSet { .. } => "HSET",
            Command::HashMultiGet { .. } => "HMGET",
            Command::Delete { .. } => "DEL",
            Command::Keys { .. } => "KEYS",
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
        }
    }
}

/// Raw reply to one flushed command. Decoding into domain types is left to
/// the caller that staged the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Nil,
    Ok,
    Int(i64),
    Text(String),
    Array(Vec<Reply>),
}

impl Reply {
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    pub fn as_int(&self) -> UowResult<i64> {
        match self {
            Reply::Int(n) => Ok(*n),
            other => Err(UowError::unexpected_reply(format!(
                "expected integer, got {other:?}"
            ))),
        }
    }

    /// `Nil` becomes `None`, text becomes `Some`.
    pub fn into_optional_text(self) -> UowResult<Option<String>> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Text(s) => Ok(Some(s)),
            Reply::Int(n) => Ok(Some(n.to_string())),
            other => Err(UowError::unexpected_reply(format!(
                "expected text or nil, got {other:?}"
            ))),
        }
    }

    /// Array reply whose elements may be nil (HMGET).
    pub fn into_optional_texts(self) -> UowResult<Vec<Option<String>>> {
        match self {
            Reply::Array(items) => items.into_iter().map(Reply::into_optional_text).collect(),
            other => Err(UowError::unexpected_reply(format!(
                "expected array, got {other:?}"
            ))),
        }
    }

    /// Array reply of non-nil strings (KEYS).
    pub fn into_texts(self) -> UowResult<Vec<String>> {
        self.into_optional_texts()?
            .into_iter()
            .map(|item| item.ok_or_else(|| UowError::unexpected_reply("nil inside array")))
            .collect()
    }
}

/// Move the reply at `index` out of a commit result, leaving `Nil` behind.
pub fn take_reply(replies: &mut [Reply], index: usize) -> UowResult<Reply> {
    let len = replies.len();
    replies
        .get_mut(index)
        .map(|slot| std::mem::replace(slot, Reply::Nil))
        .ok_or_else(|| {
            UowError::unexpected_reply(format!("no reply at index {index}, got {len}"))
        })
}

/// Ordered queue of staged commands, shared between a key-value session and
/// the repositories bound to it. Cloning shares the same queue.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<Vec<Command>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a command and return its index in the next flush.
    pub fn push(&self, command: Command) -> usize {
        let mut queue = self.inner.lock();
        queue.push(command);
        queue.len() - 1
    }

    /// Take every staged command, leaving the queue empty.
    pub fn drain(&self) -> Vec<Command> {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_staging_index() {
        let queue = CommandQueue::new();
        assert_eq!(queue.push(Command::Get { key: "a".into() }), 0);
        assert_eq!(queue.push(Command::Get { key: "b".into() }), 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_drain_empties_shared_queue() {
        let queue = CommandQueue::new();
        let shared = queue.clone();
        shared.push(Command::Keys {
            pattern: "article:*".into(),
        });

        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert!(shared.is_empty());
    }

    #[test]
    fn test_optional_texts_decoding() {
        let reply = Reply::Array(vec![Reply::Text("x".into()), Reply::Nil, Reply::Int(3)]);
        assert_eq!(
            reply.into_optional_texts().unwrap(),
            vec![Some("x".to_string()), None, Some("3".to_string())]
        );
    }

    #[test]
    fn test_texts_rejects_nil() {
        let reply = Reply::Array(vec![Reply::Nil]);
        assert!(matches!(
            reply.into_texts(),
            Err(UowError::UnexpectedReply(_))
        ));
    }

    #[test]
    fn test_int_decoding_rejects_text() {
        assert_eq!(Reply::Int(2).as_int().unwrap(), 2);
        assert!(Reply::Text("2".into()).as_int().is_err());
    }

    #[test]
    fn test_take_reply_by_index() {
        let mut replies = vec![Reply::Ok, Reply::Int(4)];
        assert_eq!(take_reply(&mut replies, 1).unwrap(), Reply::Int(4));
        assert_eq!(replies[1], Reply::Nil);
        assert!(take_reply(&mut replies, 2).is_err());
    }
}
