//! Errors raised by the unit-of-work layer.
//!
//! Store transport failures are carried unchanged inside [`StoreError`] so the
//! application can recover the original driver error with a downcast.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::capability::Capability;

/// Errors produced while registering, entering, committing or exiting units.
#[derive(Error, Debug)]
pub enum UowError {
    /// A repository or unit was registered under a name that is already taken
    #[error("{kind} '{name}' is already registered")]
    DuplicateName { kind: &'static str, name: String },

    /// An operation outside the repository's declared capability set was called
    #[error("repository '{repository}' does not support {capability}")]
    Capability {
        repository: String,
        capability: Capability,
    },

    /// A repository bound to another session was added to a unit
    #[error("repository '{repository}' is bound to a different session")]
    SessionMismatch { repository: String },

    /// Enter/commit/exit called out of order
    #[error("lifecycle violation: {0}")]
    Lifecycle(String),

    /// The store answered with a reply shape the caller did not expect
    #[error("unexpected store reply: {0}")]
    UnexpectedReply(String),

    /// Transport or driver failure from a backing store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Several exits failed; every failure is kept
    #[error("{} errors: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<UowError>),
}

impl UowError {
    pub fn lifecycle(msg: impl Into<String>) -> Self {
        UowError::Lifecycle(msg.into())
    }

    pub fn unexpected_reply(msg: impl Into<String>) -> Self {
        UowError::UnexpectedReply(msg.into())
    }

    /// Collapse a list of failures: none, the single error, or an aggregate.
    pub fn from_many(mut errors: Vec<UowError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(UowError::Aggregate(errors)),
        }
    }

    /// First store error in this error, looking inside aggregates.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            UowError::Store(e) => Some(e),
            UowError::Aggregate(errors) => errors.iter().find_map(UowError::store_error),
            _ => None,
        }
    }
}

fn join_errors(errors: &[UowError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failure reported by a backing store, tagged with the store it came from.
pub struct StoreError {
    store: &'static str,
    conflict: bool,
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl StoreError {
    pub fn new<E>(store: &'static str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            store,
            conflict: false,
            source: Box::new(source),
        }
    }

    /// A write rejected by a uniqueness constraint.
    pub fn conflict<E>(store: &'static str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            conflict: true,
            ..Self::new(store, source)
        }
    }

    /// Label of the store that failed (e.g. "postgres", "redis")
    pub fn store(&self) -> &'static str {
        self.store
    }

    pub fn is_conflict(&self) -> bool {
        self.conflict
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    /// Recover the original driver error by value.
    pub fn downcast<E: StdError + 'static>(self) -> Result<E, Self> {
        let Self {
            store,
            conflict,
            source,
        } = self;
        match source.downcast::<E>() {
            Ok(inner) => Ok(*inner),
            Err(source) => Err(Self {
                store,
                conflict,
                source,
            }),
        }
    }
}

impl fmt::Debug for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreError")
            .field("store", &self.store)
            .field("conflict", &self.conflict)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.store, self.source)
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Result type alias
pub type UowResult<T> = Result<T, UowError>;
