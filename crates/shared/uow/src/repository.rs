//! Base repository contract.

use std::sync::Arc;

use crate::capability::{Capabilities, Capability};
use crate::error::{UowError, UowResult};
use crate::session::SessionId;

/// A per-entity data-access object bound to exactly one store session.
///
/// Concrete repositories declare a capability set at construction and call
/// [`Repository::require`] at the top of every operation, so an unsupported
/// call fails before touching the store.
pub trait Repository: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Session this repository issues its operations against
    fn session_id(&self) -> SessionId;

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }

    fn require(&self, capability: Capability) -> UowResult<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(UowError::Capability {
                repository: self.name().to_string(),
                capability,
            })
        }
    }
}

/// Turns a typed repository handle into the plain [`Repository`] handle a
/// unit of work stores. Implemented for every sized repository, so traits
/// that list it as a supertrait can be upcast from their trait objects.
pub trait AsRepository {
    fn as_repository(self: Arc<Self>) -> Arc<dyn Repository>;
}

impl<T: Repository + 'static> AsRepository for T {
    fn as_repository(self: Arc<Self>) -> Arc<dyn Repository> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly {
        session: SessionId,
    }

    impl Repository for ReadOnly {
        fn name(&self) -> &str {
            "read_only"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::READ_ONLY
        }

        fn session_id(&self) -> SessionId {
            self.session
        }
    }

    #[test]
    fn test_require_supported_capability() {
        let repo = ReadOnly {
            session: SessionId::next(),
        };
        assert!(repo.require(Capability::Retrieve).is_ok());
    }

    #[test]
    fn test_require_unsupported_capability() {
        let repo = ReadOnly {
            session: SessionId::next(),
        };
        let err = repo.require(Capability::Delete).unwrap_err();
        match err {
            UowError::Capability {
                repository,
                capability,
            } => {
                assert_eq!(repository, "read_only");
                assert_eq!(capability, Capability::Delete);
            }
            other => panic!("expected capability error, got {other:?}"),
        }
    }

    #[test]
    fn test_as_repository_keeps_identity() {
        let session = SessionId::next();
        let repo = Arc::new(ReadOnly { session });
        let erased = repo.as_repository();
        assert_eq!(erased.session_id(), session);
        assert_eq!(erased.name(), "read_only");
    }
}
