//! Application services layer - Use cases and business logic.
//!
//! Every operation builds its own sessions, repositories and units of work
//! from a [`StoreContext`](crate::infra::StoreContext), runs inside their
//! scope and commits explicitly.

mod article_service;
mod auth_service;
pub mod container;
mod user_service;
pub mod workspace;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use article_service::{ArticleManager, ArticleService};
pub use auth_service::{AuthService, Authenticator, Claims};
pub use user_service::{UserManager, UserService};
pub use workspace::{composite, UnitBuilder, UowName};

#[cfg(any(test, feature = "test-utils"))]
pub use article_service::MockArticleService;
#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use user_service::MockUserService;
