//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.

pub mod article;
pub mod constants;
pub mod error;
pub mod password;
pub mod token;
pub mod topic;
pub mod user;

pub use article::{Article, ArticleChanges};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::Password;
pub use token::{TokenPair, TokenType};
pub use topic::{seeded_topics, Topic};
pub use user::{User, UserResponse};
