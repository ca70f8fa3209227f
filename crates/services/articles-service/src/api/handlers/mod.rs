//! HTTP request handlers.

pub mod article_handler;
pub mod auth_handler;
pub mod user_handler;

pub use article_handler::{article_routes, protected_article_routes};
pub use auth_handler::auth_routes;
pub use user_handler::{protected_user_routes, user_routes};
