//! Articles aggregator - articles with authors, topics and a cache of the
//! most viewed recent articles.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Settings loaded from the environment
//! - **infra**: PostgreSQL and Redis clients, sessions and the store context
//! - **repositories**: Data access bound to one store session each
//! - **services**: Use cases composed from units of work
//! - **scheduler**: Periodic popular-articles refresh
//! - **api**: HTTP handlers, middleware, and routes
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -p articles-service -- serve
//!
//! # Run migrations
//! cargo run -p articles-service -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod infra;
pub mod repositories;
pub mod scheduler;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use api::AppState;
pub use config::Config;
