//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP server and the popular-articles job
//! - `migrate` - Database migrations

pub mod args;

pub use args::{Cli, Commands};
