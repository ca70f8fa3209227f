//! API layer - HTTP handlers and middleware
//!
//! This module contains all HTTP-related concerns:
//! - Request handlers
//! - Authentication middleware
//! - Validating JSON extractor
//! - Route definitions and the OpenAPI document
//! - The GraphQL schema

pub mod extractors;
pub mod graphql;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
