//! # API REST
//!
//! REST API implementation for the Retria triage system.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! Uses `api-shared` for wire types and `retria-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod routes;

pub use routes::{app, serve, AppState};
