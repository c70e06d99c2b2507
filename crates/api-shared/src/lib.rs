//! # API Shared
//!
//! Shared wire definitions for the Retria APIs.
//!
//! Contains:
//! - Request/response DTOs (`wire` module) with serde and OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the root server binary. Timestamps cross the wire
//! as RFC 3339 strings and dates as `YYYY-MM-DD`; translation to and from
//! `chrono` types happens at the REST layer.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
