//! # API Shared
//!
//! Shared utilities and definitions for OpenRoom APIs.
//!
//! Contains:
//! - Request/response bodies (`dto` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//! - Bearer-token authentication helpers
//!
//! Used by `api-rest`, and by the CLI for its JSON output.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
