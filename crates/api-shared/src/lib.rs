//! # API Shared
//!
//! Shared request/response definitions for the readmission-risk APIs.
//!
//! Contains:
//! - JSON models with OpenAPI schemas (`models` module)
//! - Conversions from core types into those models
//! - Shared services like `HealthService`

pub mod health;
pub mod models;

pub use health::HealthService;
pub use models::*;
