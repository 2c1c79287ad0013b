//! Shared types for the kitchen platform
//!
//! Error codes, the API error type and the domain models used by
//! kitchen-server and its clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
