//! Data models
//!
//! Shared between kitchen-server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUID strings.

pub mod cart;
pub mod menu;
pub mod payment;
pub mod review;
pub mod stats;
pub mod user;

// Re-exports
pub use cart::*;
pub use menu::*;
pub use payment::*;
pub use review::*;
pub use stats::*;
pub use user::*;
