//! kitchen-server: restaurant ordering backend
//!
//! Issues identity tokens, gates routes by identity and role, settles
//! payments against carts, and serves the menu, reviews and admin reports.

pub mod api;
pub mod assistant;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod reporting;
pub mod state;
pub mod stripe;

pub use config::Config;
pub use state::AppState;

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
