//! Authentication and authorization
//!
//! - [`TokenService`] issues and verifies identity tokens
//! - [`require_identity`] / [`require_admin`] gate routes
//! - [`ensure_self`] / [`ensure_self_or_admin`] enforce per-resource ownership

pub mod guard;
pub mod jwt;

pub use guard::{Identity, ensure_self, ensure_self_or_admin, require_admin, require_identity};
pub use jwt::{IdentityClaims, TokenError, TokenService};
