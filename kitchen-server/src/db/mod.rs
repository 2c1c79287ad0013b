//! Database access layer
//!
//! Handlers and services talk to the store through the traits below so the
//! router can run against PostgreSQL in production and against
//! [`MemoryStore`] in tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    CartItem, CartItemCreate, CategoryStats, MenuItem, MenuItemInput, Payment, PaymentDraft,
    Review, ReviewCreate, SettlementIssue, User, UserCreate,
};
use thiserror::Error;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.message().to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Insert unless a user with the same email exists.
    ///
    /// Returns the new id, or `None` when the email was already present.
    async fn insert_user_if_absent(&self, user: UserCreate) -> StoreResult<Option<String>>;

    /// Grant the admin role. Returns `false` when no user has `id`.
    async fn promote_to_admin(&self, id: &str) -> StoreResult<bool>;

    /// Returns `false` when no user has `id`.
    async fn delete_user(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn list_menu(&self) -> StoreResult<Vec<MenuItem>>;

    async fn find_menu_item(&self, id: &str) -> StoreResult<Option<MenuItem>>;

    async fn insert_menu_item(&self, input: MenuItemInput) -> StoreResult<MenuItem>;

    async fn update_menu_item(&self, id: &str, input: MenuItemInput)
    -> StoreResult<Option<MenuItem>>;

    async fn delete_menu_item(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_reviews(&self) -> StoreResult<Vec<Review>>;

    async fn insert_review(&self, review: ReviewCreate) -> StoreResult<Review>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn list_cart(&self, email: &str) -> StoreResult<Vec<CartItem>>;

    async fn insert_cart_item(&self, item: CartItemCreate) -> StoreResult<CartItem>;

    async fn find_cart_item(&self, id: &str) -> StoreResult<Option<CartItem>>;

    async fn delete_cart_item(&self, id: &str) -> StoreResult<bool>;
}

/// What a settlement transaction did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRecord {
    pub payment_id: String,
    pub deleted_count: u64,
    /// Referenced cart ids that were not removed (already gone or owned by
    /// another identity)
    pub missing_cart_ids: Vec<String>,
}

/// Transactional settlement capability
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Record `draft` and remove the cart items it references, atomically.
    ///
    /// Only cart items owned by `draft.email` are removed. When fewer items
    /// are removed than referenced, a [`SettlementIssue`] is written in the
    /// same transaction. A `transaction_id` already on record yields
    /// [`StoreError::Duplicate`] and changes nothing.
    async fn settle(&self, draft: &PaymentDraft) -> StoreResult<SettlementRecord>;

    async fn list_payments(&self, email: &str) -> StoreResult<Vec<Payment>>;

    async fn list_settlement_issues(&self) -> StoreResult<Vec<SettlementIssue>>;
}

/// Read-only aggregates for reporting
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Estimated document counts: `(users, menu_items, payments)`
    async fn estimated_counts(&self) -> StoreResult<(i64, i64, i64)>;

    /// Exact sum of payment prices, zero when there are none
    async fn total_revenue(&self) -> StoreResult<Decimal>;

    /// Per-category quantity and revenue over payment menu item ids,
    /// sorted by category
    async fn order_stats_by_category(&self) -> StoreResult<Vec<CategoryStats>>;
}

/// Every capability the router needs from one backend
pub trait Store:
    UserStore + MenuStore + ReviewStore + CartStore + SettlementStore + ReportStore
{
}

impl<T> Store for T where
    T: UserStore + MenuStore + ReviewStore + CartStore + SettlementStore + ReportStore
{
}
