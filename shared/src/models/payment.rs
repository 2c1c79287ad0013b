//! Payment Model
//!
//! A payment is immutable once recorded. `cart_ids` are the cart items the
//! payment consumed; `menu_item_ids` are the menu items those cart items
//! pointed at (one entry per ordered line, duplicates allowed).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Recorded payment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub email: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub transaction_id: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "cartId")]
    pub cart_ids: Vec<String>,
    #[serde(rename = "menuItemId")]
    pub menu_item_ids: Vec<String>,
    pub status: String,
}

/// Payment draft as submitted by the client after the processor confirmed it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub email: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub transaction_id: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "cartId", default)]
    pub cart_ids: Vec<String>,
    #[serde(rename = "menuItemId", default)]
    pub menu_item_ids: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Reconciliation record for a payment whose cart cleanup came up short
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SettlementIssue {
    pub id: String,
    pub payment_id: String,
    pub email: String,
    pub missing_cart_ids: Vec<String>,
    pub created_at: i64,
}
