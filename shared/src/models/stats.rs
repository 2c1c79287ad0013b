//! Reporting Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Admin dashboard aggregate
///
/// Counts may be store-level estimates; `revenue` is exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users: i64,
    pub menu_items: i64,
    pub orders: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

/// Per-category order aggregate
///
/// `revenue` is the sum of the *current* menu price of each ordered line,
/// which can differ from what was actually paid if prices changed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CategoryStats {
    pub category: String,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}
