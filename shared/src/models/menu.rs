//! Menu Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu item entity (reference data joined during reporting)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub recipe: String,
    pub image: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: Option<i32>,
}

/// Create / update menu item payload (full replacement of editable fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemInput {
    pub name: String,
    #[serde(default)]
    pub recipe: String,
    #[serde(default)]
    pub image: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: Option<i32>,
}
