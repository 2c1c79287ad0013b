//! Review Model

use serde::{Deserialize, Serialize};

/// Customer review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Review {
    pub id: String,
    pub name: String,
    pub details: String,
    pub rating: f64,
}

/// Create review payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCreate {
    pub name: String,
    #[serde(default)]
    pub details: String,
    pub rating: f64,
}
