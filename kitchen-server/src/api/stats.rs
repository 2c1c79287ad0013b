//! Reporting endpoints

use axum::{Json, extract::State};
use shared::models::{CategoryStats, DashboardStats, SettlementIssue};

use crate::state::AppState;

use super::ApiResult;

/// GET /admin-stats (admin)
pub async fn admin_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    Ok(Json(state.reporting.dashboard_stats().await?))
}

/// GET /order-stats
pub async fn order_stats(State(state): State<AppState>) -> ApiResult<Vec<CategoryStats>> {
    Ok(Json(state.reporting.order_stats_by_category().await?))
}

/// GET /settlement-issues (admin)
pub async fn settlement_issues(State(state): State<AppState>) -> ApiResult<Vec<SettlementIssue>> {
    Ok(Json(state.store.list_settlement_issues().await?))
}
