//! Dashboard and per-category order statistics

use std::sync::Arc;

use shared::models::{CategoryStats, DashboardStats};

use crate::db::{ReportStore, StoreResult};

#[derive(Clone)]
pub struct ReportingAggregator {
    store: Arc<dyn ReportStore>,
}

impl ReportingAggregator {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Counts are store estimates; revenue is exact.
    pub async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let (counts, revenue) =
            tokio::try_join!(self.store.estimated_counts(), self.store.total_revenue())?;
        let (users, menu_items, orders) = counts;

        Ok(DashboardStats {
            users,
            menu_items,
            orders,
            revenue,
        })
    }

    /// Revenue is summed at the current menu price, not the price paid.
    pub async fn order_stats_by_category(&self) -> StoreResult<Vec<CategoryStats>> {
        self.store.order_stats_by_category().await
    }
}
