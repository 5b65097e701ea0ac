//! # Dashboard Repository
//!
//! Read-only aggregates for the dashboard tiles. One round trip, all
//! sub-selects, zeros on an empty database.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kade_core::DashboardStats;

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Computes the dashboard as of business day `day`.
    ///
    /// Only active products and completed sales are counted.
    pub async fn stats(&self, day: NaiveDate) -> DbResult<DashboardStats> {
        debug!(%day, "Computing dashboard stats");

        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE is_active = 1) AS total_products,
                (SELECT COUNT(*) FROM products
                  WHERE is_active = 1 AND stock_quantity <= min_stock_level) AS low_stock_items,
                (SELECT COUNT(*) FROM customers) AS total_customers,
                (SELECT COALESCE(SUM(total_amount), 0) FROM sales
                  WHERE status = 'completed' AND sale_day = ?1) AS today_sales,
                (SELECT COALESCE(SUM(total_amount), 0) FROM sales
                  WHERE status = 'completed') AS total_sales,
                (SELECT COUNT(*) FROM sales
                  WHERE status = 'completed' AND sale_day = ?1) AS today_sales_count
            "#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
