//! # Sale Repository
//!
//! The sale transaction, sale history and voiding.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   │                                                                     │
//! │   ├── 1. upsert sale_sequences(day) RETURNING last_value                │
//! │   │       (first statement is a write → we hold the write lock)         │
//! │   ├── 2. customer exists?                    no → NotFound, rollback    │
//! │   ├── 3. INSERT sales (total_amount = 0)                                │
//! │   ├── 4. for each line:                                                 │
//! │   │       product active?                    no → NotFound, rollback    │
//! │   │       INSERT sale_items                                             │
//! │   │       stock_quantity -= qty (policy)     reject → 409, rollback     │
//! │   ├── 5. UPDATE sales SET total_amount = Σ lines − discount             │
//! │   ▼                                                                     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `?` between `begin()` and `commit()` drops the `Transaction`,
//! which rolls it back: no sale row, no items, no stock change.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::product::apply_stock_delta;
use kade_core::sale::{format_sale_number, NewSale};
use kade_core::{
    BalancePolicy, Money, Sale, SaleDetail, SaleItemDetail, SaleReceipt, SaleStatus, SaleSummary,
};

/// Default page size of `GET /sales`.
pub const DEFAULT_SALE_LIMIT: i64 = 50;

/// Largest page size of `GET /sales`.
pub const MAX_SALE_LIMIT: i64 = 500;

const SELECT_SALE_SUMMARY: &str = r#"
    SELECT s.id, s.sale_number, s.sale_day, s.customer_id, s.total_amount,
           s.payment_method, s.discount_amount, s.status, s.created_at,
           s.voided_at, c.name AS customer_name
    FROM sales s
    LEFT JOIN customers c ON c.id = s.customer_id
"#;

/// Query parameters of `GET /sales`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleFilter {
    /// First business day included.
    pub start_date: Option<NaiveDate>,
    /// Last business day included.
    pub end_date: Option<NaiveDate>,
    /// Page size, clamped to 1..=500. Default 50.
    pub limit: Option<i64>,
}

impl SaleFilter {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_SALE_LIMIT)
            .clamp(1, MAX_SALE_LIMIT)
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    stock_policy: BalancePolicy,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, stock_policy: BalancePolicy) -> Self {
        SaleRepository { pool, stock_policy }
    }

    /// Records a sale, its items and the stock decrements as one unit.
    ///
    /// `at` becomes `created_at`; `sale_day` is the business day the sale
    /// number is drawn from (see `kade_core::sale::business_day`).
    ///
    /// ## Returns
    /// * `Ok(SaleReceipt)` - Committed
    /// * `Err(DbError::Rejected(..))` - Request failed validation, or the
    ///   stock policy refused a line
    /// * `Err(DbError::NotFound)` - Unknown customer or product
    pub async fn create_sale(
        &self,
        new_sale: &NewSale,
        at: DateTime<Utc>,
        sale_day: NaiveDate,
    ) -> DbResult<SaleReceipt> {
        new_sale.validate()?;

        debug!(
            lines = new_sale.items.len(),
            customer_id = ?new_sale.customer_id,
            %sale_day,
            "Creating sale"
        );

        let mut tx = self.pool.begin().await?;

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sale_sequences (sale_day, last_value) VALUES (?1, 1)
            ON CONFLICT (sale_day) DO UPDATE SET last_value = last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(sale_day)
        .fetch_one(&mut *tx)
        .await?;
        let sale_number = format_sale_number(sale_day, sequence);

        if let Some(customer_id) = new_sale.customer_id {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
                .bind(customer_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Customer", customer_id));
            }
        }

        let sale_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sales (
                sale_number, sale_day, customer_id, total_amount,
                payment_method, discount_amount, status, created_at
            ) VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(&sale_number)
        .bind(sale_day)
        .bind(new_sale.customer_id)
        .bind(new_sale.payment_method)
        .bind(new_sale.discount)
        .bind(SaleStatus::Completed)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        let mut subtotal = Money::zero();
        for line in &new_sale.items {
            let active: Option<i64> =
                sqlx::query_scalar("SELECT id FROM products WHERE id = ?1 AND is_active = 1")
                    .bind(line.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if active.is_none() {
                return Err(DbError::not_found("Product", line.product_id));
            }

            let line_total = line.line_total();

            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, total_price)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line_total)
            .execute(&mut *tx)
            .await?;

            apply_stock_delta(&mut *tx, line.product_id, -line.quantity, self.stock_policy).await?;

            subtotal += line_total;
        }

        let total = subtotal - new_sale.discount;

        sqlx::query("UPDATE sales SET total_amount = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(total)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            sale_id,
            sale_number = %sale_number,
            total = %total,
            "Sale completed"
        );

        Ok(SaleReceipt {
            id: sale_id,
            sale_number,
            total_amount: total,
            created_at: at,
        })
    }

    /// Gets a sale with its customer name and items.
    pub async fn get_detail(&self, id: i64) -> DbResult<SaleDetail> {
        debug!(id = %id, "Getting sale");

        let sql = format!("{SELECT_SALE_SUMMARY} WHERE s.id = ?1");
        let summary = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let items = self.get_items(id).await?;

        Ok(SaleDetail { summary, items })
    }

    /// Gets the items of a sale joined with product names.
    ///
    /// Soft-deleted products still resolve, so old receipts keep their names.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleItemDetail>> {
        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT si.id, si.sale_id, si.product_id, si.quantity, si.unit_price,
                   si.total_price, p.name AS product_name
            FROM sale_items si
            LEFT JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ?1
            ORDER BY si.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales newest first, optionally within a range of business days.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<SaleSummary>> {
        let limit = filter.effective_limit();
        debug!(start = ?filter.start_date, end = ?filter.end_date, limit, "Listing sales");

        let sql = format!(
            "{SELECT_SALE_SUMMARY}
             WHERE (?1 IS NULL OR s.sale_day >= ?1)
               AND (?2 IS NULL OR s.sale_day <= ?2)
             ORDER BY s.created_at DESC, s.id DESC
             LIMIT ?3"
        );

        let sales = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Voids a completed sale and puts its stock back, in one transaction.
    ///
    /// Stock is restored even for products deleted since the sale. Voiding
    /// twice is "not found" the second time.
    pub async fn void_sale(&self, id: i64, at: DateTime<Utc>) -> DbResult<Sale> {
        debug!(id = %id, "Voiding sale");

        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET status = ?2, voided_at = ?3
            WHERE id = ?1 AND status = ?4
            RETURNING id, sale_number, sale_day, customer_id, total_amount,
                      payment_method, discount_amount, status, created_at, voided_at
            "#,
        )
        .bind(id)
        .bind(SaleStatus::Voided)
        .bind(at)
        .bind(SaleStatus::Completed)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

        let restored = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + (
                    SELECT COALESCE(SUM(si.quantity), 0)
                    FROM sale_items si
                    WHERE si.sale_id = ?1 AND si.product_id = products.id
                ),
                updated_at = ?2
            WHERE id IN (SELECT product_id FROM sale_items WHERE sale_id = ?1)
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            sale_id = id,
            sale_number = %sale.sale_number,
            products = restored.rows_affected(),
            "Sale voided"
        );

        Ok(sale)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, memory_db_with};
    use crate::repository::BalancePolicies;
    use crate::Database;
    use chrono::TimeZone;
    use kade_core::sale::SaleLine;
    use kade_core::{CoreError, CustomerInput, PaymentMethod, ProductInput};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, hour, min, 0).unwrap()
    }

    async fn product(db: &Database, name: &str, price: i64, stock: i64) -> i64 {
        db.products()
            .create(&ProductInput {
                name: name.to_string(),
                price: Money::from_cents(price),
                stock_quantity: stock,
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    /// Sales numbered on `day`, voided ones included.
    async fn sales_on(db: &Database, day: NaiveDate) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_day = ?1")
            .bind(day)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    fn sale(lines: &[(i64, i64, i64)], discount: i64) -> NewSale {
        NewSale {
            customer_id: None,
            items: lines
                .iter()
                .map(|&(product_id, quantity, price)| SaleLine {
                    product_id,
                    quantity,
                    unit_price: Money::from_cents(price),
                })
                .collect(),
            payment_method: PaymentMethod::Cash,
            discount: Money::from_cents(discount),
        }
    }

    #[tokio::test]
    async fn test_rice_sale() {
        let db = memory_db().await;
        let rice = product(&db, "Rice", 500, 10).await;

        let receipt = db
            .sales()
            .create_sale(&sale(&[(rice, 3, 500)], 50), at(10, 0), day())
            .await
            .unwrap();

        assert_eq!(receipt.sale_number, "SALE-2024-03-05-001");
        assert_eq!(receipt.total_amount, Money::from_cents(1450));
        assert_eq!(receipt.created_at, at(10, 0));
        assert_eq!(db.products().get_by_id(rice).await.unwrap().stock_quantity, 7);

        let detail = db.sales().get_detail(receipt.id).await.unwrap();
        assert_eq!(detail.summary.sale.total_amount, Money::from_cents(1450));
        assert_eq!(detail.summary.sale.discount_amount, Money::from_cents(50));
        assert_eq!(detail.summary.sale.status, SaleStatus::Completed);
        assert_eq!(detail.summary.customer_name, None);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item.quantity, 3);
        assert_eq!(detail.items[0].item.total_price, Money::from_cents(1500));
        assert_eq!(detail.items[0].product_name.as_deref(), Some("Rice"));
    }

    #[tokio::test]
    async fn test_sale_numbers_count_up_per_day() {
        let db = memory_db().await;
        let p = product(&db, "Bread White", 12000, 100).await;
        let sales = db.sales();

        let first = sales.create_sale(&sale(&[(p, 1, 12000)], 0), at(9, 0), day()).await.unwrap();
        let second = sales.create_sale(&sale(&[(p, 1, 12000)], 0), at(9, 5), day()).await.unwrap();
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let third = sales
            .create_sale(&sale(&[(p, 1, 12000)], 0), at(23, 59), next_day)
            .await
            .unwrap();

        assert_eq!(first.sale_number, "SALE-2024-03-05-001");
        assert_eq!(second.sale_number, "SALE-2024-03-05-002");
        assert_eq!(third.sale_number, "SALE-2024-03-06-001");
        assert_eq!(sales_on(&db, day()).await, 2);
    }

    #[tokio::test]
    async fn test_stock_can_reach_exactly_zero() {
        let db = memory_db_with(BalancePolicies {
            stock: BalancePolicy::Reject,
            ..Default::default()
        })
        .await;
        let p = product(&db, "Cheese Block", 68000, 2).await;

        db.sales().create_sale(&sale(&[(p, 2, 68000)], 0), at(11, 0), day()).await.unwrap();
        assert_eq!(db.products().get_by_id(p).await.unwrap().stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_missing_product_rolls_back_everything() {
        let db = memory_db().await;
        let rice = product(&db, "Rice", 500, 10).await;

        let err = db
            .sales()
            .create_sale(&sale(&[(rice, 2, 500), (9999, 1, 100)], 0), at(10, 0), day())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "Product", .. }));

        assert_eq!(db.products().get_by_id(rice).await.unwrap().stock_quantity, 10);
        assert!(db.sales().list(&SaleFilter::default()).await.unwrap().is_empty());
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 0);

        // The rolled-back sale did not consume a sequence number.
        let receipt = db
            .sales()
            .create_sale(&sale(&[(rice, 1, 500)], 0), at(10, 1), day())
            .await
            .unwrap();
        assert_eq!(receipt.sale_number, "SALE-2024-03-05-001");
    }

    #[tokio::test]
    async fn test_deleted_product_cannot_be_sold() {
        let db = memory_db().await;
        let p = product(&db, "Leeks", 9000, 5).await;
        db.products().soft_delete(p).await.unwrap();

        let err = db
            .sales()
            .create_sale(&sale(&[(p, 1, 9000)], 0), at(10, 0), day())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let db = memory_db().await;
        let p = product(&db, "Rice", 500, 10).await;

        let mut request = sale(&[(p, 1, 500)], 0);
        request.customer_id = Some(404);
        let err = db.sales().create_sale(&request, at(10, 0), day()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "Customer", .. }));
        assert_eq!(db.products().get_by_id(p).await.unwrap().stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_stock_policies_in_sales() {
        // allow: stock goes negative
        let db = memory_db().await;
        let p = product(&db, "Tomatoes", 12000, 1).await;
        db.sales().create_sale(&sale(&[(p, 3, 12000)], 0), at(10, 0), day()).await.unwrap();
        assert_eq!(db.products().get_by_id(p).await.unwrap().stock_quantity, -2);

        // clamp: floored at zero, sale still recorded
        let db = memory_db_with(BalancePolicies {
            stock: BalancePolicy::Clamp,
            ..Default::default()
        })
        .await;
        let p = product(&db, "Tomatoes", 12000, 1).await;
        db.sales().create_sale(&sale(&[(p, 3, 12000)], 0), at(10, 0), day()).await.unwrap();
        assert_eq!(db.products().get_by_id(p).await.unwrap().stock_quantity, 0);

        // reject: refused, nothing recorded
        let db = memory_db_with(BalancePolicies {
            stock: BalancePolicy::Reject,
            ..Default::default()
        })
        .await;
        let p = product(&db, "Tomatoes", 12000, 1).await;
        let err = db
            .sales()
            .create_sale(&sale(&[(p, 3, 12000)], 0), at(10, 0), day())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientStock { available: 1, requested: 3, .. })
        ));
        assert_eq!(db.products().get_by_id(p).await.unwrap().stock_quantity, 1);
        assert_eq!(sales_on(&db, day()).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_request_never_touches_database() {
        let db = memory_db().await;
        let err = db
            .sales()
            .create_sale(&sale(&[], 0), at(10, 0), day())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::EmptySale)));
        assert_eq!(sales_on(&db, day()).await, 0);
    }

    #[tokio::test]
    async fn test_list_filters_and_customer_name() {
        let db = memory_db().await;
        let p = product(&db, "Tea Bags", 28000, 50).await;
        let customer = db
            .customers()
            .create(&CustomerInput {
                name: "John Doe".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut with_customer = sale(&[(p, 1, 28000)], 0);
        with_customer.customer_id = Some(customer.id);

        let d1 = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let d2 = day();
        db.sales().create_sale(&sale(&[(p, 1, 28000)], 0), at(8, 0) - chrono::Duration::days(1), d1).await.unwrap();
        db.sales().create_sale(&with_customer, at(9, 0), d2).await.unwrap();
        db.sales().create_sale(&sale(&[(p, 2, 28000)], 0), at(10, 0), d2).await.unwrap();

        let all = db.sales().list(&SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        // Newest first.
        assert_eq!(all[0].sale.sale_number, "SALE-2024-03-05-002");
        assert_eq!(all[1].customer_name.as_deref(), Some("John Doe"));

        let only_d1 = db
            .sales()
            .list(&SaleFilter { start_date: Some(d1), end_date: Some(d1), limit: None })
            .await
            .unwrap();
        assert_eq!(only_d1.len(), 1);
        assert_eq!(only_d1[0].sale.sale_number, "SALE-2024-03-04-001");

        let limited = db
            .sales()
            .list(&SaleFilter { limit: Some(1), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(SaleFilter::default().effective_limit(), 50);
        assert_eq!(SaleFilter { limit: Some(0), ..Default::default() }.effective_limit(), 1);
        assert_eq!(SaleFilter { limit: Some(10_000), ..Default::default() }.effective_limit(), 500);
    }

    #[tokio::test]
    async fn test_void_restores_stock_once() {
        let db = memory_db().await;
        let a = product(&db, "Sugar White", 15000, 10).await;
        let b = product(&db, "Dhal Red", 22000, 10).await;

        let receipt = db
            .sales()
            .create_sale(&sale(&[(a, 2, 15000), (b, 1, 22000), (a, 1, 15000)], 0), at(12, 0), day())
            .await
            .unwrap();
        assert_eq!(db.products().get_by_id(a).await.unwrap().stock_quantity, 7);

        // Deleting a product does not block restoring its stock.
        db.products().soft_delete(b).await.unwrap();

        let voided = db.sales().void_sale(receipt.id, at(12, 30)).await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);
        assert_eq!(voided.voided_at, Some(at(12, 30)));
        assert_eq!(db.products().get_by_id(a).await.unwrap().stock_quantity, 10);

        let b_stock: i64 = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(b)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(b_stock, 10);

        let again = db.sales().void_sale(receipt.id, at(13, 0)).await.unwrap_err();
        assert!(again.is_not_found());
        assert!(db.sales().void_sale(999, at(13, 0)).await.unwrap_err().is_not_found());
        assert_eq!(db.products().get_by_id(a).await.unwrap().stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_get_missing_sale() {
        let db = memory_db().await;
        let err = db.sales().get_detail(1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "Sale", .. }));
    }
}
