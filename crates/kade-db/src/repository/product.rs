//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Listing with substring search and category filter
//! - CRUD with soft delete
//! - Stock deltas under a [`BalancePolicy`]
//!
//! ## Soft Delete and Barcodes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                                                               │
//! │  id │ barcode │ is_active                                               │
//! │  ───┼─────────┼──────────                                               │
//! │   1 │ RICE001 │ 0          ← deleted, still joined by old sale items    │
//! │   9 │ RICE001 │ 1          ← re-created, allowed by the partial index   │
//! │                                                                         │
//! │  UNIQUE INDEX ON products(barcode) WHERE is_active = 1                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Every read here filters on `is_active = 1`; a deleted product is
//! "not found" everywhere except in sale history.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{balance_update, like_pattern};
use kade_core::validation::validate_balance_delta;
use kade_core::{BalancePolicy, CoreError, Product, ProductInput};

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, barcode, description, category, price, cost,
           stock_quantity, min_stock_level, supplier, image_url,
           is_active, created_at, updated_at
    FROM products
"#;

/// Query parameters of `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Substring of name or barcode.
    pub search: Option<String>,
    /// Exact category.
    pub category: Option<String>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let rice = repo.list(&ProductFilter { search: Some("rice".into()), ..Default::default() }).await?;
/// let product = repo.get_by_barcode("RICE001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products ordered by name.
    ///
    /// `search` matches anywhere in the name or barcode; `category` must
    /// match exactly. Blank filters are ignored. No pagination.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        debug!(search = ?search, category = ?category, "Listing products");

        let sql = format!(
            "{SELECT_PRODUCT}
             WHERE is_active = 1
               AND (?1 IS NULL OR name LIKE ?1 ESCAPE '\\' OR barcode LIKE ?1 ESCAPE '\\')
               AND (?2 IS NULL OR category = ?2)
             ORDER BY name COLLATE NOCASE, id"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(search.map(like_pattern))
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets an active product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Product> {
        debug!(id = %id, "Getting product by ID");

        let sql = format!("{SELECT_PRODUCT} WHERE id = ?1 AND is_active = 1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets an active product by exact barcode.
    ///
    /// Used by the register when a barcode scanner sends a code.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Product> {
        let barcode = barcode.trim();
        debug!(barcode = %barcode, "Getting product by barcode");

        let sql = format!("{SELECT_PRODUCT} WHERE barcode = ?1 AND is_active = 1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", barcode))
    }

    /// Distinct categories of active products, for the filter dropdown.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products
             WHERE is_active = 1 AND category IS NOT NULL
             ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Inserts a new product.
    ///
    /// The input should already be normalized
    /// ([`ProductInput::normalized`]). A duplicate barcode surfaces as
    /// [`DbError::UniqueViolation`] carrying SQLite's message.
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        debug!(name = %input.name, barcode = ?input.barcode, "Inserting product");

        let now = Utc::now();

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, barcode, description, category, price, cost,
                stock_quantity, min_stock_level, supplier, image_url,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)
            RETURNING id, name, barcode, description, category, price, cost,
                      stock_quantity, min_stock_level, supplier, image_url,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.barcode)
        .bind(&input.description)
        .bind(&input.category)
        .bind(input.price)
        .bind(input.cost)
        .bind(input.stock_quantity)
        .bind(input.min_stock_level)
        .bind(&input.supplier)
        .bind(&input.image_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = product.id, "Product inserted");
        Ok(product)
    }

    /// Replaces every mutable field of an active product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The row as stored
    /// * `Err(DbError::NotFound)` - No active product with this ID
    pub async fn update(&self, id: i64, input: &ProductInput) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();

        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = ?2,
                barcode = ?3,
                description = ?4,
                category = ?5,
                price = ?6,
                cost = ?7,
                stock_quantity = ?8,
                min_stock_level = ?9,
                supplier = ?10,
                image_url = ?11,
                updated_at = ?12
            WHERE id = ?1 AND is_active = 1
            RETURNING id, name, barcode, description, category, price, cost,
                      stock_quantity, min_stock_level, supplier, image_url,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.barcode)
        .bind(&input.description)
        .bind(&input.category)
        .bind(input.price)
        .bind(input.cost)
        .bind(input.stock_quantity)
        .bind(input.min_stock_level)
        .bind(&input.supplier)
        .bind(&input.image_url)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product by setting is_active = 0.
    ///
    /// Historical sale items keep pointing at the row, so receipts still
    /// show the product name. Deleting twice is "not found" the second time.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2
             WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Applies a stock delta outside of a sale (restock, count correction).
    ///
    /// Returns the new stock level. `|delta|` is bounded by
    /// MAX_BALANCE_DELTA so the sum cannot leave the i64 range.
    pub async fn adjust_stock(
        &self,
        id: i64,
        delta: i64,
        policy: BalancePolicy,
    ) -> DbResult<i64> {
        validate_balance_delta("delta", delta).map_err(CoreError::from)?;

        let mut conn = self.pool.acquire().await?;
        apply_stock_delta(&mut *conn, id, delta, policy).await
    }
}

/// Changes an active product's stock by `delta` under `policy`, on the
/// caller's connection so it can run inside a sale transaction.
///
/// ## Delta Update
/// ```text
/// ❌ Read-modify-write:  SELECT stock → 10;  UPDATE ... SET stock = 7
/// ✅ Delta in SQL:       UPDATE ... SET stock_quantity = stock_quantity + ?1
/// ```
/// The policy is folded into the same statement (see
/// [`balance_update`](crate::repository::balance_update)).
///
/// ## Returns
/// * `Ok(i64)` - The new stock level
/// * `Err(DbError::NotFound)` - No active product with this ID
/// * `Err(DbError::Rejected(InsufficientStock))` - `reject` refused the change
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    id: i64,
    delta: i64,
    policy: BalancePolicy,
) -> DbResult<i64> {
    debug!(id = %id, delta = %delta, policy = %policy, "Updating stock");

    let (set, guard) = balance_update(policy, "stock_quantity");
    let sql = format!(
        "UPDATE products SET {set}, updated_at = ?3
         WHERE id = ?2 AND is_active = 1{guard}
         RETURNING stock_quantity"
    );

    let updated: Option<i64> = sqlx::query_scalar(&sql)
        .bind(delta)
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(stock) = updated {
        return Ok(stock);
    }

    let available: Option<i64> = sqlx::query_scalar(
        "SELECT stock_quantity FROM products WHERE id = ?1 AND is_active = 1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match available {
        None => Err(DbError::not_found("Product", id)),
        Some(available) => Err(CoreError::InsufficientStock {
            product_id: id,
            available,
            requested: delta.saturating_neg(),
        }
        .into()),
    }
}

// =============================================================================
// Tests
// =============================================================================
