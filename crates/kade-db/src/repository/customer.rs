//! # Customer Repository
//!
//! Customers and their loyalty point balances.
//!
//! Customers are hard-deleted. Their past sales stay on the books with
//! `customer_id` set to NULL (`ON DELETE SET NULL`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{balance_update, like_pattern};
use kade_core::validation::validate_balance_delta;
use kade_core::{BalancePolicy, CoreError, Customer, CustomerInput};

const CUSTOMER_COLUMNS: &str =
    "id, name, email, phone, address, loyalty_points, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    loyalty_policy: BalancePolicy,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool, loyalty_policy: BalancePolicy) -> Self {
        CustomerRepository {
            pool,
            loyalty_policy,
        }
    }

    /// Lists customers ordered by name.
    ///
    /// `search` matches anywhere in the name, email or phone number.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Customer>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        debug!(search = ?search, "Listing customers");

        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE ?1 IS NULL
                OR name LIKE ?1 ESCAPE '\\'
                OR email LIKE ?1 ESCAPE '\\'
                OR phone LIKE ?1 ESCAPE '\\'
             ORDER BY name COLLATE NOCASE, id"
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(search.map(like_pattern))
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Customer> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Inserts a new customer with zero loyalty points.
    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        debug!(name = %input.name, "Inserting customer");

        let sql = format!(
            "INSERT INTO customers (name, email, phone, address, loyalty_points, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
             RETURNING {CUSTOMER_COLUMNS}"
        );

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Replaces a customer's contact details. Loyalty points are untouched.
    pub async fn update(&self, id: i64, input: &CustomerInput) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let sql = format!(
            "UPDATE customers SET name = ?2, email = ?3, phone = ?4, address = ?5, updated_at = ?6
             WHERE id = ?1
             RETURNING {CUSTOMER_COLUMNS}"
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer. Their sales remain, detached.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id, "Customer deleted");
        Ok(())
    }

    /// Adds `delta` (may be negative) to a customer's loyalty points under
    /// the configured loyalty policy.
    ///
    /// ## Returns
    /// * `Ok(i64)` - The new balance
    /// * `Err(DbError::NotFound)` - No customer with this ID
    /// * `Err(DbError::Rejected(InsufficientPoints))` - `reject` refused it
    /// * `Err(DbError::Rejected(Validation))` - `|delta|` above MAX_BALANCE_DELTA
    pub async fn adjust_loyalty_points(&self, id: i64, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = %delta, policy = %self.loyalty_policy, "Adjusting loyalty points");
        validate_balance_delta("points", delta).map_err(CoreError::from)?;

        let (set, guard) = balance_update(self.loyalty_policy, "loyalty_points");
        let sql = format!(
            "UPDATE customers SET {set}, updated_at = ?3
             WHERE id = ?2{guard}
             RETURNING loyalty_points"
        );

        let updated: Option<i64> = sqlx::query_scalar(&sql)
            .bind(delta)
            .bind(id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(points) = updated {
            return Ok(points);
        }

        let balance: Option<i64> =
            sqlx::query_scalar("SELECT loyalty_points FROM customers WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match balance {
            None => Err(DbError::not_found("Customer", id)),
            Some(balance) => Err(CoreError::InsufficientPoints {
                customer_id: id,
                balance,
                delta,
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, memory_db_with};
    use crate::repository::BalancePolicies;

    fn john() -> CustomerInput {
        CustomerInput {
            name: "John Doe".into(),
            email: Some("john@example.com".into()),
            phone: Some("555-0123".into()),
            address: Some("123 Main St, City, State".into()),
        }
    }

    #[tokio::test]
    async fn test_create_starts_with_zero_points() {
        let db = memory_db().await;
        let customer = db.customers().create(&john()).await.unwrap();

        assert!(customer.id > 0);
        assert_eq!(customer.loyalty_points, 0);
        assert_eq!(db.customers().get_by_id(customer.id).await.unwrap(), customer);
    }

    #[tokio::test]
    async fn test_search_by_name_email_phone() {
        let db = memory_db().await;
        let repo = db.customers();
        repo.create(&john()).await.unwrap();
        repo.create(&CustomerInput {
            name: "Amara Perera".into(),
            phone: Some("077-1234567".into()),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(repo.list(None).await.unwrap().len(), 2);
        assert_eq!(repo.list(Some("amara")).await.unwrap().len(), 1);
        assert_eq!(repo.list(Some("example.com")).await.unwrap().len(), 1);
        assert_eq!(repo.list(Some("555")).await.unwrap()[0].name, "John Doe");
        assert!(repo.list(Some("nobody")).await.unwrap().is_empty());

        let names: Vec<_> = repo.list(Some(" ")).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Amara Perera", "John Doe"]);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_constraint_error() {
        let db = memory_db().await;
        db.customers().create(&john()).await.unwrap();
        let err = db.customers().create(&john()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = memory_db().await;
        let repo = db.customers();
        let customer = repo.create(&john()).await.unwrap();
        repo.adjust_loyalty_points(customer.id, 40).await.unwrap();

        let updated = repo
            .update(
                customer.id,
                &CustomerInput {
                    name: "John A. Doe".into(),
                    ..john()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "John A. Doe");
        assert_eq!(updated.loyalty_points, 40);

        repo.delete(customer.id).await.unwrap();
        assert!(repo.get_by_id(customer.id).await.unwrap_err().is_not_found());
        assert!(repo.delete(customer.id).await.unwrap_err().is_not_found());
        assert!(repo.update(customer.id, &john()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_points_may_go_negative_by_default() {
        let db = memory_db().await;
        let repo = db.customers();
        let id = repo.create(&john()).await.unwrap().id;

        assert_eq!(repo.adjust_loyalty_points(id, 100).await.unwrap(), 100);
        assert_eq!(repo.adjust_loyalty_points(id, -150).await.unwrap(), -50);
        assert_eq!(repo.get_by_id(id).await.unwrap().loyalty_points, -50);

        assert!(repo.adjust_loyalty_points(404, 5).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_points_clamp_and_reject() {
        let db = memory_db_with(BalancePolicies {
            loyalty: BalancePolicy::Clamp,
            ..Default::default()
        })
        .await;
        let id = db.customers().create(&john()).await.unwrap().id;
        db.customers().adjust_loyalty_points(id, 30).await.unwrap();
        assert_eq!(db.customers().adjust_loyalty_points(id, -100).await.unwrap(), 0);

        let db = memory_db_with(BalancePolicies {
            loyalty: BalancePolicy::Reject,
            ..Default::default()
        })
        .await;
        let id = db.customers().create(&john()).await.unwrap().id;
        db.customers().adjust_loyalty_points(id, 30).await.unwrap();
        let err = db.customers().adjust_loyalty_points(id, -31).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientPoints { balance: 30, delta: -31, .. })
        ));
        assert_eq!(db.customers().adjust_loyalty_points(id, -30).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_points_delta_is_bounded() {
        let db = memory_db().await;
        let repo = db.customers();
        let id = repo.create(&john()).await.unwrap().id;

        for delta in [i64::MAX, i64::MIN, -kade_core::MAX_BALANCE_DELTA - 1] {
            let err = repo.adjust_loyalty_points(id, delta).await.unwrap_err();
            assert!(matches!(err, DbError::Rejected(CoreError::Validation(_))));
        }
        assert_eq!(
            repo.adjust_loyalty_points(id, kade_core::MAX_BALANCE_DELTA).await.unwrap(),
            kade_core::MAX_BALANCE_DELTA
        );

        sqlx::query("UPDATE customers SET loyalty_points = ?2 WHERE id = ?1")
            .bind(id)
            .bind(i64::MAX)
            .execute(db.pool())
            .await
            .unwrap();
        assert!(repo.adjust_loyalty_points(id, 1).await.is_err());
        assert_eq!(repo.get_by_id(id).await.unwrap().loyalty_points, i64::MAX);
        assert_eq!(repo.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_customer_detaches_sales() {
        use chrono::NaiveDate;
        use kade_core::sale::{NewSale, SaleLine};
        use kade_core::{Money, PaymentMethod, ProductInput};

        let db = memory_db().await;
        let customer = db.customers().create(&john()).await.unwrap();
        let product = db
            .products()
            .create(&ProductInput {
                name: "Rice".into(),
                price: Money::from_cents(500),
                stock_quantity: 5,
                ..Default::default()
            })
            .await
            .unwrap();

        let receipt = db
            .sales()
            .create_sale(
                &NewSale {
                    customer_id: Some(customer.id),
                    items: vec![SaleLine {
                        product_id: product.id,
                        quantity: 1,
                        unit_price: Money::from_cents(500),
                    }],
                    payment_method: PaymentMethod::Card,
                    discount: Money::zero(),
                },
                Utc::now(),
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            )
            .await
            .unwrap();

        db.customers().delete(customer.id).await.unwrap();

        let detail = db.sales().get_detail(receipt.id).await.unwrap();
        assert_eq!(detail.summary.sale.customer_id, None);
        assert_eq!(detail.summary.customer_name, None);
    }
}
