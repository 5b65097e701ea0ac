//! # Sample Data
//!
//! First-run catalog for a grocery store, one walk-in customer and the
//! `admin` account.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ seed_sample_data()                                               │
//! │                                                                  │
//! │   products empty? ──no──► return false (never touches data)      │
//! │        │                                                         │
//! │       yes                                                        │
//! │        ▼                                                         │
//! │   BEGIN                                                          │
//! │     56 products  (prices and costs in cents)                     │
//! │     John Doe     (100 loyalty points)                            │
//! │     admin        (role admin, caller supplies name and hash)     │
//! │   COMMIT ──────► return true                                     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use kade_core::UserRole;

/// (name, barcode, description, category, price, cost, stock, min_stock, supplier)
type SeedProduct = (&'static str, &'static str, &'static str, &'static str, i64, i64, i64, i64, &'static str);

#[rustfmt::skip]
const SAMPLE_PRODUCTS: &[SeedProduct] = &[
    // Rice & Grains
    ("Basmati Rice", "RICE001", "Premium quality basmati rice", "Rice & Grains", 85_000, 75_000, 50, 10, "Ceylon Grains"),
    ("Red Raw Rice", "RICE002", "Traditional Sri Lankan red rice", "Rice & Grains", 68_000, 60_000, 75, 15, "Ceylon Grains"),
    ("Nadu Rice", "RICE003", "Local nadu rice variety", "Rice & Grains", 52_000, 45_000, 100, 20, "Ceylon Grains"),
    ("Kurakkan Flour", "FLOUR001", "Millet flour for traditional cooking", "Flour & Grains", 28_000, 24_000, 40, 8, "Local Mill"),
    ("Wheat Flour", "FLOUR002", "Premium wheat flour", "Flour & Grains", 32_000, 28_000, 60, 12, "Local Mill"),
    // Spices
    ("Chili Powder", "SPC001", "Pure red chili powder", "Spices", 45_000, 38_000, 30, 5, "Spice Island"),
    ("Turmeric Powder", "SPC002", "Organic turmeric powder", "Spices", 38_000, 32_000, 25, 5, "Spice Island"),
    ("Pepper Black", "SPC003", "Whole black pepper", "Spices", 52_000, 45_000, 20, 3, "Spice Island"),
    ("Cinnamon Sticks", "SPC004", "Ceylon cinnamon sticks", "Spices", 75_000, 65_000, 15, 3, "Spice Island"),
    ("Curry Powder Mix", "SPC005", "Traditional curry powder blend", "Spices", 28_000, 22_000, 35, 8, "Spice Island"),
    ("Salt Packet", "SPC006", "Iodized salt 1kg", "Spices", 8_500, 7_000, 100, 20, "Salt Co"),
    // Vegetables
    ("Tomatoes", "VEG001", "Fresh red tomatoes", "Vegetables", 12_000, 9_000, 0, 10, "Local Farm"),
    ("Onions", "VEG002", "Fresh red onions", "Vegetables", 9_500, 7_500, 0, 15, "Local Farm"),
    ("Potatoes", "VEG003", "Fresh local potatoes", "Vegetables", 11_000, 8_500, 0, 20, "Local Farm"),
    ("Carrots", "VEG004", "Fresh orange carrots", "Vegetables", 8_500, 6_500, 0, 12, "Local Farm"),
    ("Green Chilies", "VEG005", "Fresh green chilies", "Vegetables", 7_500, 5_500, 0, 8, "Local Farm"),
    ("Cabbage", "VEG006", "Fresh green cabbage", "Vegetables", 6_500, 4_500, 0, 10, "Local Farm"),
    ("Leeks", "VEG007", "Fresh leeks", "Vegetables", 9_000, 7_000, 0, 8, "Local Farm"),
    // Fruits
    ("Bananas", "FRU001", "Fresh local bananas", "Fruits", 15_000, 12_000, 0, 25, "Local Farm"),
    ("Apples", "FRU002", "Imported red apples", "Fruits", 28_000, 22_000, 0, 30, "Import Co"),
    ("Oranges", "FRU003", "Fresh sweet oranges", "Fruits", 22_000, 18_000, 0, 20, "Import Co"),
    ("Mangoes", "FRU004", "Seasonal sweet mangoes", "Fruits", 18_000, 15_000, 0, 15, "Local Farm"),
    ("Pineapple", "FRU005", "Fresh pineapples", "Fruits", 16_000, 13_000, 0, 12, "Local Farm"),
    ("Papaya", "FRU006", "Fresh papaya fruit", "Fruits", 12_000, 9_500, 0, 18, "Local Farm"),
    // Dairy
    ("Fresh Milk", "DAI001", "Fresh cow milk 1L", "Dairy", 22_000, 18_000, 0, 15, "Dairy Farm"),
    ("Yogurt Plain", "DAI002", "Plain yogurt 500g", "Dairy", 18_000, 14_000, 0, 20, "Dairy Farm"),
    ("Butter Salted", "DAI003", "Salted butter 250g", "Dairy", 45_000, 38_000, 25, 5, "Dairy Farm"),
    ("Cheese Block", "DAI004", "Processed cheese block", "Dairy", 68_000, 55_000, 15, 3, "Dairy Farm"),
    ("Curd Pot", "DAI005", "Traditional curd pot", "Dairy", 32_000, 26_000, 0, 12, "Dairy Farm"),
    // Meat & Fish
    ("Chicken Fresh", "MEAT001", "Fresh whole chicken", "Meat & Fish", 45_000, 38_000, 0, 8, "Meat Shop"),
    ("Beef Pieces", "MEAT002", "Fresh beef cuts", "Meat & Fish", 85_000, 72_000, 0, 6, "Meat Shop"),
    ("Fish Tuna", "FISH001", "Fresh tuna fish", "Meat & Fish", 68_000, 55_000, 0, 10, "Fish Market"),
    ("Fish Sardines", "FISH002", "Fresh sardines", "Meat & Fish", 28_000, 22_000, 0, 20, "Fish Market"),
    ("Eggs Pack", "EGG001", "Fresh eggs 12 pack", "Meat & Fish", 18_000, 15_000, 30, 8, "Poultry Farm"),
    // Bakery
    ("Bread White", "BAK001", "Fresh white bread", "Bakery", 12_000, 9_000, 0, 25, "Local Bakery"),
    ("Bread Whole Wheat", "BAK002", "Whole wheat bread", "Bakery", 14_000, 11_000, 0, 20, "Local Bakery"),
    ("Biscuits Pack", "BAK003", "Assorted biscuits pack", "Bakery", 8_500, 6_500, 40, 10, "Local Bakery"),
    ("Cake Butter", "BAK004", "Butter cake slice", "Bakery", 18_000, 14_000, 0, 15, "Local Bakery"),
    // Beverages
    ("Water Bottle", "BEV001", "Drinking water 1L", "Beverages", 6_500, 4_500, 50, 15, "Water Co"),
    ("Tea Bags", "TEA001", "Ceylon tea bags 25 pack", "Beverages", 28_000, 22_000, 60, 10, "Ceylon Tea"),
    ("Coffee Powder", "COF001", "Instant coffee powder", "Beverages", 45_000, 38_000, 30, 5, "Coffee Co"),
    ("Soft Drink Cola", "SDR001", "Cola soft drink 1.5L", "Beverages", 15_000, 12_000, 40, 8, "Beverage Co"),
    ("Orange Juice", "JUICE001", "Fresh orange juice 1L", "Beverages", 22_000, 18_000, 0, 20, "Juice Co"),
    // Cooking Essentials
    ("Coconut Oil", "OIL001", "Pure coconut oil 750ml", "Cooking Essentials", 45_000, 38_000, 35, 5, "Oil Co"),
    ("Vegetable Oil", "OIL002", "Refined vegetable oil 1L", "Cooking Essentials", 38_000, 32_000, 40, 8, "Oil Co"),
    ("Sugar White", "SUG001", "White sugar 1kg", "Cooking Essentials", 15_000, 12_000, 60, 12, "Sugar Co"),
    ("Dhal Red", "DAL001", "Red lentils 500g", "Cooking Essentials", 22_000, 18_000, 45, 8, "Pulse Co"),
    ("Maldive Fish", "FISH003", "Dried Maldive fish", "Cooking Essentials", 85_000, 72_000, 20, 3, "Fish Market"),
    // Personal Care
    ("Soap Bath", "SOAP001", "Bathing soap bar", "Personal Care", 8_500, 6_500, 50, 15, "Care Co"),
    ("Toothpaste", "PASTE001", "Fluoride toothpaste", "Personal Care", 18_000, 14_000, 30, 8, "Care Co"),
    ("Shampoo", "SHAM001", "Hair shampoo 200ml", "Personal Care", 22_000, 18_000, 25, 5, "Care Co"),
    ("Toilet Paper", "TP001", "Toilet paper roll", "Personal Care", 12_000, 9_000, 40, 10, "Care Co"),
    // Cleaning
    ("Detergent Powder", "DET001", "Washing detergent 1kg", "Cleaning", 28_000, 22_000, 30, 6, "Clean Co"),
    ("Dish Soap", "DISH001", "Dish washing liquid", "Cleaning", 18_000, 14_000, 35, 8, "Clean Co"),
    ("Bleach Liquid", "BLEACH001", "Household bleach 1L", "Cleaning", 15_000, 12_000, 20, 5, "Clean Co"),
    ("Floor Cleaner", "FLOOR001", "Floor cleaning liquid", "Cleaning", 22_000, 18_000, 25, 4, "Clean Co"),
];

impl Database {
    /// Loads the sample catalog when the products table is empty.
    ///
    /// Returns `true` if data was inserted. Runs in one transaction, so a
    /// failure leaves the database as it was.
    pub async fn seed_sample_data(
        &self,
        admin_username: &str,
        admin_password_hash: &str,
    ) -> DbResult<bool> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool())
            .await?;
        if existing > 0 {
            return Ok(false);
        }

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        for (name, barcode, description, category, price, cost, stock, min_stock, supplier) in SAMPLE_PRODUCTS {
            sqlx::query(
                "INSERT INTO products (name, barcode, description, category, price, cost,
                                       stock_quantity, min_stock_level, supplier, image_url,
                                       is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, 1, ?10, ?10)",
            )
            .bind(name)
            .bind(barcode)
            .bind(description)
            .bind(category)
            .bind(price)
            .bind(cost)
            .bind(stock)
            .bind(min_stock)
            .bind(supplier)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO customers (name, email, phone, address, loyalty_points, created_at, updated_at)
             VALUES ('John Doe', 'john@example.com', '555-0123', '123 Main St, City, State', 100, ?1, ?1)",
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role, first_name, last_name,
                                is_active, created_at, updated_at)
             VALUES (?1, 'admin@pos.com', ?2, ?3, 'Admin', 'User', 1, ?4, ?4)
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(admin_username)
        .bind(admin_password_hash)
        .bind(UserRole::Admin)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(products = SAMPLE_PRODUCTS.len(), "Sample data inserted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use crate::repository::product::ProductFilter;
    use kade_core::Money;

    #[test]
    fn test_barcodes_are_unique() {
        let mut barcodes: Vec<_> = SAMPLE_PRODUCTS.iter().map(|p| p.1).collect();
        barcodes.sort_unstable();
        barcodes.dedup();
        assert_eq!(barcodes.len(), SAMPLE_PRODUCTS.len());
        assert_eq!(SAMPLE_PRODUCTS.len(), 56);
    }

    #[tokio::test]
    async fn test_seed_once() {
        let db = memory_db().await;

        assert!(db.seed_sample_data("admin", "hash").await.unwrap());
        assert!(!db.seed_sample_data("admin", "other").await.unwrap());

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(products, 56);
        let rice = db.products().get_by_barcode("RICE001").await.unwrap();
        assert_eq!(rice.price, Money::from_cents(85_000));
        assert_eq!(rice.cost, Some(Money::from_cents(75_000)));

        let customers = db.customers().list(None).await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].loyalty_points, 100);

        let admin = db.users().find_active_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_seed_skips_populated_catalog() {
        let db = memory_db().await;
        db.products()
            .create(&kade_core::ProductInput {
                name: "Own Product".into(),
                price: Money::from_cents(100),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!db.seed_sample_data("admin", "hash").await.unwrap());
        assert_eq!(db.products().list(&ProductFilter::default()).await.unwrap().len(), 1);
        assert!(db.users().find_active_by_username("admin").await.unwrap().is_none());
    }
}
