//! # Product Repository
//!
//! Database operations for products and the denormalized aggregate stock
//! counter.
//!
//! ## The Oversell Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Stock Decrement Strategy                                   │
//! │                                                                         │
//! │  ❌ RACY: read-then-write                                               │
//! │     SELECT current_stock …   (both sales read 4)                       │
//! │     UPDATE products SET current_stock = 4 - 3                          │
//! │     → two concurrent sales of 3 both pass the check and oversell       │
//! │                                                                         │
//! │  ✅ ATOMIC: conditional decrement verified by affected-row count       │
//! │     UPDATE products                                                     │
//! │     SET current_stock = current_stock - ?2                             │
//! │     WHERE id = ?1 AND current_stock >= ?2                              │
//! │     → rows_affected == 0 means "lost the race or never had the        │
//! │       stock"; the caller distinguishes not-found from insufficient     │
//! │       with a follow-up read inside the same transaction                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pharma_core::{Product, ProductWithLots, StockDrift, StockLot};

const PRODUCT_COLUMNS: &str = "id, code, name, category, sell_price_cents, buying_price_cents, \
     current_stock, min_stock, created_at, updated_at";

/// Repository for product reads.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its unique code.
    ///
    /// Used for the caller-side uniqueness check before persisting a new
    /// product.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists all products, each with its non-exhausted lots sorted by
    /// expiry date ascending.
    pub async fn list_with_lots(&self) -> DbResult<Vec<ProductWithLots>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        // One query for all lots, grouped in memory - avoids a query per
        // product on the main catalog read.
        let lots = sqlx::query_as::<_, StockLot>(
            "SELECT id, product_id, batch_number, expiry_date, quantity, received_date
             FROM stock_lots
             WHERE quantity > 0
             ORDER BY product_id, expiry_date, received_date, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result: Vec<ProductWithLots> = products
            .into_iter()
            .map(|product| ProductWithLots {
                product,
                lots: Vec::new(),
            })
            .collect();

        for lot in lots {
            if let Some(entry) = result.iter_mut().find(|p| p.product.id == lot.product_id) {
                entry.lots.push(lot);
            }
        }

        Ok(result)
    }

    /// Lists products whose aggregate stock has fallen below their minimum
    /// stock threshold (reorder report).
    pub async fn list_below_min_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE current_stock < min_stock ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Reconciliation check: products whose `current_stock` counter has
    /// drifted from the sum of their lot quantities.
    ///
    /// The two are written redundantly in every mutation path; a non-empty
    /// result here means a write path bypassed the transaction discipline.
    pub async fn stock_drift(&self) -> DbResult<Vec<StockDrift>> {
        let rows = sqlx::query_as::<_, (String, String, i64, i64)>(
            "SELECT p.id, p.code, p.current_stock,
                    COALESCE(SUM(l.quantity), 0) AS lot_sum
             FROM products p
             LEFT JOIN stock_lots l ON l.product_id = p.id
             GROUP BY p.id, p.code, p.current_stock
             HAVING p.current_stock <> COALESCE(SUM(l.quantity), 0)",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, code, current_stock, lot_sum)| StockDrift {
                product_id,
                code,
                current_stock,
                lot_sum,
            })
            .collect())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transactional Write Helpers
// =============================================================================

/// Inserts a new product.
///
/// ## Errors
/// * `DbError::UniqueViolation` - code already exists
pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(code = %product.code, "Inserting product");

    sqlx::query(
        "INSERT INTO products (
            id, code, name, category,
            sell_price_cents, buying_price_cents,
            current_stock, min_stock,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&product.id)
    .bind(&product.code)
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.sell_price_cents)
    .bind(product.buying_price_cents)
    .bind(product.current_stock)
    .bind(product.min_stock)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Gets a product by ID inside a transaction.
///
/// A fresh read on the transaction's connection - observes the
/// transaction's own prior writes (e.g., the conditional decrement).
pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(product)
}

/// Atomically decrements the aggregate stock counter, guarded by
/// sufficiency.
///
/// ## Returns
/// * `Ok(true)` - decrement applied
/// * `Ok(false)` - zero rows affected: the product doesn't exist OR its
///   stock is below `quantity`. The caller disambiguates with a follow-up
///   read on the same transaction.
pub async fn try_decrement_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<bool> {
    debug!(id = %id, quantity = %quantity, "Conditional stock decrement");

    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE products
         SET current_stock = current_stock - ?2, updated_at = ?3
         WHERE id = ?1 AND current_stock >= ?2",
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Increments the aggregate stock counter and overwrites the buying price
/// (last-received-price-wins) in one statement.
///
/// ## Errors
/// * `DbError::NotFound` - product doesn't exist (triggers rollback of the
///   enclosing requisition validation)
pub async fn receive_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    buy_price_cents: i64,
) -> DbResult<()> {
    debug!(id = %id, quantity = %quantity, buy_price = %buy_price_cents, "Receiving stock");

    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE products
         SET current_stock = current_stock + ?2,
             buying_price_cents = ?3,
             updated_at = ?4
         WHERE id = ?1",
    )
    .bind(id)
    .bind(quantity)
    .bind(buy_price_cents)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
