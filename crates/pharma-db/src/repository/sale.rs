//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! Sales are written exactly once, by the sale processor, inside the same
//! transaction as the lot and aggregate-stock decrements they correspond
//! to. There is no draft/void lifecycle: a persisted sale is final.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use pharma_core::{Sale, SaleItem, SaleWithItems};

const SALE_COLUMNS: &str = "id, reference, seller_id, client_id, payment_method, \
     subtotal_cents, discount_cents, tax_cents, total_cents, created_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, stock_lot_id, quantity, \
     unit_price_cents, cost_price_cents, line_total_cents";

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(sale) = sale else {
            return Ok(None);
        };

        let sql = format!("SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY id");
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Lists all sales, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC");
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }
}

// =============================================================================
// Transactional Write Helpers
// =============================================================================

/// Inserts a sale header.
pub async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, reference = %sale.reference, total = %sale.total_cents, "Inserting sale");

    sqlx::query(
        "INSERT INTO sales (
            id, reference, seller_id, client_id, payment_method,
            subtotal_cents, discount_cents, tax_cents, total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&sale.id)
    .bind(&sale.reference)
    .bind(&sale.seller_id)
    .bind(&sale.client_id)
    .bind(sale.payment_method)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts one sale item (one lot's share of a cart line).
pub async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    debug!(sale_id = %item.sale_id, product_id = %item.product_id, lot = %item.stock_lot_id, "Inserting sale item");

    sqlx::query(
        "INSERT INTO sale_items (
            id, sale_id, product_id, stock_lot_id,
            quantity, unit_price_cents, cost_price_cents, line_total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.stock_lot_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.cost_price_cents)
    .bind(item.line_total_cents)
    .execute(conn)
    .await?;

    Ok(())
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}
