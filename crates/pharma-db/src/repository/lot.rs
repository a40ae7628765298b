//! # Stock Lot Repository
//!
//! Database operations for stock lots.
//!
//! Lots are append-then-decrement only: created by requisition validation,
//! decremented by sales, never physically deleted. A lot at quantity 0
//! stays in the table for traceability but is excluded from FEFO reads.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pharma_core::StockLot;

/// Repository for lot reads.
#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    /// Creates a new LotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    /// Gets a lot by ID (including exhausted lots, for traceability reads).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockLot>> {
        let lot = sqlx::query_as::<_, StockLot>(
            "SELECT id, product_id, batch_number, expiry_date, quantity, received_date
             FROM stock_lots
             WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }
}

// =============================================================================
// Transactional Write Helpers
// =============================================================================

/// Lists a product's non-exhausted lots in FEFO order, inside a transaction.
///
/// Must be a fresh read on the transaction's connection - the sale
/// processor calls this after its conditional aggregate decrement, so the
/// lot quantities it sees are consistent with that write.
pub async fn list_available(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Vec<StockLot>> {
    let lots = sqlx::query_as::<_, StockLot>(
        "SELECT id, product_id, batch_number, expiry_date, quantity, received_date
         FROM stock_lots
         WHERE product_id = ?1 AND quantity > 0
         ORDER BY expiry_date, received_date, id",
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;

    Ok(lots)
}

/// Inserts a new lot (requisition validation, lines carrying both a batch
/// number and an expiry date).
pub async fn insert(
    conn: &mut SqliteConnection,
    product_id: &str,
    batch_number: &str,
    expiry_date: NaiveDate,
    quantity: i64,
    received_date: DateTime<Utc>,
) -> DbResult<StockLot> {
    let lot = StockLot {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        batch_number: batch_number.to_string(),
        expiry_date,
        quantity,
        received_date,
    };

    debug!(id = %lot.id, product_id = %product_id, batch = %batch_number, quantity = %quantity, "Inserting stock lot");

    sqlx::query(
        "INSERT INTO stock_lots (id, product_id, batch_number, expiry_date, quantity, received_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&lot.id)
    .bind(&lot.product_id)
    .bind(&lot.batch_number)
    .bind(lot.expiry_date)
    .bind(lot.quantity)
    .bind(lot.received_date)
    .execute(conn)
    .await?;

    Ok(lot)
}

/// Decrements a lot's remaining quantity, guarded against going negative.
///
/// The allocator never plans to take more than a lot holds, so a zero
/// affected-row count here means the plan and the rows diverged - the
/// enclosing transaction must roll back.
pub async fn decrement_quantity(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<()> {
    debug!(id = %id, quantity = %quantity, "Decrementing lot quantity");

    let result = sqlx::query(
        "UPDATE stock_lots
         SET quantity = quantity - ?2
         WHERE id = ?1 AND quantity >= ?2",
    )
    .bind(id)
    .bind(quantity)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("StockLot (sufficient quantity)", id));
    }

    Ok(())
}
