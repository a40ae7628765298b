//! # Requisition Repository
//!
//! Database operations for goods-receipt documents and their items.
//!
//! ## Document Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Requisition Lifecycle                                │
//! │                                                                         │
//! │  1. CREATE DRAFT                                                       │
//! │     └── insert() → Requisition { status: Draft } + items               │
//! │                                                                         │
//! │  2. VALIDATE (pharma-service, single transaction)                      │
//! │     ├── per item: receive_stock() + optional lot::insert()             │
//! │     └── mark_validated() guarded by status = 'draft'                   │
//! │                                                                         │
//! │  A second validation finds status != 'draft' and fails fast -          │
//! │  the guard in the UPDATE's WHERE clause is the idempotency check.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use pharma_core::{Requisition, RequisitionItem, RequisitionStatus, RequisitionWithItems};

const REQUISITION_COLUMNS: &str =
    "id, reference, status, supplier_id, created_by_id, created_at";

const ITEM_COLUMNS: &str =
    "id, requisition_id, product_id, quantity, buy_price_cents, batch_number, expiry_date";

/// Repository for requisition reads.
#[derive(Debug, Clone)]
pub struct RequisitionRepository {
    pool: SqlitePool,
}

impl RequisitionRepository {
    /// Creates a new RequisitionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RequisitionRepository { pool }
    }

    /// Gets a requisition with its items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<RequisitionWithItems>> {
        let sql = format!("SELECT {REQUISITION_COLUMNS} FROM requisitions WHERE id = ?1");
        let requisition = sqlx::query_as::<_, Requisition>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(requisition) = requisition else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM requisition_items WHERE requisition_id = ?1 ORDER BY id"
        );
        let items = sqlx::query_as::<_, RequisitionItem>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(RequisitionWithItems { requisition, items }))
    }

    /// Lists all requisitions, newest first.
    pub async fn list(&self) -> DbResult<Vec<Requisition>> {
        let sql =
            format!("SELECT {REQUISITION_COLUMNS} FROM requisitions ORDER BY created_at DESC");
        let requisitions = sqlx::query_as::<_, Requisition>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(requisitions)
    }
}

// =============================================================================
// Transactional Write Helpers
// =============================================================================

/// Inserts a requisition and its items (draft creation).
///
/// Items are cascade-created with the document and never independently
/// mutated afterwards.
pub async fn insert(
    conn: &mut SqliteConnection,
    requisition: &Requisition,
    items: &[RequisitionItem],
) -> DbResult<()> {
    debug!(id = %requisition.id, reference = %requisition.reference, items = items.len(), "Inserting requisition");

    sqlx::query(
        "INSERT INTO requisitions (id, reference, status, supplier_id, created_by_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&requisition.id)
    .bind(&requisition.reference)
    .bind(requisition.status)
    .bind(&requisition.supplier_id)
    .bind(&requisition.created_by_id)
    .bind(requisition.created_at)
    .execute(&mut *conn)
    .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO requisition_items (
                id, requisition_id, product_id, quantity,
                buy_price_cents, batch_number, expiry_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&item.id)
        .bind(&item.requisition_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.buy_price_cents)
        .bind(&item.batch_number)
        .bind(item.expiry_date)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Gets a requisition with its items inside a transaction.
pub async fn get_with_items(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<RequisitionWithItems>> {
    let sql = format!("SELECT {REQUISITION_COLUMNS} FROM requisitions WHERE id = ?1");
    let requisition = sqlx::query_as::<_, Requisition>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(requisition) = requisition else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM requisition_items WHERE requisition_id = ?1 ORDER BY id"
    );
    let items = sqlx::query_as::<_, RequisitionItem>(&sql)
        .bind(id)
        .fetch_all(conn)
        .await?;

    Ok(Some(RequisitionWithItems { requisition, items }))
}

/// Marks a requisition as validated, guarded by its current status.
///
/// ## Returns
/// * `Ok(true)` - transition applied (was in draft)
/// * `Ok(false)` - zero rows affected: document missing or not in draft.
///   The WHERE-clause guard, verified by affected-row count, is what makes
///   double validation impossible even under concurrent calls.
pub async fn mark_validated(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    debug!(id = %id, "Marking requisition validated");

    let result = sqlx::query(
        "UPDATE requisitions
         SET status = ?2
         WHERE id = ?1 AND status = ?3",
    )
    .bind(id)
    .bind(RequisitionStatus::Validated)
    .bind(RequisitionStatus::Draft)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Generates a new requisition item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}
