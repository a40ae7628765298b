//! # Sale Processor
//!
//! Converts a cart into a persisted sale with fully consistent lot and
//! aggregate-stock effects, inside ONE atomic transaction.
//!
//! ## Processing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    process_sale Walkthrough                             │
//! │                                                                         │
//! │  validate input ── (no transaction yet)                                │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  per cart line:                                                        │
//! │    1. conditional aggregate decrement                                   │
//! │       UPDATE products SET current_stock = current_stock - Q            │
//! │       WHERE id = ? AND current_stock >= Q                              │
//! │       └── 0 rows? → read product: missing → NOT_FOUND                  │
//! │                     present  → INSUFFICIENT_STOCK                      │
//! │    2. fresh FEFO read of lots (quantity > 0, expiry ascending)         │
//! │    3. allocate_fefo(lots, Q)  ← pure, no side effects                  │
//! │       └── shortfall? → ledger fault → rollback                         │
//! │    4. per allocation: decrement lot, build SaleItem                    │
//! │       (cost_price snapshot = product.buying_price at this moment)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  insert sale header + all items, COMMIT                                │
//! │                                                                         │
//! │  Any error anywhere → ROLLBACK: no partial lot decrements, no          │
//! │  partial aggregate decrements, no orphan sale row.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why Decrement Before Allocating?
//! The conditional UPDATE is the oversell guard: two concurrent sales of
//! the same product serialize on the row write, and the loser sees zero
//! affected rows instead of a stale sufficient-looking stock figure. The
//! lot reads that follow observe the transaction's own decrement, so
//! aggregate and lot effects stay consistent.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use pharma_core::validation::{validate_non_empty, validate_price_cents, validate_quantity};
use pharma_core::{
    allocate_fefo, AvailableLot, CoreError, PaymentMethod, Sale, SaleItem, SaleWithItems,
    ValidationError, MAX_CART_LINES,
};
use pharma_db::repository::{lot, product, sale};
use pharma_db::Database;

// =============================================================================
// Input Types
// =============================================================================

/// One line of a sale cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Input for sale processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub seller_id: String,
    pub client_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub discount_cents: i64,
}

// =============================================================================
// Sale Processor
// =============================================================================

/// Orchestrates sale processing.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    db: Database,
}

impl SaleProcessor {
    /// Creates a new SaleProcessor.
    pub fn new(db: Database) -> Self {
        SaleProcessor { db }
    }

    /// Processes a cart into a persisted sale.
    ///
    /// ## Failure Semantics
    /// All failures are typed and surfaced synchronously; none are retried.
    /// Stock shortfalls are a business condition, not a transient fault.
    /// On any failure the transaction rolls back completely.
    pub async fn process_sale(&self, input: NewSale) -> Result<SaleWithItems, ApiError> {
        debug!(seller = %input.seller_id, lines = input.items.len(), "process_sale");

        // Validation layer: malformed input never starts a transaction
        validate_non_empty("cart", input.items.len())?;
        if input.items.len() > MAX_CART_LINES {
            return Err(ValidationError::OutOfRange {
                field: "cart lines".to_string(),
                min: 1,
                max: MAX_CART_LINES as i64,
            }
            .into());
        }
        for line in &input.items {
            validate_quantity(line.quantity)?;
            validate_price_cents("unit price", line.unit_price_cents)?;
        }
        validate_price_cents("discount", input.discount_cents)?;

        let sale_id = Uuid::new_v4().to_string();
        let reference = generate_sale_reference();
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        let mut items: Vec<SaleItem> = Vec::new();
        let mut subtotal_cents: i64 = 0;

        for line in &input.items {
            // Oversell guard: atomic conditional decrement, verified by
            // affected-row count
            let decremented =
                product::try_decrement_stock(&mut tx, &line.product_id, line.quantity).await?;

            // Fresh read inside the transaction - also supplies the
            // buying-price snapshot for the cost capture
            let current = product::get_by_id(&mut tx, &line.product_id).await?;

            let current = match (decremented, current) {
                (true, Some(p)) => p,
                (_, None) => {
                    return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
                }
                (false, Some(p)) => {
                    return Err(CoreError::InsufficientStock {
                        code: p.code,
                        available: p.current_stock,
                        requested: line.quantity,
                    }
                    .into());
                }
            };

            // FEFO allocation over the line's lots, freshly read
            let lots = lot::list_available(&mut tx, &line.product_id).await?;
            let available: Vec<AvailableLot> = lots
                .iter()
                .map(|l| AvailableLot {
                    id: l.id.clone(),
                    quantity: l.quantity,
                    expiry_date: l.expiry_date,
                    received_date: l.received_date,
                })
                .collect();

            // A shortfall here means the aggregate counter and the lot rows
            // disagree; the transaction rolls back via `?`
            let plan = allocate_fefo(&available, line.quantity)?;

            for allocation in plan {
                lot::decrement_quantity(&mut tx, &allocation.lot_id, allocation.quantity).await?;

                items.push(SaleItem {
                    id: sale::generate_sale_item_id(),
                    sale_id: sale_id.clone(),
                    product_id: line.product_id.clone(),
                    stock_lot_id: allocation.lot_id,
                    quantity: allocation.quantity,
                    unit_price_cents: line.unit_price_cents,
                    cost_price_cents: current.buying_price_cents,
                    line_total_cents: line.unit_price_cents * allocation.quantity,
                });
            }

            subtotal_cents += line.quantity * line.unit_price_cents;
        }

        // total = subtotal - discount; a negative result is not guarded
        let sale_row = Sale {
            id: sale_id.clone(),
            reference: reference.clone(),
            seller_id: input.seller_id.clone(),
            client_id: input.client_id.clone(),
            payment_method: input.payment_method,
            subtotal_cents,
            discount_cents: input.discount_cents,
            tax_cents: 0,
            total_cents: subtotal_cents - input.discount_cents,
            created_at: now,
        };

        sale::insert(&mut tx, &sale_row).await?;
        for item in &items {
            sale::insert_item(&mut tx, item).await?;
        }

        tx.commit().await.map_err(pharma_db::DbError::from)?;

        info!(
            sale_id = %sale_id,
            reference = %reference,
            total = %sale_row.total_cents,
            lines = input.items.len(),
            "Sale processed"
        );

        Ok(SaleWithItems {
            sale: sale_row,
            items,
        })
    }

    /// Gets a processed sale with its items.
    pub async fn get_sale(&self, id: &str) -> Result<SaleWithItems, ApiError> {
        self.db
            .sales()
            .get_with_items(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Sale", id))
    }

    /// Lists all sales, newest first.
    pub async fn get_sales(&self) -> Result<Vec<Sale>, ApiError> {
        Ok(self.db.sales().list().await?)
    }
}

/// Generates a sale reference: date prefix + random suffix.
///
/// Collisions are improbable but possible; the UNIQUE constraint on the
/// reference column turns one into a duplicate error rather than a silent
/// overwrite.
fn generate_sale_reference() -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let random: u16 = (nanos % 10000) as u16;
    format!("S{}-{:04}", now.format("%y%m%d-%H%M%S"), random)
}

// =============================================================================
// Unit Tests
// =============================================================================
