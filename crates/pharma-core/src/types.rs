//! # Domain Types
//!
//! Core domain types used throughout the pharmacy stock ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    StockLot     │   │   Requisition   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (EAN-13)  │   │  batch_number   │   │  reference      │       │
//! │  │  current_stock  │◄──│  expiry_date    │   │  status         │       │
//! │  │  buying_price   │   │  quantity       │   │  items[]        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌───────────────────┐   ┌─────────────────┐     │
//! │  │      Sale       │   │     SaleItem      │   │ PaymentMethod   │     │
//! │  │  ─────────────  │   │  ───────────────  │   │  ─────────────  │     │
//! │  │  reference      │   │  stock_lot_id ────┼──►│  Cash           │     │
//! │  │  subtotal/total │   │  cost_price (snap)│   │  Card           │     │
//! │  └─────────────────┘   └───────────────────┘   │  MobileMoney    │     │
//! │                                                └─────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (code, reference, batch_number) - human-readable
//!
//! ## Denormalized Aggregate Stock
//! `Product.current_stock` is an independently-written counter, not a
//! computed view over lots. Every mutation path updates the counter and the
//! lot rows inside the same transaction; `current_stock` must always equal
//! the sum of the product's lot quantities for lot-tracked stock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A pharmacy product tracked by the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// EAN-13-like product code - business identifier, unique.
    pub code: String,

    /// Display name shown on the sales screen and receipts.
    pub name: String,

    /// Category label (e.g., "Antibiotics", "Analgesics").
    pub category: String,

    /// Sell price in cents (smallest currency unit).
    pub sell_price_cents: i64,

    /// Latest known buying price in cents (last-received-price-wins).
    pub buying_price_cents: i64,

    /// Aggregate stock across all lots (denormalized counter).
    ///
    /// Forced to zero at creation - stock only enters through the
    /// receiving workflow.
    pub current_stock: i64,

    /// Threshold below which the product shows up on the low-stock report.
    pub min_stock: i64,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sell price as a Money type.
    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }

    /// Returns the buying price as a Money type.
    #[inline]
    pub fn buying_price(&self) -> Money {
        Money::from_cents(self.buying_price_cents)
    }

    /// Checks whether the aggregate stock covers a requested quantity.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }

    /// Checks whether the product is below its minimum stock threshold.
    #[inline]
    pub fn is_below_min_stock(&self) -> bool {
        self.current_stock < self.min_stock
    }
}

// =============================================================================
// Stock Lot
// =============================================================================

/// A traceable sub-quantity of a product received together, with its own
/// expiry date.
///
/// Lots are never physically deleted: a lot at quantity 0 is logically
/// exhausted (excluded from allocation) but kept for traceability.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLot {
    pub id: String,
    pub product_id: String,
    /// Supplier batch number (printed on the physical packaging).
    pub batch_number: String,
    /// Expiry date - drives FEFO consumption ordering.
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    /// Quantity remaining in the lot, always >= 0.
    pub quantity: i64,
    /// When the lot entered the ledger (requisition validation time).
    #[ts(as = "String")]
    pub received_date: DateTime<Utc>,
}

impl StockLot {
    /// A lot with no remaining quantity is exhausted and must not be
    /// offered to the allocator.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.quantity == 0
    }
}

// =============================================================================
// Requisition (Goods Receipt)
// =============================================================================

/// Status of a goods-receipt document.
///
/// Lifecycle: `Draft` → `Validated`, exactly once. `Cancelled` is a defined
/// terminal state with no transition into it in the current workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionStatus {
    /// Document created, stock effects not yet applied.
    Draft,
    /// Stock effects applied; terminal.
    Validated,
    /// Terminal; no workflow transition reaches it yet.
    Cancelled,
}

impl Default for RequisitionStatus {
    fn default() -> Self {
        RequisitionStatus::Draft
    }
}

/// A goods-receipt document representing incoming stock from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Requisition {
    pub id: String,
    /// Human-readable reference, generated at draft time, unique.
    pub reference: String,
    pub status: RequisitionStatus,
    pub supplier_id: String,
    pub created_by_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A single line of a requisition.
///
/// `batch_number` and `expiry_date` are both required for a validated line
/// to create a stock lot; a line missing either contributes only to the
/// aggregate stock counter, with no lot-level traceability.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RequisitionItem {
    pub id: String,
    pub requisition_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Buy price per unit in cents; overwrites the product's buying price
    /// on validation.
    pub buy_price_cents: i64,
    pub batch_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

impl RequisitionItem {
    /// Whether this line carries enough information to create a stock lot.
    #[inline]
    pub fn creates_lot(&self) -> bool {
        self.batch_number.is_some() && self.expiry_date.is_some()
    }
}

/// A requisition together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RequisitionWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub requisition: Requisition,
    pub items: Vec<RequisitionItem>,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Mobile money transfer.
    MobileMoney,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale transaction. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Human-readable reference (date prefix + random suffix), unique.
    pub reference: String,
    pub seller_id: String,
    pub client_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    /// total = subtotal - discount. Not guarded against going negative.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
///
/// One cart line can produce several sale items, one per lot consumed:
/// `stock_lot_id` points back into lot history for traceability and
/// `cost_price_cents` snapshots the product's buying price at sale time
/// for margin reporting.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Lot this quantity was drawn from (traceability pointer, never
    /// mutates lot identity).
    pub stock_lot_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Product's buying price at the moment of sale (frozen).
    pub cost_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl SaleItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// Margin earned on this line (sell minus cost, times quantity).
    #[inline]
    pub fn margin_cents(&self) -> i64 {
        (self.unit_price_cents - self.cost_price_cents) * self.quantity
    }
}

/// A sale together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

impl SaleWithItems {
    /// Total margin across all lines, enabled by the cost-price snapshot.
    pub fn margin_cents(&self) -> i64 {
        self.items.iter().map(SaleItem::margin_cents).sum()
    }
}

// =============================================================================
// Read Aggregates
// =============================================================================

/// A product together with its non-exhausted lots, expiry ascending.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductWithLots {
    #[serde(flatten)]
    #[ts(flatten)]
    pub product: Product,
    /// Lots with quantity > 0, sorted by expiry date ascending.
    pub lots: Vec<StockLot>,
}

/// A reconciliation row: a product whose aggregate counter has drifted from
/// the sum of its lot quantities.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockDrift {
    pub product_id: String,
    pub code: String,
    pub current_stock: i64,
    pub lot_sum: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(stock: i64, min: i64) -> Product {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Product {
            id: "p1".into(),
            code: "2012345678905".into(),
            name: "Amoxicillin 500mg".into(),
            category: "Antibiotics".into(),
            sell_price_cents: 1500,
            buying_price_cents: 900,
            current_stock: stock,
            min_stock: min,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_has_stock_for() {
        let p = product(4, 0);
        assert!(p.has_stock_for(4));
        assert!(!p.has_stock_for(5));
    }

    #[test]
    fn test_below_min_stock() {
        assert!(product(2, 5).is_below_min_stock());
        assert!(!product(5, 5).is_below_min_stock());
    }

    #[test]
    fn test_requisition_item_creates_lot() {
        let mut item = RequisitionItem {
            id: "i1".into(),
            requisition_id: "r1".into(),
            product_id: "p1".into(),
            quantity: 20,
            buy_price_cents: 900,
            batch_number: Some("B1".into()),
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        };
        assert!(item.creates_lot());

        item.batch_number = None;
        assert!(!item.creates_lot());

        item.batch_number = Some("B1".into());
        item.expiry_date = None;
        assert!(!item.creates_lot());
    }

    #[test]
    fn test_sale_item_margin() {
        let item = SaleItem {
            id: "s1".into(),
            sale_id: "sale".into(),
            product_id: "p1".into(),
            stock_lot_id: "lot".into(),
            quantity: 3,
            unit_price_cents: 1500,
            cost_price_cents: 900,
            line_total_cents: 4500,
        };
        assert_eq!(item.margin_cents(), 1800);
    }

    #[test]
    fn test_requisition_status_default() {
        assert_eq!(RequisitionStatus::default(), RequisitionStatus::Draft);
    }
}
