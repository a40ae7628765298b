//! # pharma-core: Pure Business Logic for Pharma POS
//!
//! This crate is the **heart** of the pharmacy stock ledger. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pharma POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 pharma-service (Orchestration)                  │   │
//! │  │    SaleProcessor ──► ReceivingWorkflow ──► ProductService       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pharma-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ allocation │  │  codegen  │  │ validation│  │   │
//! │  │   │  Product  │  │   FEFO     │  │  EAN-13   │  │   rules   │  │   │
//! │  │   │ StockLot  │  │  splitter  │  │check digit│  │  checks   │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   pharma-db (Database Layer)                    │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, StockLot, Requisition, Sale)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`allocation`] - FEFO lot allocation algorithm
//! - [`codegen`] - EAN-13-like product code generation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use pharma_core::allocation::{allocate_fefo, AvailableLot};
//! use chrono::{NaiveDate, TimeZone, Utc};
//!
//! let lots = vec![
//!     AvailableLot {
//!         id: "lot-jan".into(),
//!         quantity: 5,
//!         expiry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         received_date: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
//!     },
//!     AvailableLot {
//!         id: "lot-jun".into(),
//!         quantity: 10,
//!         expiry_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//!         received_date: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
//!     },
//! ];
//!
//! // FEFO: the January lot is drained before the June lot is touched
//! let plan = allocate_fefo(&lots, 7).unwrap();
//! assert_eq!(plan[0].quantity, 5);
//! assert_eq!(plan[1].quantity, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod codegen;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use pharma_core::Money` instead of
// `use pharma_core::money::Money`

pub use allocation::{allocate_fefo, AvailableLot, LotAllocation};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single sale cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps a single sale transaction bounded.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart or requisition
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 10000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 9999;
