//! # pharma-db: Database Layer for Pharma POS
//!
//! This crate provides database access for the pharmacy stock ledger.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pharma POS Data Flow                              │
//! │                                                                         │
//! │  Service call (process_sale, validate_requisition)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pharma-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ product/lot/  │    │  (embedded)  │  │   │
//! │  │   │               │    │ requisition/  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ sale          │    │ 001_init.sql │  │   │
//! │  │   │ begin()       │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite Database (WAL mode)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Kinds of Access
//!
//! Repository structs hold the pool and serve plain reads. Transactional
//! writes are module-level functions over `&mut SqliteConnection`, so the
//! service layer can compose several of them inside ONE transaction:
//!
//! ```rust,ignore
//! let mut tx = db.begin().await?;
//! let hit = repository::product::try_decrement_stock(&mut tx, id, qty).await?;
//! repository::lot::decrement_quantity(&mut tx, lot_id, take).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::lot::LotRepository;
pub use repository::product::ProductRepository;
pub use repository::requisition::RequisitionRepository;
pub use repository::sale::SaleRepository;
