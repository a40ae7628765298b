//! # Repository Module
//!
//! Database repository implementations for the pharmacy ledger.
//!
//! ## Repository Pattern, Transactionally
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Reads vs. Transactional Writes                             │
//! │                                                                         │
//! │  Plain reads go through repository structs holding the pool:           │
//! │                                                                         │
//! │      db.products().get_by_code("2012…")                                │
//! │                                                                         │
//! │  Ledger mutations go through module-level functions taking a           │
//! │  connection, so the SERVICE layer owns the transaction boundary:       │
//! │                                                                         │
//! │      let mut tx = db.begin().await?;                                   │
//! │      product::try_decrement_stock(&mut tx, id, qty).await?;            │
//! │      lot::decrement_quantity(&mut tx, lot_id, take).await?;            │
//! │      sale::insert(&mut tx, &sale).await?;                              │
//! │      tx.commit().await?;      // all-or-nothing                        │
//! │                                                                         │
//! │  A repository never calls begin()/commit() itself - a helper that      │
//! │  hid the transaction would make multi-row atomicity impossible to      │
//! │  compose.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product`] - Product rows, aggregate stock counter mutations
//! - [`lot`] - Stock lot rows, FEFO-ordered reads, guarded decrements
//! - [`requisition`] - Goods-receipt documents and their items
//! - [`sale`] - Sale and sale item rows

pub mod lot;
pub mod product;
pub mod requisition;
pub mod sale;
