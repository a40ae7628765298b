//! # Pharma Service
//!
//! The service layer of the pharmacy point-of-sale: validation, transaction
//! orchestration, and the API envelope the frontend consumes.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Service Layer                                    │
//! │                                                                         │
//! │   ┌────────────────┐  ┌────────────────┐  ┌────────────────────┐       │
//! │   │ ProductService │  │ SaleProcessor  │  │ ReceivingWorkflow  │       │
//! │   │                │  │                │  │                    │       │
//! │   │ create/list    │  │ atomic sale    │  │ draft → validate   │       │
//! │   │ low stock      │  │ FEFO depletion │  │ stock + lot intake │       │
//! │   │ drift check    │  │ oversell guard │  │ status guard       │       │
//! │   └───────┬────────┘  └───────┬────────┘  └─────────┬──────────┘       │
//! │           │                   │                     │                  │
//! │           └───────────────────┼─────────────────────┘                  │
//! │                               ▼                                        │
//! │                     ┌──────────────────┐                               │
//! │                     │    pharma-db     │  one transaction per          │
//! │                     │  (SQLite pool)   │  state-changing operation     │
//! │                     └──────────────────┘                               │
//! │                                                                         │
//! │  Every fallible entry point returns Result<T, ApiError>; callers       │
//! │  wrap it in ApiResponse<T> for the wire.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod product;
pub mod requisition;
pub mod response;
pub mod sale;

pub use error::{ApiError, ErrorCode};
pub use product::{NewProduct, ProductService};
pub use requisition::{NewRequisitionItem, ReceivingWorkflow};
pub use response::ApiResponse;
pub use sale::{CartLine, NewSale, SaleProcessor};
