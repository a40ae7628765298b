//! # Error Types
//!
//! Domain-specific error types for pharma-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharma-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pharma-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  pharma-service errors                                                  │
//! │  └── ApiError         - What callers see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, quantities, status)
//! 3. Errors are enum variants, never String
//! 4. Business conditions are never retried - they are not transient faults

use thiserror::Error;

use crate::types::RequisitionStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or ledger consistency
/// failures. They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient aggregate stock to complete a sale line.
    ///
    /// ## When This Occurs
    /// - Requested quantity exceeds `current_stock`
    /// - A concurrent sale consumed the stock first (the conditional
    ///   decrement lost the race)
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// The lots ran out before the allocator met the request.
    ///
    /// The aggregate-stock check passed, so the counter and the lot rows
    /// disagree. This is a ledger consistency fault, not a business
    /// condition - the enclosing transaction must roll back.
    #[error("Lot shortfall: requested {requested}, only {allocated} allocatable from lots")]
    LotShortfall { requested: i64, allocated: i64 },

    /// Requisition cannot be found.
    #[error("Requisition not found: {0}")]
    RequisitionNotFound(String),

    /// Requisition is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Validating a requisition that was already validated
    /// - Validating a cancelled requisition
    #[error("Requisition {id} is {status:?}, expected Draft")]
    InvalidRequisitionStatus {
        id: String,
        status: RequisitionStatus,
    },

    /// Product code already in use.
    #[error("Product code '{0}' already exists")]
    DuplicateCode(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any transaction starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A collection that must not be empty is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// Invalid format (e.g., invalid UUID, malformed code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "2012345678905".to_string(),
            available: 4,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 2012345678905: available 4, requested 10"
        );
    }

    #[test]
    fn test_invalid_status_message() {
        let err = CoreError::InvalidRequisitionStatus {
            id: "req-1".to_string(),
            status: RequisitionStatus::Validated,
        };
        assert_eq!(err.to_string(), "Requisition req-1 is Validated, expected Draft");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
