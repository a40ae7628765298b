//! # API Error Type
//!
//! Unified error type surfaced to callers of the ledger services.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  ValidationError ──┐                                                   │
//! │                    ├──► CoreError ──┐                                  │
//! │  (allocation,      │                ├──► ApiError { code, message }    │
//! │   status guards)───┘                │                                  │
//! │                                     │                                  │
//! │  DbError (sqlx) ────────────────────┘                                  │
//! │                                                                         │
//! │  Callers get a stable machine-readable code plus a human-readable      │
//! │  message - enough to tell "insufficient stock" from "not found"        │
//! │  from "already validated" without parsing free text.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use pharma_core::{CoreError, ValidationError};
use pharma_db::DbError;

/// API error returned from ledger operations.
///
/// ## Serialization
/// This is what the caller receives when an operation fails:
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for 2012345678905: available 4, requested 10"
/// }
/// ```
#[derive(Debug, Clone, Error, Serialize)]
#[error("[{code:?}] {message}")]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced entity does not exist
    NotFound,

    /// Input validation failed before any transaction started
    ValidationError,

    /// Requested quantity exceeds available stock
    InsufficientStock,

    /// Requisition not in a state that allows the transition
    InvalidState,

    /// Product code already in use
    DuplicateCode,

    /// Database operation failed
    DatabaseError,

    /// Ledger consistency fault or unexpected internal failure
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core business errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::RequisitionNotFound(id) => ApiError::not_found("Requisition", id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            // The aggregate counter and the lot rows disagree - a ledger
            // fault, not a business condition
            CoreError::LotShortfall { .. } => {
                tracing::error!("Ledger consistency fault: {err}");
                ApiError::new(ErrorCode::Internal, err.to_string())
            }
            CoreError::InvalidRequisitionStatus { .. } => {
                ApiError::new(ErrorCode::InvalidState, err.to_string())
            }
            CoreError::DuplicateCode(_) => ApiError::new(ErrorCode::DuplicateCode, err.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::DuplicateCode,
                format!("{field} '{value}' already exists"),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {message}");
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {e}");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {e}");
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {e}");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pharma_core::RequisitionStatus;

    #[test]
    fn test_codes_are_distinguishable() {
        let insufficient: ApiError = CoreError::InsufficientStock {
            code: "X".into(),
            available: 4,
            requested: 10,
        }
        .into();
        let not_found: ApiError = CoreError::ProductNotFound("p1".into()).into();
        let invalid: ApiError = CoreError::InvalidRequisitionStatus {
            id: "r1".into(),
            status: RequisitionStatus::Validated,
        }
        .into();

        assert_eq!(insufficient.code, ErrorCode::InsufficientStock);
        assert_eq!(not_found.code, ErrorCode::NotFound);
        assert_eq!(invalid.code, ErrorCode::InvalidState);
    }

    #[test]
    fn test_code_serialization() {
        let err = ApiError::new(ErrorCode::InsufficientStock, "msg");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
    }
}
