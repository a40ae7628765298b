//! # Response Envelope
//!
//! Uniform request/response envelope for all ledger operations:
//!
//! ```json
//! { "success": true,  "data": { … } }
//! { "success": false, "error": { "message": "…", "code": "NOT_FOUND" } }
//! ```
//!
//! Services return plain `Result<T, ApiError>`; the envelope is the wire
//! shape for callers that want a single uniform frame (IPC, HTTP bridge).

use serde::Serialize;

use crate::error::ApiError;

/// Uniform operation envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Wraps a successful result.
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Wraps a failure.
    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T> From<Result<T, ApiError>> for ApiResponse<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => ApiResponse::ok(data),
            Err(error) => ApiResponse::err(error),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_ok_envelope_shape() {
        let resp = ApiResponse::ok(42);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 42);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_err_envelope_shape() {
        let resp: ApiResponse<()> =
            ApiResponse::err(ApiError::new(ErrorCode::NotFound, "Product not found: p1"));
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "Product not found: p1");
    }

    #[test]
    fn test_from_result() {
        let ok: ApiResponse<i32> = Ok(7).into();
        assert!(ok.success);

        let err: ApiResponse<i32> = Err(ApiError::validation("bad input")).into();
        assert!(!err.success);
    }
}
