//! # Product Code Generation
//!
//! Generates EAN-13-like product codes for products registered without an
//! explicit code.
//!
//! ## Code Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Generated Code Anatomy                              │
//! │                                                                         │
//! │   2 0  9 8 7 6 5 4 3 2 1  0  C                                         │
//! │   └┬┘  └────────┬────────┘  │  └─ check digit (computed)               │
//! │    │            │           └──── placeholder digit                    │
//! │    │            └──────────────── 9 least-significant timestamp digits │
//! │    └───────────────────────────── internal-use prefix ("20")           │
//! │                                                                         │
//! │  Check digit: standard EAN-13 scheme - weight the 12 base digits       │
//! │  alternately 1×/3× (left to right), sum, and take the mod-10           │
//! │  complement.                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Uniqueness
//! The generator is deterministic for a given timestamp; uniqueness is
//! probabilistic. The caller must still check the code against existing
//! products before persisting and reject on collision - the generator does
//! not retry.

use chrono::Utc;

/// Internal-use EAN prefix for system-assigned codes.
///
/// The 20-29 range is reserved for in-store numbering, so generated codes
/// can never collide with real manufacturer barcodes.
pub const INTERNAL_PREFIX: &str = "20";

/// Computes the EAN-13 check digit over 12 base digits.
///
/// Digits at odd positions (1st, 3rd, ...) weigh 1, even positions weigh 3;
/// the check digit is the mod-10 complement of the weighted sum.
///
/// ## Example
/// ```rust
/// use pharma_core::codegen::check_digit;
///
/// // Classic EAN-13 example: 400638133393 → check digit 1
/// let digits = [4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3];
/// assert_eq!(check_digit(&digits), 1);
/// ```
pub fn check_digit(digits: &[u8; 12]) -> u8 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let weight = if i % 2 == 0 { 1 } else { 3 };
            u32::from(d) * weight
        })
        .sum();

    ((10 - (sum % 10)) % 10) as u8
}

/// Generates a 13-digit product code from a millisecond timestamp.
///
/// Deterministic: the same timestamp always yields the same code.
pub fn generate_code_at(timestamp_millis: i64) -> String {
    // 9 least-significant digits of the timestamp, zero-padded
    let tail = (timestamp_millis.unsigned_abs() % 1_000_000_000) as u64;
    let base = format!("{INTERNAL_PREFIX}{tail:09}0");

    debug_assert_eq!(base.len(), 12);

    let mut digits = [0u8; 12];
    for (i, c) in base.bytes().enumerate() {
        digits[i] = c - b'0';
    }

    format!("{base}{}", check_digit(&digits))
}

/// Generates a product code from the current time.
pub fn generate_code() -> String {
    generate_code_at(Utc::now().timestamp_millis())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Recomputes the check digit independently of the generator.
    fn verify(code: &str) -> bool {
        assert_eq!(code.len(), 13);
        let digits: Vec<u32> = code.chars().map(|c| c.to_digit(10).unwrap()).collect();
        let sum: u32 = digits[..12]
            .iter()
            .enumerate()
            .map(|(i, &d)| if i % 2 == 0 { d } else { d * 3 })
            .sum();
        (10 - (sum % 10)) % 10 == digits[12]
    }

    #[test]
    fn test_known_check_digits() {
        // Published EAN-13 examples
        assert_eq!(check_digit(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3]), 1);
        assert_eq!(check_digit(&[5, 9, 0, 1, 2, 3, 4, 1, 2, 3, 4, 5]), 7);
        // All zeros → complement of 0 is 0
        assert_eq!(check_digit(&[0; 12]), 0);
    }

    #[test]
    fn test_generated_code_shape() {
        let code = generate_code_at(1_700_000_000_123);
        assert_eq!(code.len(), 13);
        assert!(code.starts_with(INTERNAL_PREFIX));
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_check_digit_valid_for_any_timestamp() {
        for ts in [0i64, 1, 999, 1_700_000_000_123, i64::MAX, 86_400_000] {
            assert!(verify(&generate_code_at(ts)), "bad check digit for ts {ts}");
        }
    }

    #[test]
    fn test_deterministic_per_timestamp() {
        assert_eq!(generate_code_at(123_456_789), generate_code_at(123_456_789));
        assert_ne!(generate_code_at(123_456_789), generate_code_at(123_456_790));
    }

    #[test]
    fn test_timestamp_tail_is_zero_padded() {
        // Small timestamp must still produce a 13-digit code:
        // prefix "20" + "000000042" + placeholder "0" + check digit
        let code = generate_code_at(42);
        assert_eq!(code.len(), 13);
        assert!(code.starts_with("200000000420"));
    }
}
