//! # Lot Allocation Module
//!
//! Pure FEFO (First-Expired-First-Out) allocation: given a product's
//! available lots and a requested quantity, split the request across lots
//! in expiry order.
//!
//! ## How Allocation Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    FEFO Allocation Walkthrough                          │
//! │                                                                         │
//! │  Request: 7 units                                                      │
//! │                                                                         │
//! │  Lots (sorted by expiry ascending):                                    │
//! │  ┌──────────────────────────┐   take min(5, 7) = 5  → need 2 more     │
//! │  │ lot-A  exp 2024-01-01  5 │──────────────────────┐                   │
//! │  ├──────────────────────────┤   take min(10, 2) = 2│→ need 0, stop    │
//! │  │ lot-B  exp 2024-06-01 10 │──────────────────────┤                   │
//! │  ├──────────────────────────┤   (never touched)    │                   │
//! │  │ lot-C  exp 2024-09-01  3 │                      │                   │
//! │  └──────────────────────────┘                      ▼                   │
//! │                                     [(lot-A, 5), (lot-B, 2)]           │
//! │                                                                         │
//! │  If the lots run out before the request is met, the allocator          │
//! │  reports the shortfall instead of returning a partial plan - the      │
//! │  caller must treat that as a data-consistency fault, because the      │
//! │  aggregate-stock check should have prevented it.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//! The allocator has no side effects: it reads a slice, returns a plan.
//! The caller (the sale processor) applies the plan inside its transaction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};

// =============================================================================
// Input / Output Types
// =============================================================================

/// A lot as seen by the allocator: identity plus the fields that drive
/// FEFO ordering. Callers must only pass lots with `quantity > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableLot {
    pub id: String,
    /// Quantity remaining in the lot (> 0).
    pub quantity: i64,
    /// Primary FEFO sort key.
    pub expiry_date: NaiveDate,
    /// Secondary sort key: ties on expiry are consumed oldest-received
    /// first, then by id, for determinism.
    pub received_date: DateTime<Utc>,
}

/// One entry of an allocation plan: take `quantity` units from `lot_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotAllocation {
    pub lot_id: String,
    pub quantity: i64,
}

// =============================================================================
// Allocation Algorithm
// =============================================================================

/// Splits a requested quantity across lots, earliest expiry first.
///
/// ## Guarantees
/// - The returned quantities sum to exactly `requested`.
/// - No allocation takes more than its lot's remaining quantity.
/// - Lots with identical expiry are consumed by received date, then id.
///
/// ## Errors
/// - [`CoreError::Validation`] if `requested` is not positive.
/// - [`CoreError::LotShortfall`] if the lots are exhausted before the
///   request is met. The caller has already verified the aggregate stock
///   figure covers the request, so a shortfall means the counter and the
///   lot rows disagree.
pub fn allocate_fefo(lots: &[AvailableLot], requested: i64) -> Result<Vec<LotAllocation>, CoreError> {
    if requested <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "requested quantity".to_string(),
        }
        .into());
    }

    // Sort a copy: FEFO is a per-call computation, not a persisted queue.
    let mut ordered: Vec<&AvailableLot> = lots.iter().filter(|l| l.quantity > 0).collect();
    ordered.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then(a.received_date.cmp(&b.received_date))
            .then(a.id.cmp(&b.id))
    });

    let mut plan = Vec::new();
    let mut still_needed = requested;

    for lot in ordered {
        if still_needed == 0 {
            break;
        }
        let take = lot.quantity.min(still_needed);
        plan.push(LotAllocation {
            lot_id: lot.id.clone(),
            quantity: take,
        });
        still_needed -= take;
    }

    if still_needed > 0 {
        return Err(CoreError::LotShortfall {
            requested,
            allocated: requested - still_needed,
        });
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn lot(id: &str, qty: i64, expiry: (i32, u32, u32)) -> AvailableLot {
        AvailableLot {
            id: id.to_string(),
            quantity: qty,
            expiry_date: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2).unwrap(),
            received_date: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_fefo_takes_earliest_expiry_first() {
        // [2024-01-01: 5, 2024-06-01: 10], request 7 → 5 + 2, never reversed
        let lots = vec![lot("jun", 10, (2024, 6, 1)), lot("jan", 5, (2024, 1, 1))];

        let plan = allocate_fefo(&lots, 7).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0], LotAllocation { lot_id: "jan".into(), quantity: 5 });
        assert_eq!(plan[1], LotAllocation { lot_id: "jun".into(), quantity: 2 });
    }

    #[test]
    fn test_single_lot_covers_request() {
        let lots = vec![lot("a", 10, (2024, 1, 1))];
        let plan = allocate_fefo(&lots, 10).unwrap();

        assert_eq!(plan, vec![LotAllocation { lot_id: "a".into(), quantity: 10 }]);
    }

    #[test]
    fn test_plan_quantities_sum_to_request() {
        let lots = vec![
            lot("a", 3, (2024, 1, 1)),
            lot("b", 4, (2024, 2, 1)),
            lot("c", 9, (2024, 3, 1)),
        ];
        let plan = allocate_fefo(&lots, 11).unwrap();

        let total: i64 = plan.iter().map(|p| p.quantity).sum();
        assert_eq!(total, 11);
        // Last lot only partially consumed
        assert_eq!(plan[2], LotAllocation { lot_id: "c".into(), quantity: 4 });
    }

    #[test]
    fn test_tie_break_on_received_date_then_id() {
        let mut early = lot("b", 5, (2024, 1, 1));
        early.received_date = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let late = lot("a", 5, (2024, 1, 1));

        let plan = allocate_fefo(&[late.clone(), early.clone()], 6).unwrap();
        assert_eq!(plan[0].lot_id, "b"); // older receipt wins the tie
        assert_eq!(plan[1].lot_id, "a");

        // Identical expiry and received date: id breaks the tie
        let same_a = lot("a", 5, (2024, 1, 1));
        let same_b = lot("b", 5, (2024, 1, 1));
        let plan = allocate_fefo(&[same_b, same_a], 6).unwrap();
        assert_eq!(plan[0].lot_id, "a");
    }

    #[test]
    fn test_shortfall_reported_not_silent() {
        let lots = vec![lot("a", 3, (2024, 1, 1)), lot("b", 2, (2024, 2, 1))];

        let err = allocate_fefo(&lots, 9).unwrap_err();
        match err {
            CoreError::LotShortfall { requested, allocated } => {
                assert_eq!(requested, 9);
                assert_eq!(allocated, 5);
            }
            other => panic!("expected LotShortfall, got {other:?}"),
        }
    }

    #[test]
    fn test_exhausted_lots_excluded() {
        let lots = vec![lot("empty", 0, (2024, 1, 1)), lot("full", 5, (2024, 6, 1))];

        let plan = allocate_fefo(&lots, 5).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].lot_id, "full");
    }

    #[test]
    fn test_non_positive_request_rejected() {
        let lots = vec![lot("a", 5, (2024, 1, 1))];
        assert!(allocate_fefo(&lots, 0).is_err());
        assert!(allocate_fefo(&lots, -3).is_err());
    }
}
