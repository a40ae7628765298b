//! # Receiving Workflow
//!
//! The requisition (goods-receipt) state machine: draft creation and
//! validation.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Requisition State Machine                              │
//! │                                                                         │
//! │   create_draft()          validate()                                   │
//! │        │                      │                                         │
//! │        ▼                      ▼                                         │
//! │   ┌─────────┐   exactly   ┌───────────┐                                │
//! │   │  DRAFT  │────once────►│ VALIDATED │  (terminal)                    │
//! │   └─────────┘             └───────────┘                                │
//! │        │                                                                │
//! │        ╎ (no transition defined)                                       │
//! │        ▼                                                                │
//! │   ┌───────────┐                                                        │
//! │   │ CANCELLED │  reachable in the data model only                      │
//! │   └───────────┘                                                        │
//! │                                                                         │
//! │  validate() is all-or-nothing: either every item's stock and lot       │
//! │  effects land and the status flips, or the transaction rolls back.     │
//! │  A second validate() fails fast on the status guard - no separate     │
//! │  idempotency token.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use pharma_core::validation::{validate_non_empty, validate_price_cents, validate_quantity};
use pharma_core::{
    CoreError, Requisition, RequisitionItem, RequisitionStatus, RequisitionWithItems,
};
use pharma_db::repository::{lot, product, requisition};
use pharma_db::Database;

// =============================================================================
// Input Types
// =============================================================================

/// One line of a requisition draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequisitionItem {
    pub product_id: String,
    pub quantity: i64,
    pub buy_price_cents: i64,
    /// Together with `expiry_date`, enables lot creation on validation.
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

// =============================================================================
// Receiving Workflow
// =============================================================================

/// Orchestrates the requisition draft/validate lifecycle.
#[derive(Debug, Clone)]
pub struct ReceivingWorkflow {
    db: Database,
}

impl ReceivingWorkflow {
    /// Creates a new ReceivingWorkflow.
    pub fn new(db: Database) -> Self {
        ReceivingWorkflow { db }
    }

    /// Creates a requisition draft with its items.
    ///
    /// No stock effects happen here - the draft is a statement of intent
    /// until `validate` applies it.
    pub async fn create_draft(
        &self,
        supplier_id: &str,
        created_by_id: &str,
        items: Vec<NewRequisitionItem>,
    ) -> Result<RequisitionWithItems, ApiError> {
        debug!(supplier = %supplier_id, lines = items.len(), "create_draft");

        validate_non_empty("requisition items", items.len())?;
        for item in &items {
            validate_quantity(item.quantity)?;
            validate_price_cents("buy price", item.buy_price_cents)?;
        }

        let requisition_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let header = Requisition {
            id: requisition_id.clone(),
            reference: generate_requisition_reference(),
            status: RequisitionStatus::Draft,
            supplier_id: supplier_id.to_string(),
            created_by_id: created_by_id.to_string(),
            created_at: now,
        };

        let rows: Vec<RequisitionItem> = items
            .into_iter()
            .map(|item| RequisitionItem {
                id: requisition::generate_item_id(),
                requisition_id: requisition_id.clone(),
                product_id: item.product_id,
                quantity: item.quantity,
                buy_price_cents: item.buy_price_cents,
                batch_number: item.batch_number,
                expiry_date: item.expiry_date,
            })
            .collect();

        let mut tx = self.db.begin().await?;
        requisition::insert(&mut tx, &header, &rows).await?;
        tx.commit().await.map_err(pharma_db::DbError::from)?;

        info!(id = %header.id, reference = %header.reference, "Requisition draft created");

        Ok(RequisitionWithItems {
            requisition: header,
            items: rows,
        })
    }

    /// Validates a draft requisition, applying its stock effects.
    ///
    /// ## What This Does (one transaction)
    /// 1. Loads the requisition with its items
    /// 2. Guards the state: missing → not-found, non-draft → invalid-state
    /// 3. Per item: increments aggregate stock and overwrites the product's
    ///    buying price (last-received-price-wins, not a weighted average);
    ///    creates a stock lot when the line carries BOTH a batch number and
    ///    an expiry date - lines missing either contribute untracked
    ///    quantity only (explicit policy, not an omission)
    /// 4. Flips the status to VALIDATED, guarded by `status = 'draft'`
    /// 5. Commits; any failure rolls everything back
    pub async fn validate(&self, requisition_id: &str) -> Result<RequisitionWithItems, ApiError> {
        debug!(id = %requisition_id, "validate requisition");

        let mut tx = self.db.begin().await?;

        let Some(loaded) = requisition::get_with_items(&mut tx, requisition_id).await? else {
            return Err(CoreError::RequisitionNotFound(requisition_id.to_string()).into());
        };

        if loaded.requisition.status != RequisitionStatus::Draft {
            return Err(CoreError::InvalidRequisitionStatus {
                id: requisition_id.to_string(),
                status: loaded.requisition.status,
            }
            .into());
        }

        let received_date = Utc::now();

        for item in &loaded.items {
            // Aggregate increment + buying price overwrite; a vanished
            // product fails the whole validation
            product::receive_stock(&mut tx, &item.product_id, item.quantity, item.buy_price_cents)
                .await?;

            if let (Some(batch), Some(expiry)) = (&item.batch_number, item.expiry_date) {
                lot::insert(
                    &mut tx,
                    &item.product_id,
                    batch,
                    expiry,
                    item.quantity,
                    received_date,
                )
                .await?;
            }
        }

        // The status guard is re-checked by the UPDATE itself: a concurrent
        // validation that slipped past the read above loses here
        let transitioned = requisition::mark_validated(&mut tx, requisition_id).await?;
        if !transitioned {
            return Err(CoreError::InvalidRequisitionStatus {
                id: requisition_id.to_string(),
                status: loaded.requisition.status,
            }
            .into());
        }

        tx.commit().await.map_err(pharma_db::DbError::from)?;

        info!(id = %requisition_id, items = loaded.items.len(), "Requisition validated");

        Ok(RequisitionWithItems {
            requisition: Requisition {
                status: RequisitionStatus::Validated,
                ..loaded.requisition
            },
            items: loaded.items,
        })
    }

    /// Gets a requisition with its items.
    pub async fn get_requisition(&self, id: &str) -> Result<RequisitionWithItems, ApiError> {
        self.db
            .requisitions()
            .get_with_items(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Requisition", id))
    }

    /// Lists all requisitions, newest first.
    pub async fn get_requisitions(&self) -> Result<Vec<Requisition>, ApiError> {
        Ok(self.db.requisitions().list().await?)
    }
}

/// Generates a requisition reference: date prefix + random suffix, backed
/// by the UNIQUE column constraint.
fn generate_requisition_reference() -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let random: u16 = (nanos % 10000) as u16;
    format!("REQ{}-{:04}", now.format("%y%m%d-%H%M%S"), random)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requisition_reference_shape() {
        let reference = generate_requisition_reference();
        assert!(reference.starts_with("REQ"));
        assert_eq!(reference.len(), 21);
    }
}
