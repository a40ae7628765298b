//! # Product Service
//!
//! Product registration and catalog reads.
//!
//! Stock enters the ledger only through the receiving workflow, so product
//! creation always starts at zero aggregate stock regardless of what the
//! caller supplies.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use pharma_core::validation::{
    validate_price_cents, validate_product_code, validate_product_name,
};
use pharma_core::{codegen, CoreError, Product, ProductWithLots, StockDrift};
use pharma_db::repository::product;
use pharma_db::Database;

/// Input for product registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Explicit code; generated (EAN-13-like) when absent.
    pub code: Option<String>,
    pub sell_price_cents: i64,
    pub buying_price_cents: i64,
    #[serde(default)]
    pub min_stock: i64,
}

/// Product registration and catalog reads.
#[derive(Debug, Clone)]
pub struct ProductService {
    db: Database,
}

impl ProductService {
    /// Creates a new ProductService.
    pub fn new(db: Database) -> Self {
        ProductService { db }
    }

    /// Registers a new product.
    ///
    /// ## What This Does
    /// 1. Validates the input (name, prices)
    /// 2. Uses the supplied code, or generates an internally-namespaced
    ///    EAN-13-like code from the current timestamp
    /// 3. Checks the code against existing products - a collision is
    ///    rejected, not regenerated
    /// 4. Persists with `current_stock` forced to 0
    pub async fn create_product(&self, input: NewProduct) -> Result<Product, ApiError> {
        debug!(name = %input.name, "create_product");

        validate_product_name(&input.name)?;
        validate_price_cents("sell price", input.sell_price_cents)?;
        validate_price_cents("buying price", input.buying_price_cents)?;

        let code = match &input.code {
            Some(code) => {
                validate_product_code(code)?;
                code.trim().to_string()
            }
            None => codegen::generate_code(),
        };

        // Caller-side uniqueness check; the UNIQUE column constraint is the
        // backstop against a race between the check and the insert.
        if self.db.products().get_by_code(&code).await?.is_some() {
            return Err(CoreError::DuplicateCode(code).into());
        }

        let now = Utc::now();
        let product = Product {
            id: product::generate_product_id(),
            code,
            name: input.name.trim().to_string(),
            category: input.category.trim().to_string(),
            sell_price_cents: input.sell_price_cents,
            buying_price_cents: input.buying_price_cents,
            // Stock enters only through the receiving workflow
            current_stock: 0,
            min_stock: input.min_stock.max(0),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        product::insert(&mut tx, &product).await?;
        tx.commit()
            .await
            .map_err(pharma_db::DbError::from)?;

        info!(id = %product.id, code = %product.code, "Product created");

        Ok(product)
    }

    /// Returns all products, each with its non-empty lots sorted by expiry
    /// date ascending.
    pub async fn get_all_products(&self) -> Result<Vec<ProductWithLots>, ApiError> {
        Ok(self.db.products().list_with_lots().await?)
    }

    /// Returns products below their minimum stock threshold.
    pub async fn get_low_stock_products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.db.products().list_below_min_stock().await?)
    }

    /// Reconciliation safety net: returns products whose denormalized
    /// aggregate counter disagrees with the sum of their lot quantities.
    ///
    /// An empty result is the expected state for fully lot-tracked stock.
    /// Products that received lines without batch/expiry carry untracked
    /// quantity and will appear here - that surplus is visible on purpose,
    /// it marks stock with no lot-level traceability.
    pub async fn verify_stock_consistency(&self) -> Result<Vec<StockDrift>, ApiError> {
        let drift = self.db.products().stock_drift().await?;
        if !drift.is_empty() {
            tracing::warn!(products = drift.len(), "Stock drift detected");
        }
        Ok(drift)
    }
}
