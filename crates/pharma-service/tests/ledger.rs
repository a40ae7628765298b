//! End-to-end ledger tests over an in-memory database.
//!
//! Each test drives the real service stack (receiving, sale, product) and
//! asserts on the resulting ledger state: aggregate stock, lot quantities,
//! and their agreement.

use chrono::NaiveDate;

use pharma_core::{PaymentMethod, Product, RequisitionStatus, StockLot};
use pharma_db::{Database, DbConfig};
use pharma_service::{
    CartLine, ErrorCode, NewProduct, NewRequisitionItem, NewSale, ProductService,
    ReceivingWorkflow, SaleProcessor,
};

// =============================================================================
// Test Helpers
// =============================================================================

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database should initialize")
}

async fn seed_product(db: &Database, name: &str, sell_price_cents: i64) -> Product {
    ProductService::new(db.clone())
        .create_product(NewProduct {
            name: name.to_string(),
            category: "Analgesic".to_string(),
            code: None,
            sell_price_cents,
            buying_price_cents: sell_price_cents / 2,
            min_stock: 0,
        })
        .await
        .expect("product creation should succeed")
}

/// Receives stock through the full draft/validate cycle, creating a lot.
async fn receive_lot(
    db: &Database,
    product_id: &str,
    quantity: i64,
    buy_price_cents: i64,
    batch: &str,
    expiry: NaiveDate,
) {
    let workflow = ReceivingWorkflow::new(db.clone());
    let draft = workflow
        .create_draft(
            "supplier-1",
            "user-1",
            vec![NewRequisitionItem {
                product_id: product_id.to_string(),
                quantity,
                buy_price_cents,
                batch_number: Some(batch.to_string()),
                expiry_date: Some(expiry),
            }],
        )
        .await
        .expect("draft creation should succeed");
    workflow
        .validate(&draft.requisition.id)
        .await
        .expect("validation should succeed");
}

async fn product_by_id(db: &Database, id: &str) -> Product {
    db.products()
        .get_by_id(id)
        .await
        .expect("lookup should succeed")
        .expect("product should exist")
}

async fn lots_of(db: &Database, product_id: &str) -> Vec<StockLot> {
    let mut lots: Vec<StockLot> = db
        .products()
        .list_with_lots()
        .await
        .expect("listing should succeed")
        .into_iter()
        .find(|p| p.product.id == product_id)
        .map(|p| p.lots)
        .unwrap_or_default();
    lots.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date));
    lots
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn cash_sale(product_id: &str, quantity: i64, unit_price_cents: i64) -> NewSale {
    NewSale {
        seller_id: "user-1".to_string(),
        client_id: None,
        payment_method: PaymentMethod::Cash,
        items: vec![CartLine {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents,
        }],
        discount_cents: 0,
    }
}

// =============================================================================
// Receiving
// =============================================================================

#[tokio::test]
async fn draft_then_validate_creates_lot_and_stock() {
    let db = test_db().await;
    let product = seed_product(&db, "Paracetamol 500mg", 1099).await;
    assert_eq!(product.current_stock, 0, "stock starts at zero");

    let workflow = ReceivingWorkflow::new(db.clone());
    let draft = workflow
        .create_draft(
            "supplier-1",
            "user-1",
            vec![NewRequisitionItem {
                product_id: product.id.clone(),
                quantity: 20,
                buy_price_cents: 450,
                batch_number: Some("B1".to_string()),
                expiry_date: Some(date(2027, 1, 1)),
            }],
        )
        .await
        .unwrap();
    assert_eq!(draft.requisition.status, RequisitionStatus::Draft);

    // Draft has no stock effects
    let before = product_by_id(&db, &product.id).await;
    assert_eq!(before.current_stock, 0);
    assert!(lots_of(&db, &product.id).await.is_empty());

    let validated = workflow.validate(&draft.requisition.id).await.unwrap();
    assert_eq!(validated.requisition.status, RequisitionStatus::Validated);

    let after = product_by_id(&db, &product.id).await;
    assert_eq!(after.current_stock, 20);
    assert_eq!(after.buying_price_cents, 450, "buying price overwritten");

    let lots = lots_of(&db, &product.id).await;
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].batch_number, "B1");
    assert_eq!(lots[0].quantity, 20);
    assert_eq!(lots[0].expiry_date, date(2027, 1, 1));
}

#[tokio::test]
async fn validate_is_one_shot() {
    let db = test_db().await;
    let product = seed_product(&db, "Ibuprofen 200mg", 899).await;

    let workflow = ReceivingWorkflow::new(db.clone());
    let draft = workflow
        .create_draft(
            "supplier-1",
            "user-1",
            vec![NewRequisitionItem {
                product_id: product.id.clone(),
                quantity: 10,
                buy_price_cents: 300,
                batch_number: Some("B1".to_string()),
                expiry_date: Some(date(2027, 6, 1)),
            }],
        )
        .await
        .unwrap();

    workflow.validate(&draft.requisition.id).await.unwrap();

    let err = workflow
        .validate(&draft.requisition.id)
        .await
        .expect_err("second validation must fail");
    assert_eq!(err.code, ErrorCode::InvalidState);

    // Stock applied exactly once
    let after = product_by_id(&db, &product.id).await;
    assert_eq!(after.current_stock, 10);
    let lots = lots_of(&db, &product.id).await;
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].quantity, 10);
}

#[tokio::test]
async fn validating_missing_requisition_is_not_found() {
    let db = test_db().await;
    let err = ReceivingWorkflow::new(db)
        .validate("no-such-requisition")
        .await
        .expect_err("must fail");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn untracked_receipt_line_adds_stock_without_lot() {
    let db = test_db().await;
    let product = seed_product(&db, "Amoxicillin 250mg", 1500).await;

    let workflow = ReceivingWorkflow::new(db.clone());
    let draft = workflow
        .create_draft(
            "supplier-1",
            "user-1",
            vec![NewRequisitionItem {
                product_id: product.id.clone(),
                quantity: 8,
                buy_price_cents: 600,
                batch_number: None,
                expiry_date: Some(date(2027, 1, 1)), // expiry without batch: no lot
            }],
        )
        .await
        .unwrap();
    workflow.validate(&draft.requisition.id).await.unwrap();

    let after = product_by_id(&db, &product.id).await;
    assert_eq!(after.current_stock, 8);
    assert!(lots_of(&db, &product.id).await.is_empty());

    // The drift report surfaces the untracked quantity
    let drift = ProductService::new(db.clone())
        .verify_stock_consistency()
        .await
        .unwrap();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].product_id, product.id);
    assert_eq!(drift[0].current_stock, 8);
    assert_eq!(drift[0].lot_sum, 0);
}

#[tokio::test]
async fn empty_draft_is_rejected() {
    let db = test_db().await;
    let err = ReceivingWorkflow::new(db)
        .create_draft("supplier-1", "user-1", vec![])
        .await
        .expect_err("empty draft must fail");
    assert_eq!(err.code, ErrorCode::ValidationError);
}

// =============================================================================
// Sales and FEFO Depletion
// =============================================================================

#[tokio::test]
async fn sale_depletes_earliest_expiry_first() {
    let db = test_db().await;
    let product = seed_product(&db, "Aspirin 100mg", 750).await;
    receive_lot(&db, &product.id, 5, 300, "EARLY", date(2026, 1, 1)).await;
    receive_lot(&db, &product.id, 10, 300, "LATE", date(2026, 6, 1)).await;

    let sale = SaleProcessor::new(db.clone())
        .process_sale(cash_sale(&product.id, 7, 750))
        .await
        .unwrap();

    // 5 drawn from the earlier-expiring lot, 2 from the later
    assert_eq!(sale.items.len(), 2);
    let mut drawn_lots = Vec::new();
    for item in &sale.items {
        let lot = db
            .lots()
            .get_by_id(&item.stock_lot_id)
            .await
            .unwrap()
            .expect("sale item points to a real lot");
        drawn_lots.push((lot, item.quantity));
    }
    drawn_lots.sort_by(|a, b| a.0.expiry_date.cmp(&b.0.expiry_date));

    let (early, early_drawn) = &drawn_lots[0];
    assert_eq!(early.batch_number, "EARLY");
    assert_eq!(*early_drawn, 5);
    assert_eq!(early.quantity, 0, "earliest lot fully drained");

    let (late, late_drawn) = &drawn_lots[1];
    assert_eq!(late.batch_number, "LATE");
    assert_eq!(*late_drawn, 2);
    assert_eq!(late.quantity, 8);

    let after = product_by_id(&db, &product.id).await;
    assert_eq!(after.current_stock, 8);
}

#[tokio::test]
async fn insufficient_stock_rejects_whole_sale() {
    let db = test_db().await;
    let product = seed_product(&db, "Cetirizine 10mg", 550).await;
    receive_lot(&db, &product.id, 4, 200, "B1", date(2026, 12, 1)).await;

    let processor = SaleProcessor::new(db.clone());
    let err = processor
        .process_sale(cash_sale(&product.id, 10, 550))
        .await
        .expect_err("oversell must fail");
    assert_eq!(err.code, ErrorCode::InsufficientStock);

    // Nothing changed
    let after = product_by_id(&db, &product.id).await;
    assert_eq!(after.current_stock, 4);
    let lots = lots_of(&db, &product.id).await;
    assert_eq!(lots[0].quantity, 4);
    assert!(processor.get_sales().await.unwrap().is_empty());
}

#[tokio::test]
async fn sale_failure_rolls_back_earlier_lines() {
    let db = test_db().await;
    let product = seed_product(&db, "Loratadine 10mg", 650).await;
    receive_lot(&db, &product.id, 12, 250, "B1", date(2026, 9, 1)).await;

    let processor = SaleProcessor::new(db.clone());
    let err = processor
        .process_sale(NewSale {
            seller_id: "user-1".to_string(),
            client_id: None,
            payment_method: PaymentMethod::Cash,
            items: vec![
                CartLine {
                    product_id: product.id.clone(),
                    quantity: 3,
                    unit_price_cents: 650,
                },
                CartLine {
                    product_id: "no-such-product".to_string(),
                    quantity: 1,
                    unit_price_cents: 100,
                },
            ],
            discount_cents: 0,
        })
        .await
        .expect_err("second line must sink the sale");
    assert_eq!(err.code, ErrorCode::NotFound);

    // The first line's decrement rolled back with the transaction
    let after = product_by_id(&db, &product.id).await;
    assert_eq!(after.current_stock, 12);
    let lots = lots_of(&db, &product.id).await;
    assert_eq!(lots[0].quantity, 12);
    assert!(processor.get_sales().await.unwrap().is_empty());
}

#[tokio::test]
async fn sale_totals_and_margin_are_recorded() {
    let db = test_db().await;
    let product = seed_product(&db, "Omeprazole 20mg", 1200).await;
    receive_lot(&db, &product.id, 10, 400, "B1", date(2027, 3, 1)).await;

    let sale = SaleProcessor::new(db.clone())
        .process_sale(NewSale {
            seller_id: "user-1".to_string(),
            client_id: Some("client-7".to_string()),
            payment_method: PaymentMethod::Card,
            items: vec![CartLine {
                product_id: product.id.clone(),
                quantity: 3,
                unit_price_cents: 1200,
            }],
            discount_cents: 100,
        })
        .await
        .unwrap();

    assert_eq!(sale.sale.subtotal_cents, 3600);
    assert_eq!(sale.sale.discount_cents, 100);
    assert_eq!(sale.sale.total_cents, 3500);
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].cost_price_cents, 400);
    assert_eq!(sale.items[0].line_total_cents, 3600);
    // margin = (1200 - 400) * 3
    assert_eq!(sale.margin_cents(), 2400);

    // Round-trips through the read path
    let fetched = SaleProcessor::new(db)
        .get_sale(&sale.sale.id)
        .await
        .unwrap();
    assert_eq!(fetched.sale.total_cents, 3500);
    assert_eq!(fetched.items.len(), 1);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let db = test_db().await;
    let err = SaleProcessor::new(db)
        .process_sale(NewSale {
            seller_id: "user-1".to_string(),
            client_id: None,
            payment_method: PaymentMethod::Cash,
            items: vec![],
            discount_cents: 0,
        })
        .await
        .expect_err("empty cart must fail");
    assert_eq!(err.code, ErrorCode::ValidationError);
}

// =============================================================================
// Ledger Consistency
// =============================================================================

#[tokio::test]
async fn stock_conserved_across_mixed_activity() {
    let db = test_db().await;
    let product = seed_product(&db, "Metformin 500mg", 980).await;
    receive_lot(&db, &product.id, 6, 350, "B1", date(2026, 4, 1)).await;
    receive_lot(&db, &product.id, 4, 350, "B2", date(2026, 8, 1)).await;

    let processor = SaleProcessor::new(db.clone());
    processor
        .process_sale(cash_sale(&product.id, 3, 980))
        .await
        .unwrap();
    processor
        .process_sale(cash_sale(&product.id, 2, 980))
        .await
        .unwrap();

    let after = product_by_id(&db, &product.id).await;
    let lot_sum: i64 = lots_of(&db, &product.id).await.iter().map(|l| l.quantity).sum();
    assert_eq!(after.current_stock, 5);
    assert_eq!(lot_sum, 5, "aggregate and lot rows agree");

    let drift = ProductService::new(db)
        .verify_stock_consistency()
        .await
        .unwrap();
    assert!(drift.is_empty(), "no drift after lot-tracked activity");
}

#[tokio::test]
async fn duplicate_product_code_is_rejected() {
    let db = test_db().await;
    let service = ProductService::new(db);
    let first = service
        .create_product(NewProduct {
            name: "Vitamin C 1000mg".to_string(),
            category: String::new(),
            code: Some("2001234567893".to_string()),
            sell_price_cents: 500,
            buying_price_cents: 200,
            min_stock: 0,
        })
        .await
        .unwrap();
    assert_eq!(first.code, "2001234567893");

    let err = service
        .create_product(NewProduct {
            name: "Vitamin C 500mg".to_string(),
            category: String::new(),
            code: Some("2001234567893".to_string()),
            sell_price_cents: 300,
            buying_price_cents: 120,
            min_stock: 0,
        })
        .await
        .expect_err("duplicate code must fail");
    assert_eq!(err.code, ErrorCode::DuplicateCode);
}

#[tokio::test]
async fn low_stock_report_flags_products_below_minimum() {
    let db = test_db().await;
    let service = ProductService::new(db.clone());
    let product = service
        .create_product(NewProduct {
            name: "Insulin Glargine".to_string(),
            category: "Diabetes".to_string(),
            code: None,
            sell_price_cents: 4500,
            buying_price_cents: 3000,
            min_stock: 10,
        })
        .await
        .unwrap();

    // 0 < 10: flagged
    let low = service.get_low_stock_products().await.unwrap();
    assert!(low.iter().any(|p| p.id == product.id));

    receive_lot(&db, &product.id, 25, 3000, "B1", date(2027, 2, 1)).await;

    let low = service.get_low_stock_products().await.unwrap();
    assert!(!low.iter().any(|p| p.id == product.id));
}
