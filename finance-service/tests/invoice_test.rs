//! Document creation and calculation tests.

mod common;

use common::{reference_invoice, TestApp};
use serde_json::json;

#[tokio::test]
async fn create_invoice_computes_reference_totals() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;

    assert_eq!(doc["doc_type"], "invoice");
    assert_eq!(doc["status"], "draft");
    assert_eq!(doc["document_number"], "INV-FY2526-0001");
    assert_eq!(doc["fiscal_year"], "FY2526");

    assert_eq!(doc["subtotal"]["amount"], "2000.00");
    assert_eq!(doc["discount_total"]["amount"], "100.00");
    assert_eq!(doc["tax_total"]["amount"], "342.00");
    assert_eq!(doc["grand_total"]["amount"], "2242.00");
    assert_eq!(doc["paid_amount"]["amount"], "0.00");
    assert_eq!(doc["balance_due"]["amount"], "2242.00");
    assert_eq!(doc["grand_total"]["currency"], "INR");
}

#[tokio::test]
async fn line_items_carry_derived_amounts() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let items = doc["line_items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["amount"]["amount"], "1000.00");
    assert_eq!(items[0]["discount_amount"]["amount"], "0.00");
    assert_eq!(items[0]["tax_amount"]["amount"], "180.00");
    assert_eq!(items[0]["total"]["amount"], "1180.00");

    assert_eq!(items[1]["amount"]["amount"], "1000.00");
    assert_eq!(items[1]["discount_amount"]["amount"], "100.00");
    assert_eq!(items[1]["tax_amount"]["amount"], "162.00");
    assert_eq!(items[1]["total"]["amount"], "1062.00");
}

#[tokio::test]
async fn empty_line_items_are_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/api/documents",
            &json!({
                "doc_type": "invoice",
                "issue_date": "2025-06-01",
                "currency": "INR",
                "line_items": []
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn invalid_currency_code_is_rejected() {
    let app = TestApp::spawn().await;

    let mut body = reference_invoice("2025-06-01");
    body["currency"] = json!("RUPEES");
    let response = app.post("/api/documents", &body).await;

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn missing_company_header_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/documents", app.address))
        .json(&reference_invoice("2025-06-01"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn document_types_use_their_own_series() {
    let app = TestApp::spawn().await;

    let mut body = reference_invoice("2025-06-01");
    body["invoice_kind"] = json!("export");
    let export = app.create_document(&body).await;
    assert_eq!(export["document_number"], "EXP-FY2526-0001");

    let mut body = reference_invoice("2025-06-01");
    body["doc_type"] = json!("bill");
    let bill = app.create_document(&body).await;
    assert_eq!(bill["document_number"], "BIL-FY2526-0001");

    let mut body = reference_invoice("2025-06-01");
    body["doc_type"] = json!("estimate");
    let estimate = app.create_document(&body).await;
    assert_eq!(estimate["document_number"], "EST-FY2526-0001");
}

#[tokio::test]
async fn due_date_is_derived_from_payment_terms() {
    let app = TestApp::spawn().await;

    let mut body = reference_invoice("2025-06-01");
    body["payment_terms"] = json!("net_30");
    let doc = app.create_document(&body).await;
    assert_eq!(doc["due_date"], "2025-07-01");

    // An explicit due date wins over the terms.
    let mut body = reference_invoice("2025-06-01");
    body["payment_terms"] = json!("net_30");
    body["due_date"] = json!("2025-06-10");
    let doc = app.create_document(&body).await;
    assert_eq!(doc["due_date"], "2025-06-10");
}

#[tokio::test]
async fn updating_line_items_recomputes_totals() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();

    let response = app
        .put(
            &format!("/api/documents/{}", id),
            &json!({
                "line_items": [
                    { "description": "Consulting", "quantity": "1", "rate": "500.00", "tax_rate": "18" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["subtotal"]["amount"], "500.00");
    assert_eq!(updated["tax_total"]["amount"], "90.00");
    assert_eq!(updated["grand_total"]["amount"], "590.00");
    assert_eq!(updated["balance_due"]["amount"], "590.00");
}

#[tokio::test]
async fn list_filters_by_type() {
    let app = TestApp::spawn().await;

    app.create_document(&reference_invoice("2025-06-01")).await;
    let mut bill = reference_invoice("2025-06-02");
    bill["doc_type"] = json!("bill");
    app.create_document(&bill).await;

    let response = app.get("/api/documents?doc_type=bill").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["documents"][0]["doc_type"], "bill");

    let all: serde_json::Value = app.get("/api/documents").await.json().await.unwrap();
    assert_eq!(all["total"], 2);
}

#[tokio::test]
async fn documents_are_scoped_per_company() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();

    // Another company cannot see the document.
    let response = app
        .client
        .get(format!("{}/api/documents/{}", app.address, id))
        .header("X-Company-ID", uuid::Uuid::new_v4().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn duplicate_creates_a_fresh_draft() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();
    app.transition(id, "mark_sent").await;

    let response = app
        .post(&format!("/api/documents/{}/duplicate", id), &json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let copy: serde_json::Value = response.json().await.unwrap();
    assert_eq!(copy["status"], "draft");
    assert_eq!(copy["grand_total"]["amount"], "2242.00");
    // Issued today, so only the series prefix is predictable.
    assert!(copy["document_number"].as_str().unwrap().starts_with("INV-"));
    assert_ne!(copy["document_number"], doc["document_number"]);
    assert_ne!(copy["document_id"], doc["document_id"]);
    assert_eq!(copy["payments"].as_array().unwrap().len(), 0);
}
