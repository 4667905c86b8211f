//! Status-graph enforcement and derived display statuses.

mod common;

use common::{reference_invoice, TestApp};
use serde_json::json;

#[tokio::test]
async fn invoice_walks_the_happy_path() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();
    assert_eq!(doc["status"], "draft");
    assert!(doc["sent_utc"].is_null());

    let sent = app.transition(id, "mark_sent").await;
    assert_eq!(sent["status"], "sent");
    assert!(!sent["sent_utc"].is_null());

    let viewed = app.transition(id, "mark_viewed").await;
    assert_eq!(viewed["status"], "viewed");
}

#[tokio::test]
async fn illegal_edges_are_rejected_with_conflict() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();

    // A draft has never been sent, so it cannot be viewed.
    let response = app
        .post(
            &format!("/api/documents/{}/transition", id),
            &json!({ "action": "mark_viewed" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    // Still a draft afterwards.
    let body: serde_json::Value = app
        .get(&format!("/api/documents/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "draft");
}

#[tokio::test]
async fn cancel_is_only_reachable_from_draft_or_sent() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();
    app.transition(id, "mark_sent").await;
    let cancelled = app.transition(id, "cancel").await;
    assert_eq!(cancelled["status"], "cancelled");

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();
    app.transition(id, "mark_sent").await;
    app.transition(id, "mark_viewed").await;
    let response = app
        .post(
            &format!("/api/documents/{}/transition", id),
            &json!({ "action": "cancel" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn cancel_is_rejected_once_money_has_moved() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();
    app.transition(id, "mark_sent").await;

    let response = app
        .post(
            &format!("/api/documents/{}/payments", id),
            &json!({ "amount": "1000.00", "date": "2025-06-05", "method": "upi" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = app
        .post(
            &format!("/api/documents/{}/transition", id),
            &json!({ "action": "cancel" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn paid_documents_cannot_be_edited_or_deleted() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();
    app.transition(id, "mark_sent").await;
    app.transition(id, "mark_paid").await;

    let response = app
        .put(
            &format!("/api/documents/{}", id),
            &json!({ "notes": "late edit" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    let response = app.delete(&format!("/api/documents/{}", id)).await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn draft_documents_can_be_deleted() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();

    let response = app.delete(&format!("/api/documents/{}", id)).await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.get(&format!("/api/documents/{}", id)).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn past_due_open_invoice_displays_overdue() {
    let app = TestApp::spawn().await;

    let mut body = reference_invoice("2020-01-01");
    body["due_date"] = json!("2020-01-31");
    let doc = app.create_document(&body).await;
    let id = doc["document_id"].as_str().unwrap();

    // Drafts are never overdue.
    assert_eq!(doc["status"], "draft");

    let sent = app.transition(id, "mark_sent").await;
    assert_eq!(sent["status"], "overdue");

    // Settling it clears the derived state.
    let paid = app.transition(id, "mark_paid").await;
    assert_eq!(paid["status"], "paid");
}

#[tokio::test]
async fn past_expiry_estimate_displays_expired() {
    let app = TestApp::spawn().await;

    let mut body = reference_invoice("2020-01-01");
    body["doc_type"] = json!("estimate");
    body["due_date"] = json!("2020-01-31");
    let doc = app.create_document(&body).await;

    assert_eq!(doc["status"], "expired");
}

#[tokio::test]
async fn estimate_actions_do_not_apply_to_invoices() {
    let app = TestApp::spawn().await;

    let doc = app.create_document(&reference_invoice("2025-06-01")).await;
    let id = doc["document_id"].as_str().unwrap();
    app.transition(id, "mark_sent").await;

    let response = app
        .post(
            &format!("/api/documents/{}/transition", id),
            &json!({ "action": "accept" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}
