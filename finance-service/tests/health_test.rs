//! Probe endpoints.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_and_readiness_respond() {
    let app = TestApp::spawn().await;

    let response = app.client.get(format!("{}/health", app.address)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let response = app.client.get(format!("{}/ready", app.address)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn metrics_are_exposed_in_prometheus_format() {
    let app = TestApp::spawn().await;

    // Exercise a counter first.
    app.create_document(&common::reference_invoice("2025-06-01"))
        .await;

    let response = app.client.get(format!("{}/metrics", app.address)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("finance_documents_total"));
}
