//! Common test utilities: spawn the application on a random port and
//! talk to it over HTTP like a real client.

use finance_service::config::{Config, NumberingConfig, ServerConfig};
use finance_service::startup::Application;
use serde_json::{json, Value};
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub company_id: Uuid,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port for testing
            },
            numbering: NumberingConfig {
                fiscal_year_start_month: 4,
                padding: 4,
            },
            service_name: "finance-service".to_string(),
            log_level: "warn".to_string(),
            otlp_endpoint: None,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            client,
            company_id: Uuid::new_v4(),
        }
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("X-Company-ID", self.company_id.to_string())
            .json(body)
            .send()
            .await
            .expect("Failed to execute POST request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("X-Company-ID", self.company_id.to_string())
            .send()
            .await
            .expect("Failed to execute GET request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.address, path))
            .header("X-Company-ID", self.company_id.to_string())
            .json(body)
            .send()
            .await
            .expect("Failed to execute PUT request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .header("X-Company-ID", self.company_id.to_string())
            .send()
            .await
            .expect("Failed to execute DELETE request")
    }

    /// Create a document and return its JSON body.
    pub async fn create_document(&self, body: &Value) -> Value {
        let response = self.post("/api/documents", body).await;
        assert_eq!(response.status().as_u16(), 201, "document creation failed");
        response.json().await.expect("invalid JSON response")
    }

    /// Apply a lifecycle action to a document and return the new body.
    pub async fn transition(&self, document_id: &str, action: &str) -> Value {
        let response = self
            .post(
                &format!("/api/documents/{}/transition", document_id),
                &json!({ "action": action }),
            )
            .await;
        assert_eq!(
            response.status().as_u16(),
            200,
            "transition {} failed",
            action
        );
        response.json().await.expect("invalid JSON response")
    }
}

/// Reference invoice body: 2 x 500 @ 18% tax, plus 1 x 1000 @ 18% tax
/// with 10% discount. Totals: 2000 / 100 / 342 / 2242.
pub fn reference_invoice(issue_date: &str) -> Value {
    json!({
        "doc_type": "invoice",
        "issue_date": issue_date,
        "currency": "INR",
        "line_items": [
            { "description": "Consulting", "quantity": "2", "rate": "500.00", "tax_rate": "18" },
            { "description": "Retainer", "quantity": "1", "rate": "1000.00", "tax_rate": "18", "discount_percent": "10" }
        ]
    })
}
