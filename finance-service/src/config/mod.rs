use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub numbering: NumberingConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NumberingConfig {
    /// Month the fiscal year starts in (1-12). Defaults to April, the
    /// Indian fiscal year.
    pub fiscal_year_start_month: u32,
    /// Zero-padding width of the sequence part of document numbers.
    pub padding: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("FINANCE_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("FINANCE_SERVICE_PORT")
            .unwrap_or_else(|_| "3006".to_string())
            .parse()?;

        let fiscal_year_start_month = env::var("FINANCE_FISCAL_YEAR_START_MONTH")
            .unwrap_or_else(|_| "4".to_string())
            .parse()?;
        let padding = env::var("FINANCE_SEQUENCE_PADDING")
            .unwrap_or_else(|_| "4".to_string())
            .parse()?;

        let log_level = env::var("FINANCE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let otlp_endpoint = env::var("FINANCE_OTLP_ENDPOINT").ok();

        Ok(Self {
            server: ServerConfig { host, port },
            numbering: NumberingConfig {
                fiscal_year_start_month,
                padding,
            },
            service_name: "finance-service".to_string(),
            log_level,
            otlp_endpoint,
        })
    }
}
