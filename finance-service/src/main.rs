use finance_core::observability::init_tracing;
use finance_service::config::Config;
use finance_service::services::metrics::init_metrics;
use finance_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_metrics();

    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    let application = Application::build(config)
        .await
        .map_err(|e| std::io::Error::other(format!("Startup error: {}", e)))?;

    application.run_until_stopped().await
}
