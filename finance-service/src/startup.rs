use crate::config::Config;
use crate::handlers::{documents, health, recurring, sequences};
use crate::services::{FinanceRepository, NumberSequencer, RecurringScheduler};
use axum::{
    routing::{get, post},
    Router,
};
use finance_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repository: FinanceRepository,
    pub scheduler: RecurringScheduler,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let sequencer = NumberSequencer::new(
            config.numbering.fiscal_year_start_month,
            config.numbering.padding,
        );
        let repository = FinanceRepository::new(sequencer);
        let scheduler = RecurringScheduler::new(repository.clone());

        let state = AppState {
            config: config.clone(),
            repository,
            scheduler,
        };

        let app = Router::new()
            .route("/health", get(health::health_check))
            .route("/ready", get(health::readiness_check))
            .route("/metrics", get(health::metrics_endpoint))
            .route(
                "/api/documents",
                post(documents::create_document).get(documents::list_documents),
            )
            .route(
                "/api/documents/:id",
                get(documents::get_document)
                    .put(documents::update_document)
                    .delete(documents::delete_document),
            )
            .route(
                "/api/documents/:id/transition",
                post(documents::transition_document),
            )
            .route("/api/documents/:id/payments", post(documents::record_payment))
            .route(
                "/api/documents/:id/duplicate",
                post(documents::duplicate_document),
            )
            .route("/api/sequences/preview", get(sequences::preview_number))
            .route(
                "/api/recurring",
                post(recurring::create_profile).get(recurring::list_profiles),
            )
            .route("/api/recurring/tick", post(recurring::tick))
            .route("/api/recurring/:id", get(recurring::get_profile))
            .route("/api/recurring/:id/pause", post(recurring::pause_profile))
            .route("/api/recurring/:id/resume", post(recurring::resume_profile))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
