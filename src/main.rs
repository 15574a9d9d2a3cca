//! Composition root: config, pool, adapters, router, serve.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use temple_seva::adapters::email::{ResendConfig, ResendNotifier};
use temple_seva::adapters::http::payments::{self, PaymentsState};
use temple_seva::adapters::postgres::PostgresDonationRepository;
use temple_seva::adapters::stripe::{StripeConfig, StripeGateway};
use temple_seva::application::{
    CreateDonationIntentHandler, CreateSubscriptionHandler, ProcessWebhookHandler,
};
use temple_seva::config::AppConfig;
use temple_seva::domain::donation::StripeWebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let repository = Arc::new(PostgresDonationRepository::new(pool));
    let gateway = Arc::new(StripeGateway::new(StripeConfig::new(
        config.payment.api_key(),
    )));
    let notifier = Arc::new(ResendNotifier::new(ResendConfig {
        api_key: config.email.api_key(),
        from: config.email.from_header(),
        admin_email: config.email.admin_email.clone(),
    }));
    let verifier = StripeWebhookVerifier::new(config.payment.webhook_secret());

    let state = PaymentsState {
        webhook: Arc::new(ProcessWebhookHandler::new(
            verifier,
            repository,
            gateway.clone(),
            notifier,
        )),
        donation_intent: Arc::new(CreateDonationIntentHandler::new(gateway.clone())),
        subscription: Arc::new(CreateSubscriptionHandler::new(gateway)),
    };

    let cors = {
        let origins = config.server.cors_origins_list();
        if origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST])
                .allow_headers(Any)
        } else {
            let origins: Vec<http::HeaderValue> = origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([http::Method::GET, http::Method::POST])
                .allow_headers(Any)
        }
    };

    let app = payments::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.server.socket_addr()?;
    info!(%addr, environment = ?config.server.environment, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
