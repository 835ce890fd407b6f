mod api;
mod catalog;
mod config;
mod domain;
mod errors;
mod notifications;
mod service;
mod store;
mod system;

use axum::routing::get;
use axum::Router;
use axum_prometheus::PrometheusMetricLayer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use secrecy::Secret;
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::common::middleware::issue_token;
use crate::catalog::YoutubeCatalog;
use crate::config::Settings;
use crate::notifications::BroadcastNotifier;
use crate::service::ShortService;
use crate::store::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct InnerState {
    pub service: Arc<ShortService>,
    pub notifier: BroadcastNotifier,
    pub jwt_secret: Arc<Secret<String>>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_shorts=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let store: Arc<dyn Store> = match settings.database_url.as_deref() {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    let catalog = YoutubeCatalog::new(settings.youtube_api_key, settings.youtube_max_pages)?;
    let notifier = BroadcastNotifier::new(settings.event_buffer);

    let service = Arc::new(ShortService::new(
        store,
        Arc::new(catalog),
        Arc::new(notifier.clone()),
        settings.policy,
        settings.roll_max_attempts,
        StdRng::from_entropy(),
    ));
    let jwt_secret = Arc::new(settings.jwt_secret);

    if let Some(username) = settings.bootstrap_admin.as_deref() {
        if let Some(admin) = service.bootstrap_admin(username).await? {
            let token = issue_token(&admin, &jwt_secret, chrono::Duration::days(30))?;
            tracing::info!(user_id = %admin.id, "Bootstrap admin token: {}", token);
        }
    }

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app_state = InnerState {
        service,
        notifier,
        jwt_secret,
    };

    let app = Router::new()
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .merge(api::create_app(app_state))
        .layer(prometheus_layer);

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    tracing::debug!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
