use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use bazaar_api::api::{create_router, AppState};
use bazaar_api::config::Config;
use bazaar_api::services::{
    AuctionClock, Clock, LogNotifier, Notifier, SystemClock, WebhookNotifier,
};
use bazaar_api::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(MemoryStore::new());
    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogNotifier),
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Background auction expiry; runs for the life of the process
    let auction_clock = AuctionClock::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        Arc::clone(&clock),
        Duration::from_secs(config.scan_interval_secs),
    );
    auction_clock.start();

    let state = AppState::with_parts(store, notifier, clock);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;
    Ok(())
}
