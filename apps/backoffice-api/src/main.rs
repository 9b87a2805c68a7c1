//! Back-office API server

use anyhow::Result;
use backoffice_api::{app, AppState, Config};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("backoffice_api=info".parse()?)
                .add_directive("document_service=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = Config::from_env();
    info!("Initializing back-office API...");
    let state = Arc::new(AppState::new(config.clone())?);

    // Periodic overdue-invoice sweep
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweeper.config.overdue_sweep);
        loop {
            interval.tick().await;
            let today = chrono::Utc::now().date_naive();
            match sweeper.documents.mark_overdue(today) {
                Ok(0) => {}
                Ok(count) => info!("Marked {} invoices overdue", count),
                Err(e) => error!("Overdue sweep failed: {}", e),
            }
        }
    });

    let addr = config.socket_addr();
    info!("Starting back-office API on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
