//! Signing API server binary

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use sigstamp_api::{app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sigstamp_api=info".parse()?)
                .add_directive("sigstamp_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = Config::from_env();

    // Initialize application state
    info!("Initializing signing API...");
    let state = Arc::new(AppState::new(&config).await?);
    info!("Serving originals from {}", config.pdf_dir.display());

    let router = app(state, config.max_body_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting signing API on http://{}", addr);

    // Start server; peer addresses feed the audit log
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
