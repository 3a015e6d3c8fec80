//! Web server and API endpoints for the sensor panel.
//!
//! Serves the aggregated readings as JSON at `/metrics` and a small
//! dashboard at `/`. Handlers only read published snapshots; they never
//! wait on a sampler.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::{IndexPage, WebConfig};
pub use router::create_app;

use crate::error::{Result, SensorError};
use crate::metrics::SensorHub;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Start the web server and run until interrupted, then stop the samplers.
pub async fn start_web_server(config: WebConfig, hub: Arc<SensorHub>) -> Result<()> {
    let app = create_app(&config, Arc::clone(&hub))?;

    // Parse the bind address
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| SensorError::config_error(format!("Invalid bind address: {}", e)))?;

    info!("Starting sensor panel on http://{}", addr);
    info!("Dashboard available at http://{}/", addr);
    info!("Metrics endpoint: http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SensorError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SensorError::web_server_error(format!("Server error: {}", e)));

    hub.shutdown().await;
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
