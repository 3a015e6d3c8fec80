//! Web application router and middleware setup.

use crate::error::Result;
use crate::metrics::SensorHub;
use crate::web::config::{IndexPage, WebConfig};
use crate::web::handlers::{self, AppState};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Create the main axum application with all routes and middleware.
pub fn create_app(config: &WebConfig, hub: Arc<SensorHub>) -> Result<Router> {
    let index = config.index_page()?;
    match &index {
        Some(IndexPage::File(path)) => info!("Dashboard page: {}", path.display()),
        Some(IndexPage::Builtin) => info!("Dashboard page: built-in"),
        None => info!("Dashboard disabled"),
    }

    let mut app = Router::new()
        .route("/metrics", get(handlers::get_metrics))
        .route("/api/health", get(handlers::health_check))
        .route("/", get(handlers::serve_index));

    if let Some(static_path) = &config.static_path {
        if static_path.is_dir() {
            info!("Serving static files from: {:?}", static_path);
            app = app.nest_service("/static", ServeDir::new(static_path));
        } else {
            warn!("Static path {:?} does not exist", static_path);
        }
    }

    let mut app = app.with_state(AppState { hub, index });

    // Add CORS if enabled
    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app = app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    Ok(app)
}
