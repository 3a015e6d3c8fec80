//! HTTP handlers for API endpoints.

use crate::metrics::{MetricsResponse, SensorHub};
use crate::web::config::IndexPage;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<SensorHub>,
    /// What `/` serves; `None` answers 404
    pub index: Option<IndexPage>,
}

/// Current readings of every sampler as JSON.
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(state.hub.metrics())
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "sensor-panel",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "hardware": state.hub.hardware(),
    }))
}

/// Serve the configured dashboard page.
pub async fn serve_index(State(state): State<AppState>) -> Response {
    let index_file = match state.index.as_ref() {
        Some(IndexPage::File(path)) => path,
        Some(IndexPage::Builtin) => return Html(DEFAULT_INDEX_HTML).into_response(),
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    match tokio::fs::read_to_string(index_file).await {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            error!("Failed to read {}: {}", index_file.display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Built-in dashboard used when no static index is provided.
const DEFAULT_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sensor Panel</title>
    <style>
        body { font-family: sans-serif; background: #111; color: #eee; padding: 20px; }
        .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 16px; }
        .card { background: #1e1e1e; border-radius: 10px; padding: 16px; }
        .card h3 { margin-top: 0; color: #7fb3ff; }
        .metric { display: flex; justify-content: space-between; padding: 4px 0; }
    </style>
</head>
<body>
    <h1>Sensor Panel</h1>
    <div class="grid">
        <div class="card"><h3>CPU</h3><div id="cpu"></div></div>
        <div class="card"><h3>RAM</h3><div id="ram"></div></div>
        <div class="card"><h3>GPU</h3><div id="gpu"></div></div>
    </div>
    <script>
        function render(id, group) {
            const el = document.getElementById(id);
            el.innerHTML = '';
            for (const [key, value] of Object.entries(group)) {
                const row = document.createElement('div');
                row.className = 'metric';
                row.innerHTML = `<span>${key}</span><span>${value.toFixed(1)}</span>`;
                el.appendChild(row);
            }
        }

        async function refresh() {
            try {
                const data = await (await fetch('/metrics')).json();
                render('cpu', data.cpu);
                render('ram', data.ram);
                render('gpu', data.gpu);
            } catch (e) {
                console.error('Failed to fetch metrics:', e);
            }
        }

        refresh();
        setInterval(refresh, 1000);
    </script>
</body>
</html>"#;
