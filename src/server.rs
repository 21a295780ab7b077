//! HTTP Server
//!
//! Multi-target Prometheus exporter endpoint. The server holds no metrics of its
//! own: each `/probe` request names the appliance to scrape and gets a freshly
//! built registry back.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/probe`, `/health`, and `/`
//! - **Request scope**: every probe builds its own client, registry and scrape
//!   through [`crate::exporter`]
//! - **State Management**: only immutable configuration is shared, behind an `Arc`
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to probe and health
//! - `GET /probe?target=<url>[&ignore-cert=yes]` - scrape one appliance
//! - `GET /health` - liveness of the exporter process itself
//!
//! # Error Handling
//!
//! A missing or malformed `target` is the caller's mistake and returns 400.
//! Appliance failures are not HTTP errors: the probe still answers 200 and
//! `netscaler_up` tells Prometheus whether the appliance could be scraped.

use crate::config::Config;
use crate::error::ExporterError;
use crate::exporter::{self, ExporterOptions};
use crate::nitro::DeviceTarget;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

const MISSING_TARGET: &str = "'target' parameter must be specified";

pub struct AppState {
    config: Config,
    options: ExporterOptions,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let options = ExporterOptions::from(&config.scrape);
        Self { config, options }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProbeParams {
    target: Option<String>,
    #[serde(rename = "ignore-cert")]
    ignore_cert: Option<String>,
}

/// Builds the exporter's router. Exposed so tests can serve it on an
/// ephemeral port.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/probe", get(probe_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let app = router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Exporter listening on {}", addr);
    info!("Probe endpoint: http://{}/probe?target=<netscaler-url>", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        r#"<html>
<head><title>NetScaler Exporter</title></head>
<body>
<h1>Citrix NetScaler Prometheus Exporter</h1>
<p><a href="/probe?target=https://netscaler.example.com">Probe</a> (set <code>target</code>, optionally <code>ignore-cert=yes</code>)</p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn probe_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProbeParams>,
) -> Response {
    let Some(raw_target) = params.target.filter(|t| !t.trim().is_empty()) else {
        warn!("Probe request without target");
        return (StatusCode::BAD_REQUEST, MISSING_TARGET).into_response();
    };

    let ignore_cert = params.ignore_cert.as_deref() == Some("yes") || state.config.netscaler.ignore_cert;

    let target = match DeviceTarget::new(
        &raw_target,
        state.config.netscaler.username.clone(),
        state.config.netscaler.password.clone(),
        ignore_cert,
    ) {
        Ok(target) => target,
        Err(e) => {
            warn!("Rejected probe target {:?}: {}", raw_target, e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match exporter::handle(&target, &state.options).await {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(instance = %target.instance(), kind = e.kind(), "Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
