//! # mdconvert: document to Markdown conversion service
//!
//! `mdconvert` is a small HTTP service that accepts a single uploaded file as
//! `multipart/form-data` and answers with a Markdown rendering of it, wrapped in
//! a JSON envelope (`{success, markdown, filename}`).
//!
//! ## Request flow
//!
//! 1. [`multipart`] checks the request shape and pulls out the first file part.
//! 2. [`staging`] writes the bytes to a uniquely named temporary file.
//! 3. [`conversion`] picks a strategy from the filename's extension: an external
//!    document converter for rich formats (PDF, Office), or one of the built-in
//!    text, HTML and CSV renderers, with a binary/encoding sniff for anything else.
//! 4. The staged file is removed and the outcome is returned.
//!
//! Files that cannot be converted still produce a successful response whose
//! Markdown explains why. Only malformed requests (`400`) and server-side
//! failures (`500`) are errors; see [`errors`].
//!
//! ## Surface
//!
//! - `POST /` and `POST /api/convert`: conversion, with `OPTIONS` preflight on both
//! - `GET /healthz`: liveness
//! - `GET /api-docs/openapi.json`, `GET /docs`: API documentation
//! - `GET /internal/metrics`: Prometheus metrics, when enabled
//!
//! ## Configuration
//!
//! See [`config`]. The document converter is optional: if the configured program
//! is not found at startup, rich formats are answered with an explanatory message.

pub mod api;
pub mod config;
pub mod conversion;
pub mod errors;
pub mod multipart;
mod openapi;
pub mod staging;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
use conversion::{MarkdownConverter, document::create_converter};
use openapi::ApiDoc;

/// Shared state handed to every handler.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .converter(Arc::new(MarkdownConverter::default()))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub converter: Arc<MarkdownConverter>,
}

/// Build the application router.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let convert = || {
        post(api::handlers::convert::convert_upload)
            .options(api::handlers::convert::preflight)
            .layer(DefaultBodyLimit::max(state.config.max_upload_size))
    };

    let mut router = Router::new()
        .route("/", convert())
        .route("/api/convert", convert())
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The configured service, ready to serve.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Resolve the document converter and build the router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let staging_dir = config.staging_dir();
        if !tokio::fs::metadata(&staging_dir).await.is_ok_and(|meta| meta.is_dir()) {
            warn!(path = %staging_dir.display(), "Staging directory does not exist, uploads will fail");
        }

        let converter = MarkdownConverter::new(create_converter(config.document_converter.as_ref()));
        Self::with_converter(config, converter)
    }

    /// Build the application around an already constructed converter.
    pub fn with_converter(config: Config, converter: MarkdownConverter) -> anyhow::Result<Self> {
        let state = AppState::builder()
            .config(config.clone())
            .converter(Arc::new(converter))
            .build();
        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "mdconvert listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_utils::create_test_app;

    #[tokio::test]
    async fn health_check() {
        let (server, _staging) = create_test_app();

        let response = server.get("/healthz").await;

        response.assert_status(StatusCode::OK);
        response.assert_text("OK");
    }

    #[tokio::test]
    async fn serves_openapi_and_docs() {
        let (server, _staging) = create_test_app();

        let openapi = server.get("/api-docs/openapi.json").await;
        openapi.assert_status(StatusCode::OK);
        let json: serde_json::Value = openapi.json();
        assert_eq!(json["info"]["title"], "mdconvert");
        assert!(json["paths"]["/"]["post"].is_object());

        server.get("/docs").await.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_route_is_absent_when_disabled() {
        let (server, _staging) = create_test_app();

        server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_methods_are_rejected() {
        let (server, _staging) = create_test_app();

        server.get("/api/convert").await.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }
}
