//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the gateway and health handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve on a listener until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::generators::{GeneratorError, GeneratorSet};
use crate::http::health::health_handler;
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::lifecycle::ShutdownListener;
use crate::pipeline::{self, PipelineContext};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PipelineContext>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server backed by the production generators.
    pub fn new(config: GatewayConfig) -> Result<Self, GeneratorError> {
        let generators = GeneratorSet::from_config(&config)?;
        Ok(Self::with_generators(config, generators))
    }

    /// Create a server with caller-supplied generators.
    pub fn with_generators(config: GatewayConfig, generators: GeneratorSet) -> Self {
        let state = AppState {
            pipeline: Arc::new(PipelineContext::new(&config, generators)),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(gateway_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `GET /`: the whole normalization and dispatch pipeline.
async fn gateway_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response<Body> {
    pipeline::handle(&state.pipeline, &uri, &headers).await
}
