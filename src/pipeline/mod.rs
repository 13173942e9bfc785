//! Request normalization and dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! GET /?url=...&singbox=true
//!     → descriptor.rs (query + headers → RequestDescriptor, mode.rs classifies)
//!     → dispatch.rs (no links → landing page, else exactly one generator)
//!     → http/response.rs (HTML page, generated JSON, or 400 error body)
//! ```
//!
//! # Design Decisions
//! - `handle` never fails: every outcome becomes an HTTP response
//! - Each request is logged once, at the level its outcome deserves
//! - Descriptor is immutable after construction

pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod mode;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, Response, Uri};

use crate::config::{Environment, GatewayConfig, StaticConfig};
use crate::generators::GeneratorSet;
use crate::http::response;
use crate::observability::metrics;
use crate::page;

pub use descriptor::{FormatSelection, RequestDescriptor};
pub use dispatch::{dispatch, Dispatch};
pub use error::PipelineError;
pub use mode::Mode;

/// Everything a request needs besides the request itself.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub static_config: Arc<StaticConfig>,
    pub generators: GeneratorSet,
    pub environment: Environment,
}

impl PipelineContext {
    pub fn new(config: &GatewayConfig, generators: GeneratorSet) -> Self {
        Self {
            static_config: Arc::new(config.defaults.clone()),
            generators,
            environment: config.environment,
        }
    }
}

/// Turn one inbound request into its response.
pub async fn handle(ctx: &PipelineContext, uri: &Uri, headers: &HeaderMap) -> Response<Body> {
    let start = Instant::now();
    let descriptor = RequestDescriptor::build(uri, headers, ctx.static_config.clone());
    let format = descriptor.format_selection();

    tracing::debug!(
        origin = %descriptor.origin,
        urls = descriptor.urls.len(),
        format = format.as_str(),
        mode = %descriptor.mode,
        template = descriptor.template_override.as_deref().unwrap_or("-"),
        "Request normalized"
    );

    let response = match dispatch(&descriptor, &ctx.generators).await {
        Ok(Dispatch::NoTarget) => response::landing_page(page::render(&descriptor)),
        Ok(Dispatch::Generated { format, result }) => {
            tracing::info!(
                format = format.as_str(),
                urls = descriptor.urls.len(),
                mode = %descriptor.mode,
                "Configuration generated"
            );
            response::generated(result, &descriptor.origin)
        }
        Err(e) => {
            if e.is_user_error() {
                tracing::warn!(error = %e, "Rejected request");
            } else {
                tracing::error!(error = %e, format = format.as_str(), "Generator failed");
            }
            response::error(&e, !ctx.environment.is_production())
        }
    };

    metrics::record_request(format.as_str(), response.status().as_u16(), start);
    response
}
