//! Format generators.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor
//!     → template.rs (pick template: query override → deployment override → mode default → bundled)
//!     → converter.rs (fetch node list from the converter backend)
//!     → singbox.rs / mihomo.rs / v2ray.rs (merge nodes into template, apply toggles)
//!     → GeneratorResult (status, upstream headers, body)
//! ```
//!
//! # Design Decisions
//! - One trait object per format so the dispatcher can be tested with stubs
//! - Every upstream failure is a `GeneratorError`; nothing is retried here
//! - Timeouts live on the shared HTTP client, not in the dispatcher

pub mod bundled;
pub mod converter;
pub mod mihomo;
pub mod singbox;
pub mod template;
pub mod v2ray;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::pipeline::RequestDescriptor;

pub use converter::ConverterClient;
pub use mihomo::MihomoGenerator;
pub use singbox::SingboxGenerator;
pub use v2ray::V2rayGenerator;

/// Output of one generator call, consumed by the response assembler.
#[derive(Debug, Clone, Default)]
pub struct GeneratorResult {
    /// Status to answer with; `None` means 200.
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub data: Bytes,
}

impl GeneratorResult {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            data: data.into(),
        }
    }
}

/// Errors that can occur while producing a configuration document.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// No converter backend is configured.
    #[error("no subscription converter backend is configured")]
    NoConverter,

    /// Request to an upstream service failed before a response arrived.
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    UpstreamStatus { url: String, status: StatusCode },

    /// A configured or requested URL could not be used.
    #[error("invalid upstream URL '{0}'")]
    InvalidUrl(String),

    /// The `template` query value names no known template.
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    /// Upstream content could not be decoded.
    #[error("malformed {what}")]
    Decode {
        what: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Upstream content decoded but had the wrong shape.
    #[error("unexpected {what}: {reason}")]
    Shape { what: &'static str, reason: String },
}

impl GeneratorError {
    pub(crate) fn decode<E>(what: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GeneratorError::Decode {
            what,
            source: Box::new(source),
        }
    }
}

/// Produces a complete client configuration for one output format.
#[async_trait]
pub trait ConfigGenerator: Send + Sync {
    async fn generate(&self, descriptor: &RequestDescriptor) -> Result<GeneratorResult, GeneratorError>;
}

/// The three generators the dispatcher chooses between.
#[derive(Clone)]
pub struct GeneratorSet {
    pub v2ray: Arc<dyn ConfigGenerator>,
    pub mihomo: Arc<dyn ConfigGenerator>,
    pub singbox: Arc<dyn ConfigGenerator>,
}

impl GeneratorSet {
    /// Production generators sharing one converter client.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GeneratorError> {
        let converter = ConverterClient::new(&config.upstream)?;
        Ok(Self {
            v2ray: Arc::new(V2rayGenerator::new(converter.clone())),
            mihomo: Arc::new(MihomoGenerator::new(converter.clone())),
            singbox: Arc::new(SingboxGenerator::new(converter)),
        })
    }
}

impl std::fmt::Debug for GeneratorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorSet").finish_non_exhaustive()
    }
}

/// Replace every `{all}` placeholder in `members` with `tags`, keeping order.
pub(crate) fn expand_placeholder(members: &mut Vec<serde_json::Value>, tags: &[String]) -> bool {
    const ALL: &str = "{all}";
    let Some(pos) = members.iter().position(|m| m.as_str() == Some(ALL)) else {
        return false;
    };
    members.retain(|m| m.as_str() != Some(ALL));
    let expanded = tags.iter().cloned().map(serde_json::Value::String);
    members.splice(pos..pos, expanded);
    true
}
