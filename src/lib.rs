//! Subscription gateway library.
//!
//! Normalizes a single HTTP GET into a request descriptor, dispatches it to
//! one of three configuration generators (v2ray, mihomo, sing-box), and
//! assembles the HTTP response.

pub mod config;
pub mod generators;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod page;
pub mod pipeline;

pub use config::GatewayConfig;
pub use generators::{ConfigGenerator, GeneratorError, GeneratorResult, GeneratorSet};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{PipelineContext, PipelineError, RequestDescriptor};
