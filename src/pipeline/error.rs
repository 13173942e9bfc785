//! Pipeline error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

use crate::generators::GeneratorError;

/// Errors that end a request before a configuration is produced.
///
/// All of them are answered with `400` and a JSON body; none escape as a
/// transport-level failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Subscription links were given without a format toggle.
    #[error("please specify a configuration type: singbox, mihomo or v2ray")]
    MissingFormatSelection,

    /// The selected generator failed.
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    /// Reserved for structural request validation.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// True when the caller, not an upstream, caused the failure.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, PipelineError::Generator(_))
    }

    /// The error and each of its sources, outermost first.
    pub fn trace(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }
}
