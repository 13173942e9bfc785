//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every upstream URL is an absolute http(s) URL
//! - Validate value ranges (timeouts > 0, bind address well-formed)
//! - Keep the request timeout above the worst-case upstream time
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not an absolute http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("listener: '{0}' is not a valid bind address")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(
        "timeouts.request_secs ({request_secs}) must be at least twice upstream.timeout_secs ({upstream_secs})"
    )]
    TimeoutBudget { request_secs: u64, upstream_secs: u64 },
}

/// Upstream requests one generator call can make back to back.
const UPSTREAM_CALLS: u64 = 2;

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.trim().is_empty() || config.listener.address.contains(char::is_whitespace) {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address()));
    }

    let defaults = &config.defaults;
    let optional = [
        ("defaults.image_url", defaults.image_url.as_str()),
        ("defaults.backend_url", defaults.backend_url.as_str()),
        ("defaults.beian_url", defaults.beian_url.as_str()),
        ("defaults.mihomo_template", defaults.mihomo_template.as_str()),
        ("defaults.singbox_1_11", defaults.singbox_1_11.as_str()),
        ("defaults.singbox_1_12", defaults.singbox_1_12.as_str()),
        ("defaults.singbox_1_12_alpha", defaults.singbox_1_12_alpha.as_str()),
        ("defaults.singbox_1_13", defaults.singbox_1_13.as_str()),
    ];
    for (field, value) in optional {
        if !value.trim().is_empty() {
            check_url(field, value, &mut errors);
        }
    }

    if let Some(mihomo) = &defaults.overrides.mihomo {
        check_url("defaults.overrides.mihomo", mihomo, &mut errors);
    }
    if let Some(singbox) = &defaults.overrides.singbox {
        check_url("defaults.overrides.singbox", singbox, &mut errors);
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    // sing-box and mihomo make two sequential upstream calls; a request
    // timeout shorter than both would cut them off with a bare 408.
    let upstream_budget = config.upstream.timeout_secs.saturating_mul(UPSTREAM_CALLS);
    if config.timeouts.request_secs < upstream_budget {
        errors.push(ValidationError::TimeoutBudget {
            request_secs: config.timeouts.request_secs,
            upstream_secs: config.upstream.timeout_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True if `value` parses as an absolute http or https URL.
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if !is_http_url(value) {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
