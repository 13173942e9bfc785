//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Environment, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, apply environment overrides to, and validate the configuration.
///
/// Without a path the built-in defaults are the starting point.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// Blank values are treated as unset so an exported-but-empty variable
/// never wipes a default.
pub fn apply_env_overrides<F>(mut config: GatewayConfig, lookup: F) -> GatewayConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(addr) = get("ADDR") {
        config.listener.address = addr;
    }
    if let Some(port) = get("PORT") {
        match port.trim().parse() {
            Ok(port) => config.listener.port = port,
            Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
        }
    }

    let defaults = &mut config.defaults;
    let string_overrides: [(&str, &mut String); 10] = [
        ("IMG", &mut defaults.image_url),
        ("SUB", &mut defaults.backend_url),
        ("MIHOMOTOP", &mut defaults.mihomo_template),
        ("SINGBOX_1_11", &mut defaults.singbox_1_11),
        ("SINGBOX_1_12", &mut defaults.singbox_1_12),
        ("SINGBOX_1_12_ALPHA", &mut defaults.singbox_1_12_alpha),
        ("SINGBOX_1_13", &mut defaults.singbox_1_13),
        ("BEIAN", &mut defaults.beian_text),
        ("BEIANURL", &mut defaults.beian_url),
        ("LOG_LEVEL", &mut config.observability.log_level),
    ];
    for (key, slot) in string_overrides {
        if let Some(value) = get(key) {
            *slot = value;
        }
    }

    if let Some(mihomo) = get("MIHOMO") {
        config.defaults.overrides.mihomo = Some(mihomo);
    }
    if let Some(singbox) = get("SINGBOX") {
        config.defaults.overrides.singbox = Some(singbox);
    }
    // NODE_ENV is also honoured for existing deployments.
    if let Some(env) = get("GATEWAY_ENV").or_else(|| get("NODE_ENV")) {
        config.environment = Environment::from_name(&env);
    }

    config
}
