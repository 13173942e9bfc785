//! Startup reporting.

use crate::config::GatewayConfig;

/// Log the effective configuration once, before the listener opens.
pub fn log_banner(config: &GatewayConfig) {
    let defaults = &config.defaults;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment.as_str(),
        bind_address = %config.listener.bind_address(),
        request_timeout_secs = config.timeouts.request_secs,
        "sub-gateway starting"
    );
    tracing::info!(
        backend = if defaults.backend_url.trim().is_empty() { "<direct>" } else { defaults.backend_url.as_str() },
        mihomo_template = source(&defaults.mihomo_template),
        singbox_template = source(&defaults.singbox_1_13),
        mihomo_override = defaults.overrides.mihomo.as_deref().unwrap_or("-"),
        singbox_override = defaults.overrides.singbox.as_deref().unwrap_or("-"),
        "Generator defaults"
    );
}

fn source(url: &str) -> &str {
    if url.trim().is_empty() {
        "<bundled>"
    } else {
        url
    }
}
