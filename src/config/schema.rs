//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every section defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the subscription gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address and port).
    pub listener: ListenerConfig,

    /// Process-wide defaults copied into every request descriptor.
    pub defaults: StaticConfig,

    /// Upstream (converter and template) fetch settings.
    pub upstream: UpstreamConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Deployment environment.
    pub environment: Environment,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "localhost", "0.0.0.0").
    pub address: String,

    /// TCP port.
    pub port: u16,
}

impl ListenerConfig {
    /// `address:port`, suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: 3000,
        }
    }
}

/// Read-only snapshot of the defaults every request sees.
///
/// Built once at startup and shared behind an `Arc`; the request pipeline
/// never reads the environment itself.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct StaticConfig {
    /// Background image for the landing page. Blank uses a plain backdrop.
    pub image_url: String,

    /// Base URL of the subscription converter backend. Blank disables it.
    pub backend_url: String,

    /// Default mihomo (Format B) template URL.
    ///
    /// This and the `singbox_*` fields fall back to the template compiled
    /// into the binary when blank.
    pub mihomo_template: String,

    /// sing-box (Format C) template for 1.11 and older clients.
    pub singbox_1_11: String,

    /// sing-box template for 1.12 stable clients.
    pub singbox_1_12: String,

    /// sing-box template for 1.12 pre-release clients.
    pub singbox_1_12_alpha: String,

    /// sing-box template for 1.13 and newer clients.
    pub singbox_1_13: String,

    /// Disclosure text rendered in the landing page footer.
    pub beian_text: String,

    /// Link target of the disclosure text.
    pub beian_url: String,

    /// Deployment-wide raw configuration sources.
    pub overrides: ConfigOverrides,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            backend_url: "http://127.0.0.1:25500".to_string(),
            mihomo_template: String::new(),
            singbox_1_11: String::new(),
            singbox_1_12: String::new(),
            singbox_1_12_alpha: String::new(),
            singbox_1_13: String::new(),
            beian_text: String::new(),
            beian_url: "https://beian.miit.gov.cn/".to_string(),
            overrides: ConfigOverrides::default(),
        }
    }
}

/// Operator-supplied template sources that replace the built-in defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigOverrides {
    /// Replaces the mihomo default template.
    pub mihomo: Option<String>,

    /// Replaces the mode-selected sing-box template.
    pub singbox: Option<String>,
}

/// Upstream fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Timeout for each converter/template request in seconds.
    pub timeout_secs: u64,

    /// User agent sent upstream when the caller did not send one.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: concat!("sub-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Deployment environment. Development responses carry error traces.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Parse an environment name; anything unrecognised is development.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}
