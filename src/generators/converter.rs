//! Upstream HTTP access shared by all generators.
//!
//! # Responsibilities
//! - Build converter requests (`<backend>/sub?target=...&url=a|b`)
//! - Fetch templates and node lists with the configured timeout
//! - Turn transport failures and non-2xx answers into `GeneratorError`
//!
//! # Design Decisions
//! - The caller's user agent is forwarded so providers answer with the
//!   same node set (and `subscription-userinfo`) the client would get
//! - Converter status and headers are kept for the outbound response

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use reqwest::header::USER_AGENT;
use url::Url;

use crate::config::schema::UpstreamConfig;
use crate::generators::GeneratorError;
use crate::pipeline::mode::BackendKind;
use crate::pipeline::RequestDescriptor;

/// Joins several subscriptions in one converter request.
const URL_JOINER: &str = "|";

/// A fetched upstream document.
#[derive(Debug, Clone)]
pub struct Upstream {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Converter target names understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Singbox,
    Clash,
    V2ray,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Singbox => "singbox",
            Target::Clash => "clash",
            Target::V2ray => "v2ray",
        }
    }

    /// Node-only output is requested for formats merged into a template.
    fn list_only(&self) -> bool {
        !matches!(self, Target::V2ray)
    }
}

/// HTTP client for the converter backend and template hosts.
#[derive(Debug, Clone)]
pub struct ConverterClient {
    http: reqwest::Client,
    fallback_user_agent: String,
}

impl ConverterClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, GeneratorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| GeneratorError::Request {
                url: "<client>".to_string(),
                source,
            })?;
        Ok(Self {
            http,
            fallback_user_agent: config.user_agent.clone(),
        })
    }

    /// Converter URL for the descriptor's subscriptions.
    pub fn node_url(descriptor: &RequestDescriptor, target: Target) -> Result<Url, GeneratorError> {
        if descriptor.mode.backend == BackendKind::Direct {
            return Err(GeneratorError::NoConverter);
        }
        let backend = descriptor.static_config.backend_url.trim().trim_end_matches('/');
        let endpoint = if backend.ends_with("/sub") {
            backend.to_string()
        } else {
            format!("{backend}/sub")
        };
        let mut url = Url::parse(&endpoint).map_err(|_| GeneratorError::InvalidUrl(endpoint.clone()))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("target", target.as_str())
                .append_pair("url", &descriptor.urls.join(URL_JOINER));
            if target.list_only() {
                query.append_pair("list", "true");
            }
            query
                .append_pair("udp", bool_str(descriptor.toggles.enable_udp))
                .append_pair("emoji", "true");
        }
        Ok(url)
    }

    /// Fetch the node list for `target`.
    pub async fn fetch_nodes(
        &self,
        descriptor: &RequestDescriptor,
        target: Target,
    ) -> Result<Upstream, GeneratorError> {
        let url = Self::node_url(descriptor, target)?;
        tracing::debug!(target = target.as_str(), urls = descriptor.urls.len(), "Fetching nodes from converter");
        self.get(url.as_str(), &descriptor.user_agent).await
    }

    /// Fetch a template document.
    pub async fn fetch_template(&self, url: &str, user_agent: &str) -> Result<Upstream, GeneratorError> {
        tracing::debug!(url = %url, "Fetching template");
        self.get(url, user_agent).await
    }

    async fn get(&self, url: &str, user_agent: &str) -> Result<Upstream, GeneratorError> {
        let user_agent = if user_agent.trim().is_empty() {
            self.fallback_user_agent.as_str()
        } else {
            user_agent
        };

        let response = self
            .http
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|source| GeneratorError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Upstream returned error status");
            return Err(GeneratorError::UpstreamStatus {
                url: url.to_string(),
                status,
            });
        }

        let headers = response.headers().clone();
        let body = response.text().await.map_err(|source| GeneratorError::Request {
            url: url.to_string(),
            source,
        })?;

        Ok(Upstream { status, headers, body })
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
