//! Request descriptor construction.
//!
//! # Responsibilities
//! - Parse the query string with the flag vocabulary
//! - Split a single comma-joined `url` value into a list
//! - Attach the static defaults and the detected mode
//!
//! # Design Decisions
//! - Structural parsing only: URLs are not validated here, generators do that
//! - Never fails; a request with nothing usable is the empty-URL case
//! - Built once per request and read-only afterwards

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, Uri};
use url::form_urlencoded;

use crate::config::StaticConfig;
use crate::pipeline::flags::{self, Field, ParseRule, Toggles, TRUE_TOKEN};
use crate::pipeline::mode::Mode;

const URL_SEPARATOR: char = ',';

/// Output family picked by the format toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelection {
    None,
    /// Format A.
    V2ray,
    /// Format B.
    Mihomo,
    /// Format C.
    Singbox,
}

impl FormatSelection {
    /// First match wins: sing-box, then mihomo, then v2ray.
    pub fn from_toggles(toggles: &Toggles) -> Self {
        if toggles.want_singbox {
            FormatSelection::Singbox
        } else if toggles.want_mihomo {
            FormatSelection::Mihomo
        } else if toggles.want_v2ray {
            FormatSelection::V2ray
        } else {
            FormatSelection::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatSelection::None => "none",
            FormatSelection::V2ray => "v2ray",
            FormatSelection::Mihomo => "mihomo",
            FormatSelection::Singbox => "singbox",
        }
    }
}

/// Canonical, immutable view of one inbound request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// `http://<host>` the request was addressed to.
    pub origin: String,
    /// Subscription links, in the order given.
    pub urls: Vec<String>,
    pub user_agent: String,
    pub template_override: Option<String>,
    pub toggles: Toggles,
    pub static_config: Arc<StaticConfig>,
    pub mode: Mode,
}

impl RequestDescriptor {
    /// Build a descriptor from the request target and headers.
    pub fn build(uri: &Uri, headers: &HeaderMap, static_config: Arc<StaticConfig>) -> Self {
        let mut values: HashMap<Field, Vec<String>> = HashMap::new();
        let mut toggles = Toggles::default();

        for (key, value) in form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
            let Some(spec) = flags::lookup(&key) else {
                continue;
            };
            let seen = values.entry(spec.field).or_default();
            if spec.rule == ParseRule::TrueToken && seen.is_empty() {
                if let Field::Toggle(toggle) = spec.field {
                    toggles.set(toggle, value == TRUE_TOKEN);
                }
            }
            seen.push(value.into_owned());
        }

        let urls = split_urls(values.remove(&Field::Urls).unwrap_or_default());
        let template_override = values
            .remove(&Field::Template)
            .and_then(|v| v.into_iter().next())
            .filter(|t| !t.trim().is_empty());

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let mode = Mode::detect(&static_config.backend_url, &user_agent);

        Self {
            origin: origin_of(uri, headers),
            urls,
            user_agent,
            template_override,
            toggles,
            static_config,
            mode,
        }
    }

    pub fn format_selection(&self) -> FormatSelection {
        FormatSelection::from_toggles(&self.toggles)
    }

    /// False when no subscription link was supplied.
    pub fn has_targets(&self) -> bool {
        !self.urls.is_empty()
    }
}

/// Split a lone comma-joined value; repeated keys are kept as given.
fn split_urls(raw: Vec<String>) -> Vec<String> {
    let urls = match raw.as_slice() {
        [single] if single.contains(URL_SEPARATOR) => single
            .split(URL_SEPARATOR)
            .map(|part| part.trim().to_string())
            .collect(),
        _ => raw,
    };
    urls.into_iter().filter(|u| !u.trim().is_empty()).collect()
}

fn origin_of(uri: &Uri, headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    format!("http://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn build(target: &str) -> RequestDescriptor {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("gw.example:3000"));
        RequestDescriptor::build(
            &target.parse().unwrap(),
            &headers,
            Arc::new(StaticConfig::default()),
        )
    }

    #[test]
    fn test_no_urls() {
        let desc = build("/?singbox=true&tun=true");
        assert!(desc.urls.is_empty());
        assert!(!desc.has_targets());
        assert!(desc.toggles.enable_tun);
    }

    #[test]
    fn test_single_value_is_split_and_trimmed() {
        let desc = build("/?url=https%3A%2F%2Fa.example%2Fs%2C%20b%20%2Cc");
        assert_eq!(desc.urls, vec!["https://a.example/s", "b", "c"]);
    }

    #[test]
    fn test_repeated_values_not_split() {
        let desc = build("/?url=a%2Cb&url=c");
        assert_eq!(desc.urls, vec!["a,b", "c"]);
    }

    #[test]
    fn test_empty_url_is_no_target() {
        assert!(build("/?url=&mihomo=true").urls.is_empty());
        assert!(build("/?url=%20%2C%20").urls.is_empty());
        assert_eq!(build("/?url=a%2C%2Cb").urls, vec!["a", "b"]);
    }

    #[test]
    fn test_toggles_need_exact_token() {
        let desc = build("/?udp=true&tun=TRUE&ep=1&ea=yes&adgdns=true&adgdns=false&tailscale=false&tailscale=true");
        assert!(desc.toggles.enable_udp);
        assert!(!desc.toggles.enable_tun);
        assert!(!desc.toggles.exclude_package);
        assert!(!desc.toggles.exclude_address);
        assert!(desc.toggles.enable_adg_dns);
        assert!(!desc.toggles.enable_tailscale);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let desc = build("/?url=x&foo=bar&emoji=true&v2ray=true");
        assert_eq!(desc.urls, vec!["x"]);
        assert_eq!(desc.format_selection(), FormatSelection::V2ray);
    }

    #[test]
    fn test_template_and_origin() {
        let desc = build("/?template=1.12&template=1.13&url=x");
        assert_eq!(desc.template_override.as_deref(), Some("1.12"));
        assert_eq!(desc.origin, "http://gw.example:3000");
        assert!(desc.user_agent.is_empty());
    }

    #[test]
    fn test_origin_fallback() {
        let desc = RequestDescriptor::build(
            &"/?url=x".parse().unwrap(),
            &HeaderMap::new(),
            Arc::new(StaticConfig::default()),
        );
        assert_eq!(desc.origin, "http://localhost");
    }

    #[test]
    fn test_format_priority() {
        let desc = build("/?url=x&mihomo=true&singbox=true&v2ray=true");
        assert_eq!(desc.format_selection(), FormatSelection::Singbox);

        let desc = build("/?url=x&v2ray=true&mihomo=true");
        assert_eq!(desc.format_selection(), FormatSelection::Mihomo);

        assert_eq!(build("/?url=x").format_selection(), FormatSelection::None);
    }

    #[test]
    fn test_mode_from_user_agent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("sing-box 1.11.0"));
        let desc = RequestDescriptor::build(
            &"/".parse().unwrap(),
            &headers,
            Arc::new(StaticConfig::default()),
        );
        assert_eq!(desc.user_agent, "sing-box 1.11.0");
        assert_eq!(desc.mode.label(), "singbox-1.11+converter");
    }
}
