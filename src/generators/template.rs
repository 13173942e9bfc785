//! Template selection.
//!
//! Precedence, highest first:
//! 1. the request's `template` value (a URL, or a named template)
//! 2. the deployment override (`SINGBOX` / `MIHOMO`)
//! 3. the default for the detected mode
//!
//! A default left blank in the deployment config falls back to the
//! template compiled into the binary.

use std::borrow::Cow;

use crate::config::validation::is_http_url;
use crate::generators::converter::ConverterClient;
use crate::generators::{bundled, GeneratorError};
use crate::pipeline::mode::SingBoxTrack;
use crate::pipeline::RequestDescriptor;

/// Name that selects the stock mihomo template.
pub const MIHOMO_DEFAULT_NAME: &str = "default";

/// Where a template document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Remote(String),
    Bundled(&'static str),
}

impl TemplateSource {
    fn configured(url: &str, bundled: &'static str) -> Self {
        if url.trim().is_empty() {
            TemplateSource::Bundled(bundled)
        } else {
            TemplateSource::Remote(url.trim().to_string())
        }
    }

    /// Fetch a remote template, or hand out the bundled text.
    pub async fn load(&self, converter: &ConverterClient, user_agent: &str) -> Result<Cow<'static, str>, GeneratorError> {
        match self {
            TemplateSource::Remote(url) => {
                let upstream = converter.fetch_template(url, user_agent).await?;
                Ok(Cow::Owned(upstream.body))
            }
            TemplateSource::Bundled(text) => Ok(Cow::Borrowed(text)),
        }
    }
}

/// A resolved sing-box template and the track whose rules apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingboxTemplate {
    pub source: TemplateSource,
    pub track: SingBoxTrack,
}

pub fn singbox_template(descriptor: &RequestDescriptor) -> Result<SingboxTemplate, GeneratorError> {
    let defaults = &descriptor.static_config;
    let mode_track = descriptor.mode.singbox_track();

    if let Some(requested) = descriptor.template_override.as_deref() {
        if is_http_url(requested) {
            return Ok(SingboxTemplate {
                source: TemplateSource::Remote(requested.trim().to_string()),
                track: mode_track,
            });
        }
        let track = SingBoxTrack::from_name(requested)
            .ok_or_else(|| GeneratorError::UnknownTemplate(requested.to_string()))?;
        return Ok(SingboxTemplate {
            source: track_source(descriptor, track),
            track,
        });
    }

    if let Some(url) = defaults.overrides.singbox.as_deref().filter(|u| !u.trim().is_empty()) {
        return Ok(SingboxTemplate {
            source: TemplateSource::Remote(url.trim().to_string()),
            track: mode_track,
        });
    }

    Ok(SingboxTemplate {
        source: track_source(descriptor, mode_track),
        track: mode_track,
    })
}

pub fn mihomo_template(descriptor: &RequestDescriptor) -> Result<TemplateSource, GeneratorError> {
    let defaults = &descriptor.static_config;
    let stock = TemplateSource::configured(&defaults.mihomo_template, bundled::MIHOMO);

    if let Some(requested) = descriptor.template_override.as_deref() {
        if is_http_url(requested) {
            return Ok(TemplateSource::Remote(requested.trim().to_string()));
        }
        if requested.trim().eq_ignore_ascii_case(MIHOMO_DEFAULT_NAME) {
            return Ok(stock);
        }
        return Err(GeneratorError::UnknownTemplate(requested.to_string()));
    }

    Ok(defaults
        .overrides
        .mihomo
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .map(|url| TemplateSource::Remote(url.trim().to_string()))
        .unwrap_or(stock))
}

fn track_source(descriptor: &RequestDescriptor, track: SingBoxTrack) -> TemplateSource {
    let defaults = &descriptor.static_config;
    let url = match track {
        SingBoxTrack::V1_11 => &defaults.singbox_1_11,
        SingBoxTrack::V1_12 => &defaults.singbox_1_12,
        SingBoxTrack::V1_12Alpha => &defaults.singbox_1_12_alpha,
        SingBoxTrack::V1_13 => &defaults.singbox_1_13,
    };
    TemplateSource::configured(url, bundled::singbox(track))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, StaticConfig};
    use axum::http::{header, HeaderMap, HeaderValue, Uri};
    use std::sync::Arc;

    fn descriptor_with(target: &str, ua: &str, config: StaticConfig) -> RequestDescriptor {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_str(ua).unwrap());
        let uri: Uri = target.parse().unwrap();
        RequestDescriptor::build(&uri, &headers, Arc::new(config))
    }

    fn descriptor(target: &str, ua: &str, overrides: ConfigOverrides) -> RequestDescriptor {
        let config = StaticConfig {
            overrides,
            ..StaticConfig::default()
        };
        descriptor_with(target, ua, config)
    }

    fn remote(url: &str) -> TemplateSource {
        TemplateSource::Remote(url.to_string())
    }

    #[test]
    fn test_singbox_follows_mode() {
        let desc = descriptor("/?url=x", "sing-box 1.11.2", ConfigOverrides::default());
        let template = singbox_template(&desc).unwrap();
        assert_eq!(template.track, SingBoxTrack::V1_11);
        assert_eq!(template.source, TemplateSource::Bundled(bundled::SINGBOX_LEGACY));
    }

    #[test]
    fn test_configured_default_replaces_bundled() {
        let config = StaticConfig {
            singbox_1_12: " https://ops.example/1.12.json ".into(),
            ..StaticConfig::default()
        };
        let desc = descriptor_with("/?url=x", "sing-box 1.12.0", config.clone());
        assert_eq!(singbox_template(&desc).unwrap().source, remote("https://ops.example/1.12.json"));

        let desc = descriptor_with("/?url=x", "sing-box 1.13.0", config);
        assert_eq!(singbox_template(&desc).unwrap().source, TemplateSource::Bundled(bundled::SINGBOX));
    }

    #[test]
    fn test_singbox_named_override_wins() {
        let overrides = ConfigOverrides {
            singbox: Some("https://ops.example/sb.json".into()),
            ..Default::default()
        };
        let desc = descriptor("/?url=x&template=1.12-alpha", "sing-box 1.11.2", overrides);
        let template = singbox_template(&desc).unwrap();
        assert_eq!(template.track, SingBoxTrack::V1_12Alpha);
        assert_eq!(template.source, TemplateSource::Bundled(bundled::SINGBOX));
    }

    #[test]
    fn test_singbox_deployment_override() {
        let overrides = ConfigOverrides {
            singbox: Some("https://ops.example/sb.json".into()),
            ..Default::default()
        };
        let desc = descriptor("/?url=x", "sing-box 1.12.0", overrides);
        let template = singbox_template(&desc).unwrap();
        assert_eq!(template.source, remote("https://ops.example/sb.json"));
        assert_eq!(template.track, SingBoxTrack::V1_12);
    }

    #[test]
    fn test_singbox_url_override() {
        let desc = descriptor(
            "/?url=x&template=https%3A%2F%2Fmine.example%2Ft.json",
            "",
            ConfigOverrides::default(),
        );
        let template = singbox_template(&desc).unwrap();
        assert_eq!(template.source, remote("https://mine.example/t.json"));
        assert_eq!(template.track, SingBoxTrack::LATEST);
    }

    #[test]
    fn test_unknown_template_name() {
        let desc = descriptor("/?url=x&template=fancy", "", ConfigOverrides::default());
        assert!(matches!(singbox_template(&desc), Err(GeneratorError::UnknownTemplate(_))));
        assert!(matches!(mihomo_template(&desc), Err(GeneratorError::UnknownTemplate(_))));
    }

    #[test]
    fn test_mihomo_precedence() {
        let overrides = ConfigOverrides {
            mihomo: Some("https://ops.example/m.yaml".into()),
            ..Default::default()
        };
        let desc = descriptor("/?url=x", "", overrides.clone());
        assert_eq!(mihomo_template(&desc).unwrap(), remote("https://ops.example/m.yaml"));

        let desc = descriptor("/?url=x&template=default", "", overrides);
        assert_eq!(mihomo_template(&desc).unwrap(), TemplateSource::Bundled(bundled::MIHOMO));

        let config = StaticConfig {
            mihomo_template: "https://ops.example/stock.yaml".into(),
            ..StaticConfig::default()
        };
        let desc = descriptor_with("/?url=x", "", config);
        assert_eq!(mihomo_template(&desc).unwrap(), remote("https://ops.example/stock.yaml"));
    }
}
