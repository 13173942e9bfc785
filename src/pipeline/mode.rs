//! Client mode detection.
//!
//! Generators use the mode to pick a template variant. Detection looks only
//! at the converter address and the caller's `User-Agent`; it never fails.

use std::fmt;

/// sing-box template generation a client can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingBoxTrack {
    V1_11,
    V1_12,
    V1_12Alpha,
    V1_13,
}

impl SingBoxTrack {
    /// Track used when the client does not reveal its version.
    pub const LATEST: SingBoxTrack = SingBoxTrack::V1_13;

    pub fn as_str(&self) -> &'static str {
        match self {
            SingBoxTrack::V1_11 => "1.11",
            SingBoxTrack::V1_12 => "1.12",
            SingBoxTrack::V1_12Alpha => "1.12-alpha",
            SingBoxTrack::V1_13 => "1.13",
        }
    }

    /// Parse a track name as used by the `template` query key.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "1.11" => Some(SingBoxTrack::V1_11),
            "1.12" => Some(SingBoxTrack::V1_12),
            "1.12-alpha" | "1.12alpha" => Some(SingBoxTrack::V1_12Alpha),
            "1.13" => Some(SingBoxTrack::V1_13),
            _ => None,
        }
    }

    /// Map a version string such as `1.12.0-beta.3` onto a track.
    fn from_version(version: &str) -> Option<Self> {
        let (numbers, pre_release) = match version.split_once('-') {
            Some((numbers, suffix)) => (numbers, !suffix.is_empty()),
            None => (version, false),
        };
        let mut parts = numbers.split('.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = parts.next()?.parse().ok()?;

        let track = match (major, minor) {
            (0, _) | (1, 0..=11) => SingBoxTrack::V1_11,
            (1, 12) if pre_release => SingBoxTrack::V1_12Alpha,
            (1, 12) => SingBoxTrack::V1_12,
            _ => SingBoxTrack::V1_13,
        };
        Some(track)
    }

    /// Whether outbound TLS fragmentation is understood by this track.
    pub fn supports_tls_fragment(&self) -> bool {
        !matches!(self, SingBoxTrack::V1_11)
    }
}

/// Client family inferred from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    SingBox(SingBoxTrack),
    Mihomo,
    V2ray,
    Browser,
    Unknown,
}

/// Whether a subscription converter backend is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Converter,
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    pub client: ClientKind,
    pub backend: BackendKind,
}

const SINGBOX_APPS: &[&str] = &["sfa/", "sfi/", "sfm/", "sft/"];
const MIHOMO_MARKERS: &[&str] = &["mihomo", "clash.meta", "clash-verge", "flclash", "clash"];
const V2RAY_MARKERS: &[&str] = &["v2ray", "shadowrocket", "nekobox"];

impl Mode {
    pub fn detect(backend_url: &str, user_agent: &str) -> Self {
        let backend = if backend_url.trim().is_empty() {
            BackendKind::Direct
        } else {
            BackendKind::Converter
        };
        Self {
            client: detect_client(user_agent),
            backend,
        }
    }

    /// sing-box track to use, falling back to the latest one for clients
    /// that are not sing-box.
    pub fn singbox_track(&self) -> SingBoxTrack {
        match self.client {
            ClientKind::SingBox(track) => track,
            _ => SingBoxTrack::LATEST,
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.client {
            ClientKind::SingBox(track) => write!(f, "singbox-{}", track.as_str())?,
            ClientKind::Mihomo => f.write_str("mihomo")?,
            ClientKind::V2ray => f.write_str("v2ray")?,
            ClientKind::Browser => f.write_str("browser")?,
            ClientKind::Unknown => f.write_str("unknown")?,
        }
        match self.backend {
            BackendKind::Converter => f.write_str("+converter"),
            BackendKind::Direct => f.write_str("+direct"),
        }
    }
}

fn detect_client(user_agent: &str) -> ClientKind {
    let ua = user_agent.trim().to_ascii_lowercase();
    if ua.is_empty() {
        return ClientKind::Unknown;
    }

    if let Some(rest) = ua.find("sing-box").map(|i| &ua[i + "sing-box".len()..]) {
        return ClientKind::SingBox(version_track(rest.trim_start_matches([' ', '/'])));
    }
    if let Some(rest) = SINGBOX_APPS
        .iter()
        .find_map(|app| ua.find(app).map(|i| &ua[i + app.len()..]))
    {
        return ClientKind::SingBox(version_track(rest));
    }

    if MIHOMO_MARKERS.iter().any(|m| ua.contains(m)) {
        return ClientKind::Mihomo;
    }
    if V2RAY_MARKERS.iter().any(|m| ua.contains(m)) {
        return ClientKind::V2ray;
    }
    if ua.starts_with("mozilla/") {
        return ClientKind::Browser;
    }
    ClientKind::Unknown
}

fn version_track(rest: &str) -> SingBoxTrack {
    let version: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
        .collect();
    SingBoxTrack::from_version(version.trim_start_matches('v')).unwrap_or(SingBoxTrack::LATEST)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKEND: &str = "http://127.0.0.1:25500";

    fn client(ua: &str) -> ClientKind {
        Mode::detect(BACKEND, ua).client
    }

    #[test]
    fn test_singbox_versions() {
        assert_eq!(client("sing-box 1.11.4"), ClientKind::SingBox(SingBoxTrack::V1_11));
        assert_eq!(client("sing-box 1.10.0"), ClientKind::SingBox(SingBoxTrack::V1_11));
        assert_eq!(client("sing-box 1.12.3"), ClientKind::SingBox(SingBoxTrack::V1_12));
        assert_eq!(
            client("sing-box 1.12.0-alpha.18"),
            ClientKind::SingBox(SingBoxTrack::V1_12Alpha)
        );
        assert_eq!(client("sing-box 1.13.0"), ClientKind::SingBox(SingBoxTrack::V1_13));
        assert_eq!(client("SFA/1.12.1 (Android 14; sing-box 1.12.1)"), ClientKind::SingBox(SingBoxTrack::V1_12));
        assert_eq!(client("SFI/1.11.0"), ClientKind::SingBox(SingBoxTrack::V1_11));
        assert_eq!(client("sing-box"), ClientKind::SingBox(SingBoxTrack::LATEST));
    }

    #[test]
    fn test_other_clients() {
        assert_eq!(client("clash.meta/v1.18.0"), ClientKind::Mihomo);
        assert_eq!(client("mihomo/1.19.2"), ClientKind::Mihomo);
        assert_eq!(client("ClashforWindows/0.20.39"), ClientKind::Mihomo);
        assert_eq!(client("v2rayNG/1.9.16"), ClientKind::V2ray);
        assert_eq!(client("Mozilla/5.0 (X11; Linux x86_64)"), ClientKind::Browser);
        assert_eq!(client("curl/8.5.0"), ClientKind::Unknown);
    }

    #[test]
    fn test_detection_is_total() {
        let inputs = ["", " ", "sing-box ", "sing-box 99", "sing-box x.y", "sfa/", "\u{1F600}", "1.12"];
        for ua in inputs {
            for backend in ["", BACKEND, "garbage"] {
                let mode = Mode::detect(backend, ua);
                assert!(!mode.label().is_empty());
            }
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Mode::detect("", "").label(), "unknown+direct");
        assert_eq!(Mode::detect(BACKEND, "").label(), "unknown+converter");
        assert_eq!(Mode::detect(BACKEND, "sing-box 1.12.0-beta.1").label(), "singbox-1.12-alpha+converter");
    }

    #[test]
    fn test_track_names() {
        assert_eq!(SingBoxTrack::from_name("1.12-alpha"), Some(SingBoxTrack::V1_12Alpha));
        assert_eq!(SingBoxTrack::from_name("1.9"), None);
        assert_eq!(Mode::detect(BACKEND, "mihomo").singbox_track(), SingBoxTrack::LATEST);
    }
}
