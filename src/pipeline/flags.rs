//! Query-string vocabulary.
//!
//! The table below is the only place query keys are named. The descriptor
//! builder parses with it and the CLI composes links with it, so both sides
//! always agree on spelling.

use url::form_urlencoded;

/// Literal value that turns a toggle on. Anything else is off.
pub const TRUE_TOKEN: &str = "true";

/// Boolean switches a caller can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    Singbox,
    Mihomo,
    V2ray,
    Udp,
    UdpFragment,
    TlsFragment,
    ExcludePackage,
    ExcludeAddress,
    Tailscale,
    Tun,
    AdgDns,
}

/// Descriptor field a query key feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Urls,
    Template,
    Toggle(Toggle),
}

/// How the raw query values of a key are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRule {
    /// On when the first value equals [`TRUE_TOKEN`].
    TrueToken,
    /// Raw string values, in order of appearance.
    Values,
}

#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    pub key: &'static str,
    pub field: Field,
    pub rule: ParseRule,
}

const fn toggle(key: &'static str, toggle: Toggle) -> FlagSpec {
    FlagSpec {
        key,
        field: Field::Toggle(toggle),
        rule: ParseRule::TrueToken,
    }
}

pub const VOCABULARY: &[FlagSpec] = &[
    FlagSpec { key: "url", field: Field::Urls, rule: ParseRule::Values },
    FlagSpec { key: "template", field: Field::Template, rule: ParseRule::Values },
    toggle("singbox", Toggle::Singbox),
    toggle("mihomo", Toggle::Mihomo),
    toggle("v2ray", Toggle::V2ray),
    toggle("udp", Toggle::Udp),
    toggle("udp_frag", Toggle::UdpFragment),
    toggle("tls_frag", Toggle::TlsFragment),
    toggle("ep", Toggle::ExcludePackage),
    toggle("ea", Toggle::ExcludeAddress),
    toggle("tailscale", Toggle::Tailscale),
    toggle("tun", Toggle::Tun),
    toggle("adgdns", Toggle::AdgDns),
];

/// Look up a query key. Unknown keys yield `None` and are ignored by callers.
pub fn lookup(key: &str) -> Option<&'static FlagSpec> {
    VOCABULARY.iter().find(|spec| spec.key == key)
}

/// Query key for a toggle.
pub fn key_of(target: Toggle) -> &'static str {
    VOCABULARY
        .iter()
        .find(|spec| spec.field == Field::Toggle(target))
        .map(|spec| spec.key)
        .unwrap_or_default()
}

/// Every toggle a request can carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggles {
    pub want_singbox: bool,
    pub want_mihomo: bool,
    pub want_v2ray: bool,
    pub enable_udp: bool,
    pub enable_udp_fragment: bool,
    pub enable_tls_fragment: bool,
    pub exclude_package: bool,
    pub exclude_address: bool,
    pub enable_tailscale: bool,
    pub enable_tun: bool,
    pub enable_adg_dns: bool,
}

impl Toggles {
    fn slot(&mut self, toggle: Toggle) -> &mut bool {
        match toggle {
            Toggle::Singbox => &mut self.want_singbox,
            Toggle::Mihomo => &mut self.want_mihomo,
            Toggle::V2ray => &mut self.want_v2ray,
            Toggle::Udp => &mut self.enable_udp,
            Toggle::UdpFragment => &mut self.enable_udp_fragment,
            Toggle::TlsFragment => &mut self.enable_tls_fragment,
            Toggle::ExcludePackage => &mut self.exclude_package,
            Toggle::ExcludeAddress => &mut self.exclude_address,
            Toggle::Tailscale => &mut self.enable_tailscale,
            Toggle::Tun => &mut self.enable_tun,
            Toggle::AdgDns => &mut self.enable_adg_dns,
        }
    }

    pub fn set(&mut self, toggle: Toggle, on: bool) {
        *self.slot(toggle) = on;
    }

    pub fn get(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Singbox => self.want_singbox,
            Toggle::Mihomo => self.want_mihomo,
            Toggle::V2ray => self.want_v2ray,
            Toggle::Udp => self.enable_udp,
            Toggle::UdpFragment => self.enable_udp_fragment,
            Toggle::TlsFragment => self.enable_tls_fragment,
            Toggle::ExcludePackage => self.exclude_package,
            Toggle::ExcludeAddress => self.exclude_address,
            Toggle::Tailscale => self.enable_tailscale,
            Toggle::Tun => self.enable_tun,
            Toggle::AdgDns => self.enable_adg_dns,
        }
    }
}

/// Build a query string the gateway will parse back into the same
/// urls, template and toggles.
pub fn compose_query(urls: &[String], template: Option<&str>, toggles: &Toggles) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for spec in VOCABULARY {
        match spec.field {
            Field::Urls => {
                for url in urls {
                    query.append_pair(spec.key, url);
                }
            }
            Field::Template => {
                if let Some(template) = template {
                    query.append_pair(spec.key, template);
                }
            }
            Field::Toggle(toggle) => {
                if toggles.get(toggle) {
                    query.append_pair(spec.key, TRUE_TOKEN);
                }
            }
        }
    }
    query.finish()
}
