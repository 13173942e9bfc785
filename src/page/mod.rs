//! Landing page shown when a request carries no subscription link.
//!
//! The form submits back to `/` with the same query keys the gateway parses,
//! so filling it in and pressing the button yields a working config link.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::pipeline::flags::{key_of, Toggle, Toggles};
use crate::pipeline::RequestDescriptor;

const STYLE: &str = r#"
body { margin: 0; min-height: 100vh; font-family: system-ui, sans-serif; background: #1f2430 center / cover no-repeat fixed; color: #e6e6e6; display: flex; align-items: center; justify-content: center; }
main { background: rgba(20, 22, 30, 0.82); border-radius: 12px; padding: 2rem; width: min(40rem, 92vw); }
h1 { margin-top: 0; font-size: 1.4rem; }
textarea, input[type=text] { width: 100%; box-sizing: border-box; padding: .5rem; border-radius: 6px; border: 1px solid #444; background: #111; color: inherit; }
fieldset { border: 1px solid #444; border-radius: 6px; margin: 1rem 0; }
label { display: inline-block; margin: .25rem .75rem .25rem 0; }
button { padding: .6rem 1.4rem; border: 0; border-radius: 6px; background: #4c8bf5; color: #fff; cursor: pointer; }
footer { margin-top: 1.5rem; font-size: .8rem; text-align: center; }
footer a { color: #9ab; }
.mode { font-size: .8rem; color: #9ab; }
"#;

const FORMATS: [(Toggle, &str); 3] = [
    (Toggle::Singbox, "sing-box"),
    (Toggle::Mihomo, "mihomo"),
    (Toggle::V2ray, "v2ray"),
];

const FEATURES: [(Toggle, &str); 8] = [
    (Toggle::Udp, "UDP"),
    (Toggle::UdpFragment, "UDP fragment"),
    (Toggle::TlsFragment, "TLS fragment"),
    (Toggle::ExcludePackage, "Exclude packages"),
    (Toggle::ExcludeAddress, "Exclude addresses"),
    (Toggle::Tailscale, "Tailscale"),
    (Toggle::Tun, "TUN"),
    (Toggle::AdgDns, "AdGuard DNS"),
];

pub fn render(descriptor: &RequestDescriptor) -> String {
    let config = &descriptor.static_config;
    let backdrop = if config.image_url.trim().is_empty() {
        String::new()
    } else {
        format!("body {{ background-image: url('{}'); }}", config.image_url.replace('\'', "%27"))
    };

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Subscription Gateway" }
                style { (PreEscaped(STYLE)) (PreEscaped(backdrop)) }
            }
            body {
                main {
                    h1 { "Subscription Gateway" }
                    form method="get" action="/" {
                        label for="url" { "Subscription links (comma separated)" }
                        textarea id="url" name="url" rows="4" required {
                            (descriptor.urls.join(","))
                        }
                        fieldset {
                            legend { "Format" }
                            @for (toggle, label) in FORMATS {
                                (checkbox(&descriptor.toggles, toggle, label))
                            }
                        }
                        fieldset {
                            legend { "Options" }
                            @for (toggle, label) in FEATURES {
                                (checkbox(&descriptor.toggles, toggle, label))
                            }
                        }
                        label for="template" { "Template (URL or name, optional)" }
                        input id="template" type="text" name="template"
                            value=(descriptor.template_override.as_deref().unwrap_or_default());
                        p { button type="submit" { "Generate" } }
                    }
                    p.mode { "Detected client: " (descriptor.mode.to_string()) }
                    @if !config.beian_text.trim().is_empty() {
                        footer {
                            a href=(config.beian_url) target="_blank" rel="noopener" { (config.beian_text) }
                        }
                    }
                }
            }
        }
    };
    markup.into_string()
}

fn checkbox(toggles: &Toggles, toggle: Toggle, label: &str) -> Markup {
    let key = key_of(toggle);
    html! {
        label {
            input type="checkbox" name=(key) value="true" checked[toggles.get(toggle)];
            " " (label)
        }
    }
}
