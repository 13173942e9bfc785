//! sing-box (Format C) generator.
//!
//! Merges converter outbounds into a JSON template and applies the request
//! toggles. The template decides structure; nodes are appended after the
//! template's own outbounds and `{all}` placeholders in group members are
//! expanded to every node tag.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::generators::converter::{ConverterClient, Target};
use crate::generators::template::singbox_template;
use crate::generators::{expand_placeholder, ConfigGenerator, GeneratorError, GeneratorResult};
use crate::pipeline::flags::Toggles;
use crate::pipeline::mode::SingBoxTrack;
use crate::pipeline::RequestDescriptor;

const ADGUARD_TAG: &str = "adguard";
const ADGUARD_HOST: &str = "dns.adguard-dns.com";

pub struct SingboxGenerator {
    converter: ConverterClient,
}

impl SingboxGenerator {
    pub fn new(converter: ConverterClient) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl ConfigGenerator for SingboxGenerator {
    async fn generate(&self, descriptor: &RequestDescriptor) -> Result<GeneratorResult, GeneratorError> {
        let template = singbox_template(descriptor)?;
        let nodes = self.converter.fetch_nodes(descriptor, Target::Singbox).await?;
        let raw_template = template.source.load(&self.converter, &descriptor.user_agent).await?;

        let base: Value = serde_json::from_str(&raw_template)
            .map_err(|e| GeneratorError::decode("sing-box template", e))?;
        let outbounds = parse_outbounds(&nodes.body)?;

        tracing::debug!(
            track = template.track.as_str(),
            nodes = outbounds.len(),
            "Building sing-box config"
        );

        let config = build_config(base, outbounds, &descriptor.toggles, template.track)?;
        let data = serde_json::to_vec_pretty(&config)
            .map_err(|e| GeneratorError::decode("sing-box config", e))?;

        Ok(GeneratorResult {
            status: Some(nodes.status),
            headers: nodes.headers,
            data: data.into(),
        })
    }
}

/// Accepts `{"outbounds": [...]}` or a bare array.
pub fn parse_outbounds(body: &str) -> Result<Vec<Value>, GeneratorError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| GeneratorError::decode("sing-box node list", e))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("outbounds") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(shape("object without an outbounds array")),
        },
        _ => Err(shape("neither an array nor an object")),
    }
}

/// Merge `nodes` into `template` and apply `toggles`.
pub fn build_config(
    mut template: Value,
    nodes: Vec<Value>,
    toggles: &Toggles,
    track: SingBoxTrack,
) -> Result<Value, GeneratorError> {
    let root = template
        .as_object_mut()
        .ok_or_else(|| shape("template root is not an object"))?;

    let mut nodes: Vec<Value> = nodes
        .into_iter()
        .filter(|node| node.get("tag").and_then(Value::as_str).is_some())
        .collect();
    for node in &mut nodes {
        patch_node(node, toggles, track);
    }
    let tags: Vec<String> = nodes
        .iter()
        .filter_map(|n| n.get("tag").and_then(Value::as_str).map(str::to_string))
        .collect();

    let outbounds = array_entry(root, "outbounds")?;
    for outbound in outbounds.iter_mut() {
        if let Some(Value::Array(members)) = outbound.get_mut("outbounds") {
            expand_placeholder(members, &tags);
        }
    }
    outbounds.extend(nodes);

    patch_tun(root, toggles)?;
    if !toggles.enable_tailscale {
        drop_tailscale(root);
    }
    if toggles.enable_adg_dns {
        use_adguard(root, track)?;
    }

    Ok(template)
}

fn patch_node(node: &mut Value, toggles: &Toggles, track: SingBoxTrack) {
    let Some(node) = node.as_object_mut() else {
        return;
    };
    if toggles.enable_udp_fragment {
        node.insert("udp_fragment".into(), Value::Bool(true));
    }
    if toggles.enable_tls_fragment && track.supports_tls_fragment() {
        if let Some(tls) = node.get_mut("tls").and_then(Value::as_object_mut) {
            if tls.get("enabled").and_then(Value::as_bool) == Some(true) {
                tls.insert("fragment".into(), Value::Bool(true));
            }
        }
    }
}

fn patch_tun(root: &mut Map<String, Value>, toggles: &Toggles) -> Result<(), GeneratorError> {
    let Some(inbounds) = root.get_mut("inbounds") else {
        return Ok(());
    };
    let inbounds = inbounds
        .as_array_mut()
        .ok_or_else(|| shape("inbounds is not an array"))?;

    if !toggles.enable_tun {
        inbounds.retain(|inbound| type_of(inbound) != Some("tun"));
        return Ok(());
    }

    for inbound in inbounds.iter_mut().filter(|i| type_of(i) == Some("tun")) {
        if let Some(tun) = inbound.as_object_mut() {
            if !toggles.exclude_package {
                tun.remove("exclude_package");
            }
            if !toggles.exclude_address {
                tun.remove("route_exclude_address");
            }
        }
    }
    Ok(())
}

/// Remove tailscale endpoints and every reference to their tags.
fn drop_tailscale(root: &mut Map<String, Value>) {
    let Some(Value::Array(endpoints)) = root.get_mut("endpoints") else {
        return;
    };
    let removed: Vec<String> = endpoints
        .iter()
        .filter(|e| type_of(e) == Some("tailscale"))
        .filter_map(|e| e.get("tag").and_then(Value::as_str).map(str::to_string))
        .collect();
    endpoints.retain(|e| type_of(e) != Some("tailscale"));
    if endpoints.is_empty() {
        root.remove("endpoints");
    }
    if removed.is_empty() {
        return;
    }

    let is_removed = |v: &Value| v.as_str().is_some_and(|tag| removed.iter().any(|r| r == tag));
    if let Some(Value::Array(outbounds)) = root.get_mut("outbounds") {
        for outbound in outbounds.iter_mut() {
            if let Some(Value::Array(members)) = outbound.get_mut("outbounds") {
                members.retain(|m| !is_removed(m));
            }
        }
    }
    if let Some(Value::Array(rules)) = root.get_mut("route").and_then(|r| r.get_mut("rules")) {
        rules.retain(|rule| !rule.get("outbound").is_some_and(is_removed));
    }
}

fn use_adguard(root: &mut Map<String, Value>, track: SingBoxTrack) -> Result<(), GeneratorError> {
    let server = match track {
        SingBoxTrack::V1_11 => json!({
            "tag": ADGUARD_TAG,
            "address": format!("https://{ADGUARD_HOST}/dns-query"),
            "detour": "direct",
        }),
        _ => json!({
            "tag": ADGUARD_TAG,
            "type": "https",
            "server": ADGUARD_HOST,
        }),
    };

    let dns = root
        .entry("dns")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| shape("dns is not an object"))?;
    let servers = array_entry(dns, "servers")?;
    servers.retain(|s| s.get("tag").and_then(Value::as_str) != Some(ADGUARD_TAG));
    servers.insert(0, server);
    dns.insert("final".into(), Value::String(ADGUARD_TAG.into()));
    Ok(())
}

fn array_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Vec<Value>, GeneratorError> {
    map.entry(key)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| GeneratorError::Shape {
            what: "sing-box template",
            reason: format!("{key} is not an array"),
        })
}

fn type_of(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn shape(reason: &str) -> GeneratorError {
    GeneratorError::Shape {
        what: "sing-box document",
        reason: reason.to_string(),
    }
}
