//! mihomo (Format B) generator.
//!
//! Templates are YAML with `<<` merge keys resolved before anything else
//! touches them. The document is emitted as JSON, which mihomo reads
//! as YAML, so the gateway's JSON content type holds for every format.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::generators::converter::{ConverterClient, Target};
use crate::generators::template::mihomo_template;
use crate::generators::{expand_placeholder, ConfigGenerator, GeneratorError, GeneratorResult};
use crate::pipeline::flags::Toggles;
use crate::pipeline::RequestDescriptor;

const ADGUARD_DOH: &str = "https://dns.adguard-dns.com/dns-query";

pub struct MihomoGenerator {
    converter: ConverterClient,
}

impl MihomoGenerator {
    pub fn new(converter: ConverterClient) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl ConfigGenerator for MihomoGenerator {
    async fn generate(&self, descriptor: &RequestDescriptor) -> Result<GeneratorResult, GeneratorError> {
        let template = mihomo_template(descriptor)?;
        let nodes = self.converter.fetch_nodes(descriptor, Target::Clash).await?;
        let raw_template = template.load(&self.converter, &descriptor.user_agent).await?;

        let base = parse_yaml(&raw_template, "mihomo template")?;
        let proxies = parse_proxies(&nodes.body)?;

        tracing::debug!(proxies = proxies.len(), "Building mihomo config");

        let config = build_config(base, proxies, &descriptor.toggles)?;
        let data = serde_json::to_vec_pretty(&config)
            .map_err(|e| GeneratorError::decode("mihomo config", e))?;

        Ok(GeneratorResult {
            status: Some(nodes.status),
            headers: nodes.headers,
            data: data.into(),
        })
    }
}

/// Parse YAML with `<<` merge keys resolved, as a JSON value.
pub fn parse_yaml(body: &str, what: &'static str) -> Result<Value, GeneratorError> {
    let mut doc: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(body).map_err(|e| GeneratorError::decode(what, e))?;
    doc.apply_merge().map_err(|e| GeneratorError::decode(what, e))?;
    serde_json::to_value(doc).map_err(|e| GeneratorError::decode(what, e))
}

/// Accepts a `proxies:` document or a bare sequence.
pub fn parse_proxies(body: &str) -> Result<Vec<Value>, GeneratorError> {
    match parse_yaml(body, "mihomo proxy list")? {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("proxies") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            _ => Err(shape("proxies is not a sequence")),
        },
        _ => Err(shape("neither a sequence nor a mapping")),
    }
}

pub fn build_config(mut template: Value, proxies: Vec<Value>, toggles: &Toggles) -> Result<Value, GeneratorError> {
    let root = template
        .as_object_mut()
        .ok_or_else(|| shape("template root is not a mapping"))?;

    let mut proxies: Vec<Value> = proxies
        .into_iter()
        .filter(|p| p.get("name").and_then(Value::as_str).is_some())
        .collect();
    if toggles.enable_udp {
        for proxy in proxies.iter_mut().filter_map(Value::as_object_mut) {
            proxy.insert("udp".into(), Value::Bool(true));
        }
    }
    let names: Vec<String> = proxies
        .iter()
        .filter_map(|p| p.get("name").and_then(Value::as_str).map(str::to_string))
        .collect();

    sequence_entry(root, "proxies")?.extend(proxies);

    if let Some(groups) = root.get_mut("proxy-groups") {
        let groups = groups
            .as_array_mut()
            .ok_or_else(|| shape("proxy-groups is not a sequence"))?;
        for group in groups.iter_mut() {
            if let Some(Value::Array(members)) = group.get_mut("proxies") {
                expand_placeholder(members, &names);
            }
        }
    }

    patch_tun(root, toggles)?;
    if toggles.enable_adg_dns {
        use_adguard(root)?;
    }

    Ok(template)
}

fn patch_tun(root: &mut Map<String, Value>, toggles: &Toggles) -> Result<(), GeneratorError> {
    if !root.contains_key("tun") && !toggles.enable_tun {
        return Ok(());
    }
    let tun = root
        .entry("tun")
        .or_insert_with(|| {
            json!({
                "stack": "mixed",
                "auto-route": true,
                "auto-detect-interface": true,
            })
        })
        .as_object_mut()
        .ok_or_else(|| shape("tun is not a mapping"))?;

    tun.insert("enable".into(), Value::Bool(toggles.enable_tun));
    if !toggles.exclude_package {
        tun.remove("exclude-package");
    }
    if !toggles.exclude_address {
        tun.remove("route-exclude-address");
    }
    Ok(())
}

fn use_adguard(root: &mut Map<String, Value>) -> Result<(), GeneratorError> {
    let dns = root
        .entry("dns")
        .or_insert_with(|| json!({ "enable": true }))
        .as_object_mut()
        .ok_or_else(|| shape("dns is not a mapping"))?;
    let nameservers = sequence_entry(dns, "nameserver")?;
    nameservers.retain(|ns| ns.as_str() != Some(ADGUARD_DOH));
    nameservers.insert(0, Value::String(ADGUARD_DOH.into()));
    Ok(())
}

fn sequence_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Vec<Value>, GeneratorError> {
    let entry = map.entry(key).or_insert_with(|| Value::Array(Vec::new()));
    // A bare `proxies:` key in YAML is null.
    if entry.is_null() {
        *entry = Value::Array(Vec::new());
    }
    entry.as_array_mut().ok_or_else(|| GeneratorError::Shape {
        what: "mihomo template",
        reason: format!("{key} is not a sequence"),
    })
}

fn shape(reason: &str) -> GeneratorError {
    GeneratorError::Shape {
        what: "mihomo document",
        reason: reason.to_string(),
    }
}
