//! Templates compiled into the binary.
//!
//! Used whenever the deployment leaves a template field blank, so a fresh
//! install produces working configs with nothing but a converter backend.

use crate::pipeline::mode::SingBoxTrack;

pub const MIHOMO: &str = include_str!("../../templates/mihomo.yaml");

/// 1.12 and newer: typed DNS servers, endpoints.
pub const SINGBOX: &str = include_str!("../../templates/singbox.json");

/// 1.11: address-style DNS servers, no endpoints.
pub const SINGBOX_LEGACY: &str = include_str!("../../templates/singbox-legacy.json");

pub fn singbox(track: SingBoxTrack) -> &'static str {
    match track {
        SingBoxTrack::V1_11 => SINGBOX_LEGACY,
        SingBoxTrack::V1_12 | SingBoxTrack::V1_12Alpha | SingBoxTrack::V1_13 => SINGBOX,
    }
}
