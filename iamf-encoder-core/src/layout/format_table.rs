//! Mapping from transcoder output format names to audio element layouts.
//!
//! Names match the transcoder's format strings exactly (case-sensitive).
//! Unknown names are an error; there is no fallback layout.

use serde::Serialize;

use super::codes::{LoudspeakerLayout, SoundSystem};
use crate::models::config::{AudioConfig, ElementConfig, MixConfig};
use crate::models::error::{EncoderError, Result};

/// Ambisonics mode written for scene-based elements.
pub const AMBISONICS_MODE_PROJECTION: u8 = 1;

#[derive(Debug, Clone, Copy)]
enum FormatKind {
    Channels(u32),
    Ambisonics { order: u32 },
}

#[derive(Debug)]
struct FormatEntry {
    /// Canonical name first, then accepted aliases.
    names: &'static [&'static str],
    element_id: u32,
    kind: FormatKind,
}

const FORMAT_TABLE: &[FormatEntry] = &[
    FormatEntry { names: &["M1Spatial-4", "M1Horizon"], element_id: 1, kind: FormatKind::Channels(4) },
    FormatEntry { names: &["M1Spatial-8", "M1Spatial"], element_id: 2, kind: FormatKind::Channels(8) },
    FormatEntry { names: &["M1Spatial-14"], element_id: 3, kind: FormatKind::Channels(14) },
    FormatEntry { names: &["5.1.4"], element_id: 4, kind: FormatKind::Channels(10) },
    FormatEntry { names: &["5.1"], element_id: 5, kind: FormatKind::Channels(6) },
    FormatEntry { names: &["1.0", "mono"], element_id: 6, kind: FormatKind::Channels(1) },
    FormatEntry { names: &["2.0", "stereo"], element_id: 7, kind: FormatKind::Channels(2) },
    FormatEntry { names: &["M1Spatial-12"], element_id: 8, kind: FormatKind::Channels(12) },
    FormatEntry { names: &["5.1.2"], element_id: 9, kind: FormatKind::Channels(8) },
    FormatEntry { names: &["7.1"], element_id: 10, kind: FormatKind::Channels(8) },
    FormatEntry { names: &["7.1.2"], element_id: 11, kind: FormatKind::Channels(10) },
    FormatEntry { names: &["7.1.4"], element_id: 12, kind: FormatKind::Channels(12) },
    FormatEntry { names: &["ACNSN3D"], element_id: 13, kind: FormatKind::Ambisonics { order: 1 } },
    FormatEntry { names: &["ACNSN3DO2A"], element_id: 14, kind: FormatKind::Ambisonics { order: 2 } },
    FormatEntry { names: &["ACNSN3DO3A"], element_id: 15, kind: FormatKind::Ambisonics { order: 3 } },
];

/// Everything the table fixes for one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    pub name: &'static str,
    pub element_id: u32,
    pub channel_count: u32,
    pub is_scene_based: bool,
    pub ambisonics_mode: u8,
    pub loudspeaker_layout: LoudspeakerLayout,
    pub sound_system: SoundSystem,
}

/// Session configs suited to a given output format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendedConfig {
    pub audio: AudioConfig,
    pub mix: MixConfig,
    pub element: ElementConfig,
}

/// `(order + 1)^2` channels for a full-sphere ambisonics stream.
pub fn ambisonics_channel_count(order: u32) -> u32 {
    (order + 1) * (order + 1)
}

impl FormatEntry {
    fn descriptor(&self) -> FormatDescriptor {
        let (channel_count, is_scene_based) = match self.kind {
            FormatKind::Channels(n) => (n, false),
            FormatKind::Ambisonics { order } => (ambisonics_channel_count(order), true),
        };
        FormatDescriptor {
            name: self.names[0],
            element_id: self.element_id,
            channel_count,
            is_scene_based,
            ambisonics_mode: if is_scene_based { AMBISONICS_MODE_PROJECTION } else { 0 },
            loudspeaker_layout: LoudspeakerLayout::for_channel_count(channel_count),
            sound_system: SoundSystem::for_channel_count(channel_count),
        }
    }
}

/// Full descriptor for a format name or alias.
pub fn lookup(format_name: &str) -> Result<FormatDescriptor> {
    FORMAT_TABLE
        .iter()
        .find(|entry| entry.names.contains(&format_name))
        .map(FormatEntry::descriptor)
        .ok_or_else(|| EncoderError::UnsupportedFormat(format_name.to_string()))
}

/// Resolve a format name into the element config of a session.
pub fn resolve(format_name: &str) -> Result<ElementConfig> {
    let desc = lookup(format_name)?;
    Ok(ElementConfig {
        element_id: desc.element_id,
        is_scene_based: desc.is_scene_based,
        ambisonics_mode: desc.ambisonics_mode,
        layer_count: 1,
        channels_per_layer: desc.channel_count,
        loudspeaker_layout: desc.loudspeaker_layout,
        sound_system: desc.sound_system,
    })
}

/// Channel count the source must deliver for `format_name`.
pub fn channel_count_for(format_name: &str) -> Result<u32> {
    lookup(format_name).map(|desc| desc.channel_count)
}

/// Canonical names of every supported format, in table order.
pub fn supported_formats() -> Vec<&'static str> {
    FORMAT_TABLE.iter().map(|entry| entry.names[0]).collect()
}

/// Descriptors of every supported format, in table order.
pub fn descriptors() -> Vec<FormatDescriptor> {
    FORMAT_TABLE.iter().map(FormatEntry::descriptor).collect()
}

/// 48 kHz, 16-bit, 10 ms frames, broadcast loudness defaults.
pub fn recommended_config(format_name: &str) -> Result<RecommendedConfig> {
    let element = resolve(format_name)?;
    Ok(RecommendedConfig {
        audio: AudioConfig {
            channel_count: element.channel_count(),
            ..AudioConfig::default()
        },
        mix: MixConfig::default(),
        element,
    })
}
