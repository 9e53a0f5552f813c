use serde::{Deserialize, Serialize};

use crate::layout::codes::{LoudspeakerLayout, SoundSystem};

/// Sample format of the PCM carried in audio frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 48000).
    pub sample_rate: u32,

    /// Number of interleaved channels per frame (default: 2).
    pub channel_count: u32,

    /// Bits per sample. Valid values: 16, 24, 32.
    pub bit_depth: u32,

    /// Nominal frame duration used when chunking a source (default: 10 ms).
    pub frame_duration_ms: u32,
}

impl AudioConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![16, 24, 32].contains(&self.bit_depth) {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if self.channel_count == 0 || self.channel_count > u8::MAX as u32 {
            return Err(format!("unsupported channel count: {}", self.channel_count));
        }
        if self.frame_duration_ms == 0 {
            return Err("frame duration must be positive".into());
        }
        Ok(())
    }

    pub fn bytes_per_sample(&self) -> u32 {
        self.bit_depth / 8
    }

    /// Bytes occupied by one sample across all channels.
    pub fn block_align(&self) -> u32 {
        self.channel_count * self.bytes_per_sample()
    }

    /// Samples per channel in one nominal frame.
    pub fn samples_per_frame(&self) -> u32 {
        (self.sample_rate as u64 * self.frame_duration_ms as u64 / 1000) as u32
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channel_count: 2,
            bit_depth: 16,
            frame_duration_ms: 10,
        }
    }
}

/// Mix presentation parameters: one presentation, one sub-mix, one layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixConfig {
    pub presentation_id: u32,

    /// Integrated loudness in dB (LUFS), written as Q7.8.
    pub integrated_loudness_db: f32,

    /// Digital peak in dB, written as Q7.8.
    pub peak_threshold_db: f32,

    pub limiter_enabled: bool,
}

impl MixConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.integrated_loudness_db.is_finite() {
            return Err("integrated loudness must be finite".into());
        }
        if !self.peak_threshold_db.is_finite() {
            return Err("peak threshold must be finite".into());
        }
        Ok(())
    }
}

impl Default for MixConfig {
    fn default() -> Self {
        // EBU R128 broadcast target.
        Self {
            presentation_id: 1,
            integrated_loudness_db: -23.0,
            peak_threshold_db: -1.0,
            limiter_enabled: true,
        }
    }
}

/// The single audio element of a session, as produced by
/// [`format_table::resolve`](crate::layout::format_table::resolve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementConfig {
    pub element_id: u32,
    pub is_scene_based: bool,

    /// 0 = mono, 1 = projection. Always 0 for channel-based elements.
    pub ambisonics_mode: u8,

    pub layer_count: u32,
    pub channels_per_layer: u32,

    pub loudspeaker_layout: LoudspeakerLayout,
    pub sound_system: SoundSystem,
}

impl ElementConfig {
    pub fn channel_count(&self) -> u32 {
        self.layer_count * self.channels_per_layer
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.layer_count != 1 {
            return Err(format!(
                "only single-layer elements are supported, got {} layers",
                self.layer_count
            ));
        }
        if self.channels_per_layer == 0 {
            return Err("element must carry at least one channel".into());
        }
        if self.is_scene_based && self.ambisonics_mode > 1 {
            return Err(format!("unsupported ambisonics mode: {}", self.ambisonics_mode));
        }
        if !self.is_scene_based && self.ambisonics_mode != 0 {
            return Err("channel-based elements must use ambisonics mode 0".into());
        }
        Ok(())
    }
}
