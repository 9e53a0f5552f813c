//! Payload layouts of the OBUs the encoder emits.
//!
//! Each builder returns the exact payload bytes; the framer derives the size
//! field from the returned length.

use crate::bitstream::fixed_point::db_to_q7_8;
use crate::bitstream::leb128::{encode_uleb128, write_uleb128};
use crate::layout::codes::LayoutType;
use crate::models::config::{AudioConfig, ElementConfig, MixConfig};

/// Container format tag carried by the sequence header.
pub const IAMF_TAG: [u8; 4] = *b"iamf";

/// Codec fourcc for uncompressed little-endian integer PCM.
pub const IPCM_FOURCC: [u8; 4] = *b"ipcm";

/// Simple profile, used for both primary and additional profile.
pub const PROFILE_SIMPLE: u8 = 0;

pub const CODEC_CONFIG_ID: u64 = 0;

/// Substream id written at the head of every audio frame.
pub const FRAME_SUBSTREAM_ID: u64 = 0;

pub const SAMPLE_FORMAT_LITTLE_ENDIAN: u8 = 1;

const ELEMENT_TYPE_CHANNEL_BASED: u8 = 0;
const ELEMENT_TYPE_SCENE_BASED: u8 = 1;
const RENDERING_MODE_DEFAULT: u8 = 0;
const LOUDNESS_INFO_TYPE_NONE: u64 = 0;

/// `"iamf"` tag followed by the primary and additional profile.
pub fn sequence_header() -> Vec<u8> {
    let mut payload = Vec::with_capacity(6);
    payload.extend_from_slice(&IAMF_TAG);
    payload.push(PROFILE_SIMPLE); // primary profile
    payload.push(PROFILE_SIMPLE); // additional profile
    payload
}

/// Codec config for uncompressed PCM at the session's sample size and rate.
pub fn codec_config(audio: &AudioConfig) -> Vec<u8> {
    let mut payload = Vec::with_capacity(16);
    write_uleb128(&mut payload, CODEC_CONFIG_ID);
    payload.extend_from_slice(&IPCM_FOURCC);
    write_uleb128(&mut payload, 0); // num_samples_per_frame: variable
    write_uleb128(&mut payload, 0); // audio_roll_distance
    payload.push(SAMPLE_FORMAT_LITTLE_ENDIAN);
    payload.push(audio.bit_depth as u8);
    write_uleb128(&mut payload, audio.sample_rate as u64);
    payload.push(0); // reserved
    payload
}

/// Audio element with one substream per channel and no parameters.
///
/// Channel-based elements end in a single scalable layer; scene-based ones
/// in an ambisonics block.
pub fn audio_element(element: &ElementConfig, audio: &AudioConfig) -> Vec<u8> {
    let channels = audio.channel_count;
    let mut payload = Vec::with_capacity(16 + channels as usize);

    write_uleb128(&mut payload, element.element_id as u64);
    payload.push(if element.is_scene_based {
        ELEMENT_TYPE_SCENE_BASED
    } else {
        ELEMENT_TYPE_CHANNEL_BASED
    });
    payload.push(0); // reserved
    write_uleb128(&mut payload, CODEC_CONFIG_ID);

    write_uleb128(&mut payload, channels as u64);
    for substream_id in 0..channels {
        write_uleb128(&mut payload, substream_id as u64);
    }
    write_uleb128(&mut payload, 0); // num_parameters

    if element.is_scene_based {
        payload.push(element.ambisonics_mode);
        write_uleb128(&mut payload, channels as u64); // output_channel_count
        payload.push(channels as u8); // substream_count
        payload.push(0); // coupled_substream_count
    } else {
        payload.extend_from_slice(&[
            1, // num_layers
            0, // reserved
            element.loudspeaker_layout.code(),
            0, // output_gain_present
            0, // recon_gain_present
            0, // reserved
            channels as u8,
            0, // coupled_substream_count
        ]);
    }
    payload
}

/// Mix presentation with one sub-mix, one element and one layout, followed
/// by Q7.8 integrated loudness and digital peak.
pub fn mix_presentation(mix: &MixConfig, element: &ElementConfig) -> Vec<u8> {
    let mut payload = Vec::with_capacity(32);

    write_uleb128(&mut payload, mix.presentation_id as u64);
    write_uleb128(&mut payload, 1); // count_label
    write_uleb128(&mut payload, 0); // language label length
    write_uleb128(&mut payload, 0); // annotation count

    write_uleb128(&mut payload, 1); // num_sub_mixes
    write_uleb128(&mut payload, 1); // num_audio_elements
    write_uleb128(&mut payload, element.element_id as u64);
    write_uleb128(&mut payload, 0); // element annotation count
    payload.push(RENDERING_MODE_DEFAULT);
    write_uleb128(&mut payload, 0); // element_mix_gain_present
    write_uleb128(&mut payload, 0); // output_mix_gain_present

    write_uleb128(&mut payload, 1); // num_layouts
    let layout_type = LayoutType::for_element(element.is_scene_based);
    payload.push(layout_type.code());
    if layout_type == LayoutType::LoudspeakersSsConvention {
        payload.push(element.sound_system.code());
    }
    payload.push(0); // reserved

    write_uleb128(&mut payload, LOUDNESS_INFO_TYPE_NONE);
    payload.extend_from_slice(&db_to_q7_8(mix.integrated_loudness_db).to_le_bytes());
    payload.extend_from_slice(&db_to_q7_8(mix.peak_threshold_db).to_le_bytes());
    payload
}

/// Bytes that precede the PCM in an audio frame payload: the substream id.
///
/// The PCM itself is appended by the framer so it is copied only once.
pub fn audio_frame_prefix() -> Vec<u8> {
    encode_uleb128(FRAME_SUBSTREAM_ID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::format_table::resolve;

    fn stereo() -> (AudioConfig, ElementConfig) {
        (AudioConfig::default(), resolve("stereo").unwrap())
    }

    #[test]
    fn sequence_header_layout() {
        assert_eq!(sequence_header(), b"iamf\x00\x00".to_vec());
    }

    #[test]
    fn codec_config_layout() {
        let (audio, _) = stereo();
        let payload = codec_config(&audio);
        // 48000 = 0x80 0xF7 0x02 as leb128
        assert_eq!(
            payload,
            vec![0x00, b'i', b'p', b'c', b'm', 0x00, 0x00, 0x01, 16, 0x80, 0xF7, 0x02, 0x00]
        );
    }

    #[test]
    fn channel_based_element_layout() {
        let (audio, element) = stereo();
        let payload = audio_element(&element, &audio);
        assert_eq!(
            payload,
            vec![
                7, 0, 0, 0, // id, type, reserved, codec config id
                2, 0, 1, // substreams
                0, // num_parameters
                1, 0, 1, 0, 0, 0, 2, 0, // scalable layout
            ]
        );
    }

    #[test]
    fn scene_based_element_layout() {
        let element = resolve("ACNSN3D").unwrap();
        let audio = AudioConfig {
            channel_count: 4,
            ..Default::default()
        };
        let payload = audio_element(&element, &audio);
        assert_eq!(
            payload,
            vec![
                13, 1, 0, 0, // id, type, reserved, codec config id
                4, 0, 1, 2, 3, // substreams
                0, // num_parameters
                1, 4, 4, 0, // ambisonics block
            ]
        );
    }

    #[test]
    fn mix_presentation_loudspeaker_layout() {
        let (_, element) = stereo();
        let payload = mix_presentation(&MixConfig::default(), &element);
        assert_eq!(
            payload,
            vec![
                1, 1, 0, 0, // id, count_label, language, annotations
                1, 1, 7, 0, // sub mixes, elements, element id, annotations
                0, 0, 0, // rendering mode, gains
                1, 2, 0, 0, // layouts, layout type, sound system, reserved
                0, // loudness info type
                0x00, 0xE9, // -23.0 dB
                0x00, 0xFF, // -1.0 dB
            ]
        );
    }

    #[test]
    fn mix_presentation_binaural_has_no_sound_system() {
        let element = resolve("ACNSN3DO2A").unwrap();
        let (_, stereo_element) = stereo();
        let scene = mix_presentation(&MixConfig::default(), &element);
        let speakers = mix_presentation(&MixConfig::default(), &stereo_element);
        assert_eq!(scene.len() + 1, speakers.len());
        assert_eq!(scene[12], 3);
    }

    #[test]
    fn audio_frame_prefix_is_substream_id() {
        assert_eq!(audio_frame_prefix(), vec![0]);
    }
}
