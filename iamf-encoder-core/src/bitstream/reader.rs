//! Reading IAMF streams back: OBU iteration, descriptor decoding, and PCM
//! extraction for streams this crate writes.
//!
//! Expected OBU order:
//! ```text
//! sequence_header, codec_config, audio_element, mix_presentation, audio_frame*
//! ```

use std::fs;
use std::path::Path;

use serde::Serialize;

use super::fixed_point::q7_8_to_db;
use super::leb128::decode_uleb128;
use super::obu::ObuType;
use crate::models::error::{EncoderError, Result};

const EXTENSION_FLAG: u8 = 1;
const HAS_SIZE_FLAG: u8 = 1 << 1;

/// One OBU borrowed from a stream buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obu<'a> {
    pub obu_type: ObuType,
    pub header_byte: u8,
    /// Offset of the header byte within the stream.
    pub offset: usize,
    pub payload: &'a [u8],
}

impl Obu<'_> {
    /// Header, size field and payload.
    pub fn total_len(&self) -> usize {
        1 + super::leb128::uleb128_len(self.payload.len() as u64) + self.payload.len()
    }
}

/// Iterates over the OBUs of a byte buffer.
///
/// Stops after the first error.
pub struct ObuReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> ObuReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }

    fn next_obu(&mut self) -> Result<Obu<'a>> {
        let offset = self.pos;
        let header_byte = self.bytes[offset];
        if header_byte & EXTENSION_FLAG != 0 {
            return Err(EncoderError::MalformedStream(format!(
                "OBU at offset {} uses extension headers",
                offset
            )));
        }
        if header_byte & HAS_SIZE_FLAG == 0 {
            return Err(EncoderError::MalformedStream(format!(
                "OBU at offset {} has no size field",
                offset
            )));
        }

        let (size, size_len) = decode_uleb128(&self.bytes[offset + 1..])?;
        let start = offset + 1 + size_len;
        let remaining = (self.bytes.len() - start) as u64;
        if size > remaining {
            return Err(EncoderError::MalformedStream(format!(
                "OBU at offset {} declares {} payload bytes but {} remain",
                offset, size, remaining
            )));
        }
        let end = start + size as usize;
        self.pos = end;

        Ok(Obu {
            obu_type: ObuType::from_code(header_byte >> 3),
            header_byte,
            offset,
            payload: &self.bytes[start..end],
        })
    }
}

impl<'a> Iterator for ObuReader<'a> {
    type Item = Result<Obu<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        let result = self.next_obu();
        self.failed = result.is_err();
        Some(result)
    }
}

/// Sequential field reader over one OBU payload.
struct PayloadCursor<'a> {
    obu_type: ObuType,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PayloadCursor<'a> {
    fn new(obu: &Obu<'a>) -> Self {
        Self {
            obu_type: obu.obu_type,
            bytes: obu.payload,
            pos: 0,
        }
    }

    fn truncated(&self) -> EncoderError {
        EncoderError::MalformedStream(format!("truncated {} payload", self.obu_type.name()))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.bytes.len() - self.pos < len {
            return Err(self.truncated());
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn i16_le(&mut self) -> Result<i16> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn fourcc(&mut self) -> Result<[u8; 4]> {
        let bytes = self.take(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn leb(&mut self) -> Result<u64> {
        let (value, len) = decode_uleb128(&self.bytes[self.pos..]).map_err(|_| self.truncated())?;
        self.pos += len;
        Ok(value)
    }

    /// Skip a length-prefixed string.
    fn skip_string(&mut self) -> Result<()> {
        let len = self.leb()?;
        let len = usize::try_from(len).map_err(|_| self.truncated())?;
        self.take(len)?;
        Ok(())
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Descriptor contents and frame statistics of one stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamInfo {
    pub primary_profile: u8,
    pub additional_profile: u8,
    pub codec_fourcc: String,
    pub sample_size: u32,
    pub sample_rate: u32,
    pub element_id: u32,
    pub is_scene_based: bool,
    pub channel_count: u32,
    pub loudspeaker_layout: Option<u8>,
    pub ambisonics_mode: Option<u8>,
    pub presentation_id: u32,
    pub layout_type: u8,
    pub sound_system: Option<u8>,
    pub integrated_loudness_db: f32,
    pub digital_peak_db: f32,
    pub obu_count: u64,
    pub frame_count: u64,
    pub total_samples: u64,
    pub duration_secs: f64,
}

impl StreamInfo {
    /// Bytes occupied by one sample across all channels.
    pub fn block_align(&self) -> u64 {
        self.channel_count as u64 * (self.sample_size / 8) as u64
    }
}

/// A decoded stream: descriptors plus the concatenated PCM of every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStream {
    pub info: StreamInfo,
    pub pcm: Vec<u8>,
}

/// Parse a complete stream held in memory.
pub fn parse_stream(bytes: &[u8]) -> Result<ParsedStream> {
    parse(bytes, true)
}

/// Read and parse the stream at `path`, keeping the PCM.
pub fn read_file(path: &Path) -> Result<ParsedStream> {
    let bytes = fs::read(path)?;
    parse_stream(&bytes)
}

/// Read the stream at `path` and return only its description.
pub fn inspect_file(path: &Path) -> Result<StreamInfo> {
    let bytes = fs::read(path)?;
    Ok(parse(&bytes, false)?.info)
}

const DESCRIPTOR_ORDER: [ObuType; 4] = [
    ObuType::SequenceHeader,
    ObuType::CodecConfig,
    ObuType::AudioElement,
    ObuType::MixPresentation,
];

fn parse(bytes: &[u8], keep_pcm: bool) -> Result<ParsedStream> {
    let mut obus = ObuReader::new(bytes);

    let mut descriptors = Vec::with_capacity(DESCRIPTOR_ORDER.len());
    for expected in DESCRIPTOR_ORDER {
        let obu = obus
            .next()
            .ok_or_else(|| EncoderError::MalformedStream(format!("stream ends before {} OBU", expected.name())))??;
        if obu.obu_type != expected {
            return Err(EncoderError::MalformedStream(format!(
                "expected {} OBU at offset {}, found type {}",
                expected.name(),
                obu.offset,
                obu.obu_type.code()
            )));
        }
        descriptors.push(obu);
    }

    let mut info = StreamInfo {
        primary_profile: 0,
        additional_profile: 0,
        codec_fourcc: String::new(),
        sample_size: 0,
        sample_rate: 0,
        element_id: 0,
        is_scene_based: false,
        channel_count: 0,
        loudspeaker_layout: None,
        ambisonics_mode: None,
        presentation_id: 0,
        layout_type: 0,
        sound_system: None,
        integrated_loudness_db: 0.0,
        digital_peak_db: 0.0,
        obu_count: DESCRIPTOR_ORDER.len() as u64,
        frame_count: 0,
        total_samples: 0,
        duration_secs: 0.0,
    };
    read_sequence_header(&descriptors[0], &mut info)?;
    read_codec_config(&descriptors[1], &mut info)?;
    read_audio_element(&descriptors[2], &mut info)?;
    read_mix_presentation(&descriptors[3], &mut info)?;

    let block_align = info.block_align();

    let mut pcm = Vec::new();
    let mut pcm_bytes = 0u64;
    for obu in obus {
        let obu = obu?;
        info.obu_count += 1;
        if let ObuType::Other(code) = obu.obu_type {
            log::debug!("skipping OBU type {} at offset {}", code, obu.offset);
            continue;
        }
        if obu.obu_type != ObuType::AudioFrame {
            return Err(EncoderError::MalformedStream(format!(
                "unexpected {} OBU (type {}) at offset {}",
                obu.obu_type.name(),
                obu.obu_type.code(),
                obu.offset
            )));
        }
        let mut cursor = PayloadCursor::new(&obu);
        let _substream_id = cursor.leb()?;
        let frame_pcm = cursor.rest();
        if frame_pcm.is_empty() || frame_pcm.len() as u64 % block_align != 0 {
            return Err(EncoderError::MalformedStream(format!(
                "audio frame at offset {} carries {} bytes, not a whole number of {}-byte samples",
                obu.offset,
                frame_pcm.len(),
                block_align
            )));
        }
        if keep_pcm {
            pcm.extend_from_slice(frame_pcm);
        }
        pcm_bytes += frame_pcm.len() as u64;
        info.frame_count += 1;
    }

    info.total_samples = pcm_bytes / block_align;
    if info.sample_rate > 0 {
        info.duration_secs = info.total_samples as f64 / info.sample_rate as f64;
    }

    log::debug!(
        "parsed stream: {} OBUs, {} frames, {} samples",
        info.obu_count,
        info.frame_count,
        info.total_samples
    );

    Ok(ParsedStream { info, pcm })
}

fn read_sequence_header(obu: &Obu, info: &mut StreamInfo) -> Result<()> {
    let mut cursor = PayloadCursor::new(obu);
    let tag = cursor.fourcc()?;
    if &tag != b"iamf" {
        return Err(EncoderError::MalformedStream(format!(
            "bad sequence header tag {:?}",
            String::from_utf8_lossy(&tag)
        )));
    }
    info.primary_profile = cursor.u8()?;
    info.additional_profile = cursor.u8()?;
    Ok(())
}

fn read_codec_config(obu: &Obu, info: &mut StreamInfo) -> Result<()> {
    let mut cursor = PayloadCursor::new(obu);
    let _codec_config_id = cursor.leb()?;
    let fourcc = cursor.fourcc()?;
    info.codec_fourcc = String::from_utf8_lossy(&fourcc).into_owned();
    if &fourcc != b"ipcm" {
        return Err(EncoderError::MalformedStream(format!(
            "unsupported codec {:?}",
            info.codec_fourcc
        )));
    }
    let _samples_per_frame = cursor.leb()?;
    let _roll_distance = cursor.leb()?;
    let _sample_format = cursor.u8()?;
    info.sample_size = cursor.u8()? as u32;
    if ![16, 24, 32].contains(&info.sample_size) {
        return Err(EncoderError::MalformedStream(format!(
            "unsupported sample size: {} bits",
            info.sample_size
        )));
    }
    info.sample_rate = u32::try_from(cursor.leb()?)
        .map_err(|_| EncoderError::MalformedStream("sample rate exceeds 32 bits".into()))?;
    Ok(())
}

fn read_audio_element(obu: &Obu, info: &mut StreamInfo) -> Result<()> {
    let mut cursor = PayloadCursor::new(obu);
    info.element_id = u32::try_from(cursor.leb()?)
        .map_err(|_| EncoderError::MalformedStream("audio element id exceeds 32 bits".into()))?;
    info.is_scene_based = match cursor.u8()? {
        0 => false,
        1 => true,
        other => {
            return Err(EncoderError::MalformedStream(format!(
                "unknown audio element type {}",
                other
            )))
        }
    };
    let _reserved = cursor.u8()?;
    let _codec_config_id = cursor.leb()?;

    let substreams = cursor.leb()?;
    if substreams == 0 || substreams > u8::MAX as u64 {
        return Err(EncoderError::MalformedStream(format!(
            "unsupported substream count: {}",
            substreams
        )));
    }
    for _ in 0..substreams {
        cursor.leb()?;
    }
    info.channel_count = substreams as u32;

    let parameters = cursor.leb()?;
    if parameters != 0 {
        return Err(EncoderError::MalformedStream(format!(
            "audio element carries {} parameter definitions",
            parameters
        )));
    }

    if info.is_scene_based {
        info.ambisonics_mode = Some(cursor.u8()?);
    } else {
        let _num_layers = cursor.u8()?;
        let _reserved = cursor.u8()?;
        info.loudspeaker_layout = Some(cursor.u8()?);
    }
    Ok(())
}

fn read_mix_presentation(obu: &Obu, info: &mut StreamInfo) -> Result<()> {
    let mut cursor = PayloadCursor::new(obu);
    info.presentation_id = u32::try_from(cursor.leb()?)
        .map_err(|_| EncoderError::MalformedStream("mix presentation id exceeds 32 bits".into()))?;

    let labels = cursor.leb()?;
    for _ in 0..labels {
        cursor.skip_string()?; // language
    }
    for _ in 0..labels {
        cursor.skip_string()?; // annotation
    }

    let _sub_mixes = cursor.leb()?;
    let _elements = cursor.leb()?;
    let _element_id = cursor.leb()?;
    for _ in 0..labels {
        cursor.skip_string()?;
    }
    let _rendering_mode = cursor.u8()?;
    let _element_gain = cursor.leb()?;
    let _output_gain = cursor.leb()?;

    let _layouts = cursor.leb()?;
    info.layout_type = cursor.u8()?;
    if info.layout_type == 2 {
        info.sound_system = Some(cursor.u8()?);
    }
    let _reserved = cursor.u8()?;

    let _loudness_info_type = cursor.leb()?;
    info.integrated_loudness_db = q7_8_to_db(cursor.i16_le()?);
    info.digital_peak_db = q7_8_to_db(cursor.i16_le()?);
    Ok(())
}
