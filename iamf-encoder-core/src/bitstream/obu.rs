//! OBU framing: one header byte, a LEB128 payload size, then the payload.
//!
//! Header byte layout:
//! ```text
//! bit  7..3  obu_type
//! bit  2     redundant copy (always 0)
//! bit  1     has_size / trimming flag (always 1, size field present)
//! bit  0     extension flag (always 0)
//! ```

use std::io::Write;

use serde::Serialize;

use super::leb128;
use crate::models::error::{EncoderError, Result};

const HAS_SIZE_FLAG: u8 = 1 << 1;

/// OBU type codes. The numbering is fixed by the container registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObuType {
    CodecConfig,
    AudioElement,
    MixPresentation,
    AudioFrame,
    SequenceHeader,
    /// Any code this encoder never emits; surfaced by the reader.
    Other(u8),
}

impl ObuType {
    pub fn code(self) -> u8 {
        match self {
            Self::CodecConfig => 0,
            Self::AudioElement => 1,
            Self::MixPresentation => 2,
            Self::AudioFrame => 5,
            Self::SequenceHeader => 31,
            Self::Other(code) => code & 0x1F,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::CodecConfig,
            1 => Self::AudioElement,
            2 => Self::MixPresentation,
            5 => Self::AudioFrame,
            31 => Self::SequenceHeader,
            other => Self::Other(other),
        }
    }

    /// `(type << 3) | has_size`; extension and redundant-copy bits stay clear.
    pub fn header_byte(self) -> u8 {
        (self.code() << 3) | HAS_SIZE_FLAG
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CodecConfig => "codec_config",
            Self::AudioElement => "audio_element",
            Self::MixPresentation => "mix_presentation",
            Self::AudioFrame => "audio_frame",
            Self::SequenceHeader => "sequence_header",
            Self::Other(_) => "other",
        }
    }
}

/// Serialize a complete OBU into a single buffer.
pub fn frame_obu(obu_type: ObuType, payload: &[u8]) -> Result<Vec<u8>> {
    frame_obu_parts(obu_type, &[payload])
}

/// Serialize an OBU whose payload is the concatenation of `parts`.
///
/// Each part is copied once, straight into a buffer reserved up front without
/// aborting on failure, since audio frame payloads are caller-sized.
pub fn frame_obu_parts(obu_type: ObuType, parts: &[&[u8]]) -> Result<Vec<u8>> {
    let payload_len: usize = parts.iter().map(|part| part.len()).sum();
    let size = payload_len as u64;
    let total = 1 + leb128::uleb128_len(size) + payload_len;

    let mut obu = Vec::new();
    obu.try_reserve_exact(total).map_err(|e| {
        EncoderError::AllocationFailure(format!("{} OBU of {} bytes: {}", obu_type.name(), total, e))
    })?;

    obu.push(obu_type.header_byte());
    leb128::write_uleb128(&mut obu, size);
    for part in parts {
        obu.extend_from_slice(part);
    }
    Ok(obu)
}

/// Write one OBU to `sink` as a single `write_all`.
///
/// Returns the number of bytes written. On failure nothing should be assumed
/// about how much of the OBU reached the sink.
pub fn emit<W: Write>(sink: &mut W, obu_type: ObuType, payload: &[u8]) -> Result<usize> {
    emit_parts(sink, obu_type, &[payload])
}

/// [`emit`] for a payload split across several slices.
pub fn emit_parts<W: Write>(sink: &mut W, obu_type: ObuType, parts: &[&[u8]]) -> Result<usize> {
    let obu = frame_obu_parts(obu_type, parts)?;
    sink.write_all(&obu)
        .map_err(|e| EncoderError::Io(format!("failed to write {} OBU: {}", obu_type.name(), e)))?;
    log::debug!(
        "wrote {} OBU (type {}, {} bytes)",
        obu_type.name(),
        obu_type.code(),
        obu.len()
    );
    Ok(obu.len())
}
