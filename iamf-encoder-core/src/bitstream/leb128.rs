//! Unsigned LEB128 variable-length integers, as used for every size and
//! count field in the container.

use crate::models::error::{EncoderError, Result};

/// Longest possible encoding of a `u64`.
pub const MAX_LEB128_LEN: usize = 10;

/// Encode `value` into a fresh buffer (1 to 10 bytes).
pub fn encode_uleb128(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(uleb128_len(value));
    write_uleb128(&mut out, value);
    out
}

/// Append the encoding of `value` to `out`.
pub fn write_uleb128(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Number of bytes `value` occupies once encoded.
pub fn uleb128_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Decode a ULEB128 value from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_uleb128(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in bytes.iter().take(MAX_LEB128_LEN).enumerate() {
        let low = (byte & 0x7F) as u64;
        let shift = 7 * i as u32;
        if i == MAX_LEB128_LEN - 1 && low > 1 {
            return Err(EncoderError::MalformedStream("leb128 value overflows u64".into()));
        }
        value |= low << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if bytes.len() >= MAX_LEB128_LEN {
        Err(EncoderError::MalformedStream("leb128 value longer than 10 bytes".into()))
    } else {
        Err(EncoderError::MalformedStream("truncated leb128 value".into()))
    }
}
