//! Integer PCM helpers.

use crate::models::error::{EncoderError, Result};

/// Convert f32 samples `[-1.0, 1.0]` to little-endian integer PCM.
///
/// Clamps out-of-range values. Output length = `samples.len() * bit_depth / 8`.
pub fn f32_to_pcm(samples: &[f32], bit_depth: u32) -> Result<Vec<u8>> {
    let bytes_per_sample = match bit_depth {
        16 | 24 | 32 => (bit_depth / 8) as usize,
        other => return Err(EncoderError::InvalidArgument(format!("unsupported bit depth: {}", other))),
    };

    let mut data = Vec::with_capacity(samples.len() * bytes_per_sample);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0) as f64;
        match bit_depth {
            16 => data.extend_from_slice(&((clamped * i16::MAX as f64) as i16).to_le_bytes()),
            24 => {
                let value = (clamped * 8_388_607.0) as i32;
                data.extend_from_slice(&value.to_le_bytes()[..3]);
            }
            _ => data.extend_from_slice(&((clamped * i32::MAX as f64) as i32).to_le_bytes()),
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_16_bit() {
        let pcm = f32_to_pcm(&[0.0, 1.0, -1.0, 0.5], 16).unwrap();
        assert_eq!(pcm.len(), 8);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 0);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), i16::MAX);
        // -1.0 → -32767 (not -32768 due to symmetric scaling)
        assert_eq!(i16::from_le_bytes([pcm[4], pcm[5]]), -i16::MAX);
    }

    #[test]
    fn converts_to_24_bit_little_endian() {
        let pcm = f32_to_pcm(&[1.0, -1.0], 24).unwrap();
        assert_eq!(pcm, vec![0xFF, 0xFF, 0x7F, 0x01, 0x00, 0x80]);
    }

    #[test]
    fn converts_to_32_bit() {
        let pcm = f32_to_pcm(&[1.0], 32).unwrap();
        assert_eq!(i32::from_le_bytes([pcm[0], pcm[1], pcm[2], pcm[3]]), i32::MAX);
    }

    #[test]
    fn clamps_out_of_range() {
        let pcm = f32_to_pcm(&[2.0, -3.0], 16).unwrap();
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), -i16::MAX);
    }

    #[test]
    fn rejects_8_bit() {
        assert!(f32_to_pcm(&[0.0], 8).is_err());
    }
}
