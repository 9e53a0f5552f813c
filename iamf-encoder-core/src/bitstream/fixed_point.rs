/// Q7.8 signed fixed point: a dB value scaled by 256 into an `i16`.
pub const Q7_8_SCALE: f32 = 256.0;

/// Convert dB to Q7.8, rounding to nearest and saturating at the `i16` range.
pub fn db_to_q7_8(db: f32) -> i16 {
    let scaled = (db * Q7_8_SCALE).round();
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Inverse of [`db_to_q7_8`], exact for every `i16`.
pub fn q7_8_to_db(value: i16) -> f32 {
    value as f32 / Q7_8_SCALE
}
