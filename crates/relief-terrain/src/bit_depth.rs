//! 8-bit to 16-bit sample expansion
//!
//! `value16 = value8 * 257` maps 0 to 0 and 255 to 65535 exactly, so the
//! expansion is lossless and needs no rounding.

/// Scale between the 8-bit and 16-bit sample ranges (65535 / 255)
pub const EXPAND_SCALE: u16 = 257;

/// Expand 8-bit samples into 16-bit samples
pub fn expand_samples(buffer8: &[u8]) -> Vec<u16> {
    buffer8.iter().map(|&v| v as u16 * EXPAND_SCALE).collect()
}

/// Expand an 8-bit sample buffer into a 16-bit little-endian byte buffer
/// twice its length.
pub fn expand_8_to_16(buffer8: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buffer8.len() * 2);
    for &v in buffer8 {
        out.extend_from_slice(&(v as u16 * EXPAND_SCALE).to_le_bytes());
    }
    out
}
