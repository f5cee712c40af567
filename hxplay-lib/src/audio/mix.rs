//! Canonical PCM mixing.

use super::stream::PCM_SAMPLE_BYTES;

/// Clamp a gain value into `[0, 1]`. Non-finite values mute.
pub fn clamp_gain(gain: f32) -> f32 {
    if gain.is_finite() {
        gain.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Mix `src` into `dst` as signed 16-bit little-endian samples.
///
/// Each source sample is scaled by the clamped `gain` and added to the
/// destination with saturation. A trailing odd byte is left untouched.
pub fn mix_s16le(dst: &mut [u8], src: &[u8], gain: f32) {
    let gain = clamp_gain(gain);
    for (out, input) in dst
        .chunks_exact_mut(PCM_SAMPLE_BYTES)
        .zip(src.chunks_exact(PCM_SAMPLE_BYTES))
    {
        let current = i16::from_le_bytes([out[0], out[1]]) as f32;
        let sample = i16::from_le_bytes([input[0], input[1]]) as f32 * gain;
        let mixed = (current + sample).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        out.copy_from_slice(&mixed.to_le_bytes());
    }
}

/// Convert one canonical PCM sample to `f32` in `[-1, 1)`.
pub fn s16le_to_f32(bytes: [u8; 2]) -> f32 {
    i16::from_le_bytes(bytes) as f32 / 2f32.powi(15)
}
