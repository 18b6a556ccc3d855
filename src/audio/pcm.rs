//! PCM sample conversion helpers shared by capture and playback.

/// Quantize float samples in [-1.0, 1.0] to 16-bit signed PCM.
///
/// `round(sample * 32768)` clamped to the i16 range: a sample at exactly
/// 1.0 would otherwise compute 32768 and wrap to -32768.
pub fn quantize(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Root-mean-square amplitude of a float sample block, as a 0..1 level for
/// UI volume feedback. An empty block has level 0.
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|&s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Serialize i16 samples as little-endian bytes for the wire.
pub fn encode_pcm16(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Parse little-endian PCM16 bytes back into samples. A trailing odd byte
/// is ignored.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
