use std::sync::Arc;

/// A decoded, corrected frame's worth of samples. Immutable once built so
/// fan-out can hand the same allocation to every consumer.
pub type SampleBlock = Arc<[i32]>;

/// Bytes per sample container on the wire.
pub const SAMPLE_WIDTH: usize = 4;

/// Largest value the microphone can produce: 24-bit signed, top of range.
pub const SAMPLE_MAX: i32 = (1 << 23) - 1;
/// Smallest value the microphone can produce.
pub const SAMPLE_MIN: i32 = -(1 << 23);

/// Reinterprets a payload as little-endian 32-bit containers.
///
/// Trailing bytes that do not fill a container are ignored; framed payloads
/// are always a multiple of four so nothing is lost on that path.
pub fn decode_payload(payload: &[u8]) -> Vec<i32> {
    payload
        .chunks_exact(SAMPLE_WIDTH)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Discards the garbage top byte and sign-extends from bit 23.
///
/// The firmware ships 24-bit samples inside 32-bit slots without zeroing or
/// sign-extending the top byte, so it must be thrown away here: shift the low
/// 24 bits up, then arithmetic-shift back down to replicate the sign bit.
pub fn correct(raw: i32) -> i32 {
    raw.wrapping_shl(8) >> 8
}

pub fn correct_block(raw: Vec<i32>) -> Vec<i32> {
    raw.into_iter().map(correct).collect()
}

/// Full per-frame path: decode the payload and correct every sample.
pub fn decode_frame(payload: &[u8]) -> SampleBlock {
    correct_block(decode_payload(payload)).into()
}
