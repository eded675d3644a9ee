use crate::decode::{correct_block, decode_payload};
use std::path::Path;
use thiserror::Error;

/// How close the best and runner-up offset energies may be before the result
/// is considered too close to call.
pub const DEFAULT_AMBIGUITY_RATIO: f64 = 0.95;

#[derive(Error, Debug)]
pub enum AlignError {
    #[error("capture holds no complete sample at any offset")]
    EmptyCapture,

    /// The candidate energies are comparable, so picking the minimum would be
    /// a guess. Surfaced instead of silently choosing; the caller may still
    /// force the pick.
    #[error("alignment is ambiguous, offset energies too close to call: {energies:?}")]
    Ambiguous { energies: [u128; 4] },

    #[error("wav output failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Outcome of a successful alignment search.
#[derive(Debug)]
pub struct Recovered {
    /// Winning byte offset into the capture.
    pub offset: usize,
    /// Corrected samples decoded at that offset.
    pub samples: Vec<i32>,
    /// Energy per candidate offset, for diagnostics.
    pub energies: [u128; 4],
}

/// Decodes and corrects the capture as if sample boundaries start at
/// `offset`. Trailing bytes short of a full container are dropped.
pub fn decode_at(raw: &[u8], offset: usize) -> Vec<i32> {
    let sliced = &raw[offset.min(raw.len())..];
    correct_block(decode_payload(sliced))
}

/// Sum of absolute sample magnitudes, the alignment score.
fn energy(samples: &[i32]) -> u128 {
    samples.iter().map(|&s| s.unsigned_abs() as u128).sum()
}

/// Brute-forces the byte offset of an unframed capture.
///
/// A correctly aligned 24-bit-in-32-bit signal has bounded magnitude while
/// any misaligned reinterpretation of the same bytes reads as loud noise, so
/// the minimum-energy offset is taken as the true alignment. This is a
/// heuristic: a capture that is silent at every offset, or a true signal
/// louder than its misaligned readings, can defeat it, which is why
/// comparable energies come back as [`AlignError::Ambiguous`] instead of a
/// silent pick.
pub fn recover(raw: &[u8], ambiguity_ratio: f64) -> Result<Recovered, AlignError> {
    let mut energies = [u128::MAX; 4];
    let mut best: Option<usize> = None;

    for offset in 0..4 {
        let samples = decode_at(raw, offset);
        if samples.is_empty() {
            continue;
        }

        energies[offset] = energy(&samples);
        log::info!("offset {}: energy {}", offset, energies[offset]);

        if best.map_or(true, |b| energies[offset] < energies[b]) {
            best = Some(offset);
        }
    }

    let offset = best.ok_or(AlignError::EmptyCapture)?;

    let runner_up = energies
        .iter()
        .enumerate()
        .filter(|&(o, &e)| o != offset && e != u128::MAX)
        .map(|(_, &e)| e)
        .min();

    if let Some(runner_up) = runner_up {
        let comparable =
            runner_up == 0 || energies[offset] as f64 / runner_up as f64 > ambiguity_ratio;

        if comparable {
            return Err(AlignError::Ambiguous { energies });
        }
    }

    Ok(Recovered {
        offset,
        samples: decode_at(raw, offset),
        energies,
    })
}

/// Serializes recovered samples into a little-endian 32-bit PCM WAV.
pub fn write_wav(
    path: &Path,
    samples: &[i32],
    sample_rate: u32,
    channels: u16,
) -> Result<(), AlignError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}
