use crate::decode::{SampleBlock, SAMPLE_MAX, SAMPLE_MIN};
use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{Receiver, TryRecvError};
use std::collections::VecDeque;
use std::sync::Arc;

/// Diagnostics for the playback path, shared with whoever wants to display
/// them.
#[derive(Default)]
pub struct PlaybackStats {
    underruns: AtomicCell<u64>,
    starved: AtomicCell<bool>,
}

impl PlaybackStats {
    pub fn underruns(&self) -> u64 {
        self.underruns.load()
    }

    /// True while the producer side has gone away and the engine is emitting
    /// continuous silence.
    pub fn starved(&self) -> bool {
        self.starved.load()
    }
}

/// Pull-driven audio sink.
///
/// The audio subsystem calls [`render_block`](Self::render_block) on its own
/// cadence from a timing-critical path, so the engine never blocks: it takes
/// whatever its channel holds, smooths irregular block arrival through a
/// private accumulator, and substitutes silence when it runs dry.
pub struct PlaybackEngine {
    receiver: Receiver<SampleBlock>,
    accumulator: VecDeque<i32>,
    amplification: f64,
    stats: Arc<PlaybackStats>,
}

impl PlaybackEngine {
    pub fn new(receiver: Receiver<SampleBlock>, amplification: f64) -> Self {
        Self {
            receiver,
            accumulator: VecDeque::new(),
            amplification,
            stats: Default::default(),
        }
    }

    pub fn stats(&self) -> Arc<PlaybackStats> {
        self.stats.clone()
    }

    /// Fills `out` with the next samples, amplified and clamped.
    ///
    /// An underrun is not an error: the hardware must receive a full block
    /// either way, so the remainder is zero-filled and counted.
    pub fn render_block(&mut self, out: &mut [i32]) {
        self.drain_channel();

        let available = self.accumulator.len();

        if available < out.len() {
            self.stats.underruns.fetch_add(1);
            log::debug!(
                "playback underrun: {} of {} samples available",
                available,
                out.len()
            );

            for slot in out[..available].iter_mut() {
                *slot = self.next_sample();
            }
            out[available..].fill(0);
            self.accumulator.clear();
        } else {
            for slot in out.iter_mut() {
                *slot = self.next_sample();
            }
        }
    }

    fn drain_channel(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(block) => {
                    self.stats.starved.store(false);
                    self.accumulator.extend(block.iter().copied());
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.stats.starved.load() {
                        self.stats.starved.store(true);
                        log::warn!("playback input disconnected, rendering silence");
                    }
                    break;
                }
            }
        }
    }

    fn next_sample(&mut self) -> i32 {
        let sample = self.accumulator.pop_front().unwrap_or(0);
        amplify(sample, self.amplification)
    }
}

/// Gain stage: widen to f64 for the multiply, clamp to the 24-bit range,
/// then narrow back. Clamping before the narrowing is what keeps a hot
/// signal from wrapping negative.
pub fn amplify(sample: i32, factor: f64) -> i32 {
    let amplified = sample as f64 * factor;
    amplified.clamp(SAMPLE_MIN as f64, SAMPLE_MAX as f64) as i32
}
