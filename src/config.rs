use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use std::{fs::File, io::Read};

/// Stream parameters with the defaults the capture firmware uses.
///
/// Everything that used to be a hard constant in the capture scripts lives
/// here so a different firmware build (marker, payload size, rate) only needs
/// a config file, not a recompile.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct StreamConfig {
    /// Start-of-frame marker preceding every payload.
    pub marker: [u8; 2],
    /// Payload bytes per frame, marker excluded.
    pub payload_size: usize,
    pub sample_rate: u32,
    pub channels: u16,
    pub link_timeout_ms: u64,
    /// Capacity of the frame queue between the reader and processor roles.
    pub ingress_capacity: usize,
    /// Capacity of each consumer tap, in sample blocks.
    pub tap_capacity: usize,
    pub amplification: f64,
    /// Samples retained by the scope's rolling window.
    pub scope_window: usize,
}

impl StreamConfig {
    const FILE_NAME: &str = "tickstream.ron";

    pub fn restore() -> Option<Self> {
        File::open(Self::FILE_NAME)
            .ok()
            .and_then(|mut file| {
                let mut contents = String::new();
                file.read_to_string(&mut contents).map(|_| contents).ok()
            })
            .and_then(|content| ron::from_str(&content).ok())
    }

    pub fn save(&self) {
        match ron::to_string(self) {
            Ok(result) => {
                File::create(Self::FILE_NAME)
                    .ok()
                    .and_then(|mut f| write!(f, "{}", result).ok());
            }
            Err(err) => log::error!("Config save failed: {:?}", err),
        }
    }

    pub fn link_timeout(&self) -> Duration {
        Duration::from_millis(self.link_timeout_ms)
    }

    /// Samples carried by one full frame.
    pub fn samples_per_frame(&self) -> usize {
        self.payload_size / crate::decode::SAMPLE_WIDTH
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            marker: [0xAA, 0x55],
            payload_size: 512,
            sample_rate: 32000,
            channels: 1,
            link_timeout_ms: 1000,
            ingress_capacity: 100,
            tap_capacity: 100,
            amplification: 5.,
            scope_window: 8000,
        }
    }
}
