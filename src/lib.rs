//! Real-time serial audio pipeline for a timegrapher microphone.
//!
//! A microcontroller streams framed 24-bit samples over a serial link; this
//! crate synchronizes on the frames, corrects the mis-packed samples, and
//! fans the stream out to live playback and a waveform scope without ever
//! letting a slow consumer stall capture. The [`align`] module is the
//! offline companion that recovers sample alignment from an unframed raw
//! capture.

pub mod align;
pub mod capture;
pub mod config;
pub mod decode;
pub mod fanout;
pub mod framing;
pub mod link;
pub mod playback;
pub mod scope;
pub mod system;

pub use config::StreamConfig;
pub use decode::SampleBlock;
