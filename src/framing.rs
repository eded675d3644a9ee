use crate::link::{ByteLink, LinkError};
use thiserror::Error;

/// A payload extracted from the stream. Always exactly the configured
/// payload size; short reads surface as [`SyncError::FrameCorrupt`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum SyncError {
    /// The link went quiet while seeking the marker. Fatal to the current
    /// synchronization attempt; the caller decides whether to restart.
    #[error("link timed out while seeking the frame marker")]
    LinkTimeout,

    /// The payload read came up short. Recoverable; synchronization resumes
    /// at the next marker. Carries whatever bytes did arrive.
    #[error("short payload read ({} of {expected} bytes)", .partial.len())]
    FrameCorrupt { partial: Vec<u8>, expected: usize },

    #[error(transparent)]
    Link(LinkError),
}

/// Decides whether a fully read payload counts as a valid frame.
///
/// The wire protocol has no length or checksum field, so the stock rule can
/// only check the byte count. A firmware revision that adds a trailer can
/// swap in a stronger policy without touching the synchronizer.
pub trait FramePolicy: Send {
    fn validate(&self, payload: &[u8]) -> bool;
}

/// Stock policy: exactly the expected number of bytes arrived.
pub struct ExactLength(pub usize);

impl FramePolicy for ExactLength {
    fn validate(&self, payload: &[u8]) -> bool {
        payload.len() == self.0
    }
}

/// Scans a [`ByteLink`] for marker-delimited frames.
///
/// Re-seeks the marker before every frame rather than assuming alignment
/// holds after the first lock, so dropped bytes mid-stream cost at most one
/// frame.
pub struct FrameSync<L> {
    link: L,
    marker: [u8; 2],
    payload_size: usize,
    policy: Box<dyn FramePolicy>,
}

impl<L: ByteLink> FrameSync<L> {
    pub fn new(link: L, marker: [u8; 2], payload_size: usize) -> Self {
        Self {
            link,
            marker,
            payload_size,
            policy: Box::new(ExactLength(payload_size)),
        }
    }

    pub fn with_policy(mut self, policy: impl FramePolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Blocks until the next frame, a corrupt read, or a link timeout.
    pub fn next_frame(&mut self) -> Result<Frame, SyncError> {
        self.seek_marker()?;
        self.read_payload()
    }

    /// One-byte sliding window over the stream until it matches the marker.
    /// A match only counts once two real bytes fill the window, so a marker
    /// that happens to contain the window's initial zeros cannot lock early.
    fn seek_marker(&mut self) -> Result<(), SyncError> {
        let mut window = [0u8; 2];
        let mut byte = [0u8; 1];
        let mut seen = 0usize;

        loop {
            match self.link.read(&mut byte) {
                Ok(_) => {}
                Err(LinkError::Timeout) => return Err(SyncError::LinkTimeout),
                Err(err) => return Err(SyncError::Link(err)),
            }

            window[0] = window[1];
            window[1] = byte[0];
            if seen < 2 {
                seen += 1;
            }

            if seen == 2 && window == self.marker {
                return Ok(());
            }
        }
    }

    fn read_payload(&mut self) -> Result<Frame, SyncError> {
        let mut payload = vec![0u8; self.payload_size];

        let filled = match self.link.read(&mut payload) {
            Ok(n) => n,
            Err(LinkError::Timeout) => 0,
            Err(err) => return Err(SyncError::Link(err)),
        };

        payload.truncate(filled);

        if !self.policy.validate(&payload) {
            return Err(SyncError::FrameCorrupt {
                partial: payload,
                expected: self.payload_size,
            });
        }

        Ok(Frame { payload })
    }
}
