use crate::link::{ByteLink, LinkError};
use crossbeam::atomic::AtomicCell;
use std::io::Write;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("link failed: {0}")]
    Link(LinkError),
}

const CHUNK_SIZE: usize = 4096;

/// Records the raw link verbatim for the offline alignment path.
///
/// No framing, no correction: whatever the link produces lands in `out`,
/// which makes the capture file the system of record the live consumers are
/// allowed to drop samples against. Timeouts are treated as gaps in the
/// stream, not failures; recording ends when the duration elapses or the
/// shutdown flag flips.
pub fn capture<L: ByteLink, W: Write>(
    link: &mut L,
    out: &mut W,
    duration: Duration,
    shutdown: &AtomicCell<bool>,
) -> Result<u64, CaptureError> {
    let start = Instant::now();
    let mut last_report = start;
    let mut total: u64 = 0;
    let mut buf = [0u8; CHUNK_SIZE];

    while start.elapsed() < duration && !shutdown.load() {
        match link.read(&mut buf) {
            Ok(n) => {
                out.write_all(&buf[..n])?;
                total += n as u64;
            }
            Err(LinkError::Timeout) => continue,
            Err(err) => return Err(CaptureError::Link(err)),
        }

        if last_report.elapsed() > Duration::from_secs(1) {
            let progress = start.elapsed().as_secs_f64() / duration.as_secs_f64() * 100.;
            log::info!("capture progress: {:.1}%, {} bytes", progress, total);
            last_report = Instant::now();
        }
    }

    out.flush()?;
    log::info!("capture complete: {} bytes", total);

    Ok(total)
}
