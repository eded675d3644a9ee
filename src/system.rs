use crate::config::StreamConfig;
use crate::decode::decode_frame;
use crate::fanout::Distributor;
use crate::framing::{Frame, FrameSync, SyncError};
use crate::link::ByteLink;
use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long the processor waits on the ingress queue before checking the
/// shutdown flag again.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Counters for the capture-side roles.
#[derive(Default)]
pub struct StreamStats {
    corrupt_frames: AtomicCell<u64>,
    ingress_dropped: AtomicCell<u64>,
}

impl StreamStats {
    pub fn corrupt_frames(&self) -> u64 {
        self.corrupt_frames.load()
    }

    pub fn ingress_dropped(&self) -> u64 {
        self.ingress_dropped.load()
    }
}

/// Wires the reader and processor roles together over the ingress queue.
///
/// The reader owns the link exclusively and runs the frame synchronizer; the
/// processor decodes and corrects each frame and hands the block to the
/// distributor. Consumers hang off distributor taps registered before spawn
/// and are driven by their own schedulers. The bounded queues are the only
/// synchronization points; neither role ever applies blocking backpressure
/// toward the link.
pub struct StreamSystem {
    shutdown: Arc<AtomicCell<bool>>,
    stats: Arc<StreamStats>,
    reader: Option<JoinHandle<()>>,
    processor: Option<JoinHandle<()>>,
}

impl StreamSystem {
    pub fn spawn<L>(config: &StreamConfig, link: L, distributor: Distributor) -> Self
    where
        L: ByteLink + Send + 'static,
    {
        let shutdown = Arc::new(AtomicCell::new(false));
        let stats = Arc::new(StreamStats::default());

        let (ingress_sender, ingress_receiver) = bounded(config.ingress_capacity);
        let sync = FrameSync::new(link, config.marker, config.payload_size);

        let reader = spawn_reader(sync, ingress_sender, shutdown.clone(), stats.clone());
        let processor = spawn_processor(ingress_receiver, distributor, shutdown.clone());

        Self {
            shutdown,
            stats,
            reader: Some(reader),
            processor: Some(processor),
        }
    }

    pub fn stats(&self) -> Arc<StreamStats> {
        self.stats.clone()
    }

    /// Flags both roles to stop and waits for them. Each exits within one
    /// blocking-call timeout of the flag flipping.
    pub fn shutdown(mut self) {
        self.shutdown.store(true);

        if let Some(reader) = self.reader.take() {
            reader.join().ok();
        }
        if let Some(processor) = self.processor.take() {
            processor.join().ok();
        }
    }
}

impl Drop for StreamSystem {
    fn drop(&mut self) {
        self.shutdown.store(true);
    }
}

fn spawn_reader<L>(
    mut sync: FrameSync<L>,
    ingress: Sender<Frame>,
    shutdown: Arc<AtomicCell<bool>>,
    stats: Arc<StreamStats>,
) -> JoinHandle<()>
where
    L: ByteLink + Send + 'static,
{
    let run = move || {
        while !shutdown.load() {
            match sync.next_frame() {
                Ok(frame) => {
                    if ingress.try_send(frame).is_err() {
                        stats.ingress_dropped.fetch_add(1);
                        log::trace!("ingress queue full, frame dropped");
                    }
                }
                Err(SyncError::FrameCorrupt { partial, expected }) => {
                    stats.corrupt_frames.fetch_add(1);
                    log::warn!(
                        "corrupt frame ({} of {} bytes), resynchronizing",
                        partial.len(),
                        expected
                    );
                }
                Err(SyncError::LinkTimeout) => {
                    log::error!("link timed out, capture halted");
                    break;
                }
                Err(SyncError::Link(err)) => {
                    log::error!("link failed ({}), capture halted", err);
                    break;
                }
            }
        }
    };

    thread::Builder::new()
        .name("reader".to_string())
        .spawn(run)
        .unwrap()
}

fn spawn_processor(
    ingress: Receiver<Frame>,
    distributor: Distributor,
    shutdown: Arc<AtomicCell<bool>>,
) -> JoinHandle<()> {
    let run = move || {
        while !shutdown.load() {
            match ingress.recv_timeout(RECV_TIMEOUT) {
                Ok(frame) => {
                    let block = decode_frame(&frame.payload);
                    distributor.dispatch(&block);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    };

    thread::Builder::new()
        .name("processor".to_string())
        .spawn(run)
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::ReaderLink;
    use std::io::Cursor;

    #[test]
    fn quiet_link_shuts_down_cleanly() {
        let config = StreamConfig::default();
        let link = ReaderLink::new(Cursor::new(Vec::new()));

        let system = StreamSystem::spawn(&config, link, Distributor::new());
        system.shutdown();
    }

    #[test]
    fn corrupt_frames_are_counted_and_survived() {
        let mut config = StreamConfig::default();
        config.payload_size = 8;

        // A marker followed by a truncated payload.
        let stream = vec![0xAA, 0x55, 1, 2, 3];
        let link = ReaderLink::new(Cursor::new(stream));

        let mut distributor = Distributor::new();
        let (receiver, _) = distributor.add_tap("test", 4);

        let system = StreamSystem::spawn(&config, link, distributor);

        // Reader exhausts the stream and halts on its own.
        assert!(receiver.recv_timeout(Duration::from_secs(1)).is_err());
        assert_eq!(system.stats().corrupt_frames(), 1);

        system.shutdown();
    }
}
