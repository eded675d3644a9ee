use crate::decode::SampleBlock;
use crossbeam::channel::Receiver;
use parking_lot::Mutex;

/// Rolling window of the most recent samples for the waveform display.
///
/// Driven by the display's redraw timer: each tick calls
/// [`update`](Self::update) and then renders [`window`](Self::window).
/// Nothing here blocks, and "no new data" just leaves the window unchanged.
pub struct Scope {
    receiver: Receiver<SampleBlock>,
    window_size: usize,
    window: Mutex<Vec<i32>>,
}

impl Scope {
    pub fn new(receiver: Receiver<SampleBlock>, window_size: usize) -> Self {
        Self {
            receiver,
            window_size,
            window: Mutex::new(vec![0; window_size]),
        }
    }

    /// Drains every block currently queued into the window, evicting the
    /// oldest samples.
    pub fn update(&self) {
        let mut window = self.window.lock();

        while let Ok(block) = self.receiver.try_recv() {
            window.extend_from_slice(&block);
        }

        let overflow = window.len().saturating_sub(self.window_size);
        if overflow > 0 {
            window.drain(..overflow);
        }
    }

    /// Snapshot of the current window, oldest sample first.
    pub fn window(&self) -> Vec<i32> {
        self.window.lock().clone()
    }
}
