use crate::decode::SampleBlock;
use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{bounded, Receiver, Sender};
use std::sync::Arc;

/// Drop accounting for one tap, shared with whoever wants to display it.
#[derive(Default)]
pub struct TapStats {
    dropped: AtomicCell<u64>,
}

impl TapStats {
    pub fn dropped(&self) -> u64 {
        self.dropped.load()
    }

    fn record_drop(&self) {
        self.dropped.fetch_add(1);
    }
}

struct Tap {
    name: &'static str,
    sender: Sender<SampleBlock>,
    stats: Arc<TapStats>,
}

/// Fans each decoded block out to every registered consumer tap.
///
/// Pushes never block: a tap whose consumer has fallen behind loses that
/// block (counted) while the other taps receive it untouched. Playback and
/// the scope are presentation paths, so losing samples there beats stalling
/// capture; the raw capture file is the system of record when one is needed.
#[derive(Default)]
pub struct Distributor {
    taps: Vec<Tap>,
}

impl Distributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a consumer and hands back its receiving end plus its drop
    /// counter.
    pub fn add_tap(
        &mut self,
        name: &'static str,
        capacity: usize,
    ) -> (Receiver<SampleBlock>, Arc<TapStats>) {
        let (sender, receiver) = bounded(capacity);
        let stats = Arc::new(TapStats::default());

        self.taps.push(Tap {
            name,
            sender,
            stats: stats.clone(),
        });

        (receiver, stats)
    }

    pub fn dispatch(&self, block: &SampleBlock) {
        for tap in &self.taps {
            if tap.sender.try_send(block.clone()).is_err() {
                tap.stats.record_drop();
                log::trace!("tap {} full, block dropped", tap.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(samples: &[i32]) -> SampleBlock {
        samples.to_vec().into()
    }

    #[test]
    fn every_tap_receives_the_block() {
        let mut distributor = Distributor::new();
        let (first, _) = distributor.add_tap("first", 4);
        let (second, _) = distributor.add_tap("second", 4);

        distributor.dispatch(&block(&[1, 2, 3]));

        assert_eq!(&*first.recv().unwrap(), &[1, 2, 3]);
        assert_eq!(&*second.recv().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn full_tap_drops_without_touching_the_others() {
        let mut distributor = Distributor::new();
        let (full, full_stats) = distributor.add_tap("full", 1);
        let (open, open_stats) = distributor.add_tap("open", 4);

        distributor.dispatch(&block(&[1]));
        distributor.dispatch(&block(&[2]));

        // The full tap kept only the first block and counted one drop.
        assert_eq!(&*full.recv().unwrap(), &[1]);
        assert!(full.try_recv().is_err());
        assert_eq!(full_stats.dropped(), 1);

        // The open tap got both, in order, with nothing counted.
        assert_eq!(&*open.recv().unwrap(), &[1]);
        assert_eq!(&*open.recv().unwrap(), &[2]);
        assert_eq!(open_stats.dropped(), 0);
    }

    #[test]
    fn disconnected_consumer_counts_as_drops() {
        let mut distributor = Distributor::new();
        let (receiver, stats) = distributor.add_tap("gone", 4);
        drop(receiver);

        distributor.dispatch(&block(&[1]));

        assert_eq!(stats.dropped(), 1);
    }

    #[test]
    fn blocks_share_one_allocation() {
        let mut distributor = Distributor::new();
        let (first, _) = distributor.add_tap("first", 1);
        let (second, _) = distributor.add_tap("second", 1);

        distributor.dispatch(&block(&[5]));

        let a = first.recv().unwrap();
        let b = second.recv().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
