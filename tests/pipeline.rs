use std::io::Cursor;
use std::thread;
use std::time::{Duration, Instant};

use tickstream::fanout::Distributor;
use tickstream::link::ReaderLink;
use tickstream::playback::PlaybackEngine;
use tickstream::scope::Scope;
use tickstream::system::StreamSystem;
use tickstream::StreamConfig;

fn framed_stream(config: &StreamConfig, payloads: &[Vec<u8>]) -> Vec<u8> {
    let mut stream = Vec::new();
    for payload in payloads {
        stream.extend_from_slice(&config.marker);
        stream.extend_from_slice(payload);
    }
    stream
}

/// Payload carrying consecutive sample values starting at `base`, with the
/// garbage top byte the firmware would leave in each container.
fn counting_payload(config: &StreamConfig, base: i32) -> Vec<u8> {
    (0..config.samples_per_frame() as i32)
        .flat_map(|n| {
            let mut bytes = (base + n).to_le_bytes();
            bytes[3] = 0x5A;
            bytes
        })
        .collect()
}

#[test]
fn zero_frames_reach_both_consumer_channels_in_order() {
    let config = StreamConfig::default();
    let stream = framed_stream(&config, &vec![vec![0u8; config.payload_size]; 3]);

    let mut distributor = Distributor::new();
    let (playback_receiver, _) = distributor.add_tap("playback", config.tap_capacity);
    let (scope_receiver, _) = distributor.add_tap("scope", config.tap_capacity);

    let system = StreamSystem::spawn(&config, ReaderLink::new(Cursor::new(stream)), distributor);

    for receiver in [&playback_receiver, &scope_receiver] {
        for _ in 0..3 {
            let block = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
            assert_eq!(block.len(), 128);
            assert!(block.iter().all(|&s| s == 0));
        }
    }

    system.shutdown();

    assert!(playback_receiver.try_recv().is_err());
    assert!(scope_receiver.try_recv().is_err());
}

#[test]
fn live_consumers_see_the_corrected_stream() {
    let mut config = StreamConfig::default();
    config.scope_window = 100;

    let samples_per_frame = config.samples_per_frame() as i32;
    let payloads: Vec<_> = (0..3)
        .map(|frame| counting_payload(&config, frame * samples_per_frame))
        .collect();
    let stream = framed_stream(&config, &payloads);

    let mut distributor = Distributor::new();
    let (playback_receiver, _) = distributor.add_tap("playback", config.tap_capacity);
    let (scope_receiver, _) = distributor.add_tap("scope", config.tap_capacity);

    let mut engine = PlaybackEngine::new(playback_receiver, 1.);
    let scope = Scope::new(scope_receiver, config.scope_window);

    let system = StreamSystem::spawn(&config, ReaderLink::new(Cursor::new(stream)), distributor);

    // Drive the scope on a mock redraw timer until the last sample lands.
    let total = samples_per_frame * 3;
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        scope.update();
        if scope.window().last() == Some(&(total - 1)) {
            break;
        }
        assert!(Instant::now() < deadline, "stream never reached the scope");
        thread::sleep(Duration::from_millis(10));
    }

    let window = scope.window();
    let expected: Vec<i32> = (total - config.scope_window as i32..total).collect();
    assert_eq!(window, expected);

    // Taps are filled in registration order, so once the scope has seen the
    // last block the playback tap already holds the full stream.
    let mut out = vec![0i32; total as usize];
    engine.render_block(&mut out);
    let expected: Vec<i32> = (0..total).collect();
    assert_eq!(out, expected);
    assert_eq!(engine.stats().underruns(), 0);

    system.shutdown();
}
