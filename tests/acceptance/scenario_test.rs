//! Wake-up and ordering scenarios.
//!
//! Each test uses its own clock, so tests can run in parallel.

use super::common::{
    spawn_single_wait_consumers, spawn_worker, wait_for_waiters, TEST_TIMEOUT,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tick_clock::Clock;
use tick_common::time::Tick;

#[test]
fn test_eight_consumers_wake_on_single_pulse() {
    let clock = Arc::new(Clock::new());
    clock.initialize();

    let (handles, rx) = spawn_single_wait_consumers(&clock, 8, Tick::ZERO);
    assert!(wait_for_waiters(&clock, 8), "consumers never blocked");

    clock.pulse();

    let mut woken = [false; 8];
    for _ in 0..8 {
        let (id, tick, cursor) = rx.recv_timeout(TEST_TIMEOUT).expect("consumer stuck");
        assert_eq!(tick, Tick(1));
        assert_eq!(cursor, Tick(1));
        woken[id] = true;
    }
    assert!(woken.iter().all(|&w| w));

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(clock.snapshot().waiters, 0);
}

#[test]
fn test_all_consumers_wake_within_bound() {
    const CONSUMERS: usize = 64;

    let clock = Arc::new(Clock::new());
    let (handles, rx) = spawn_single_wait_consumers(&clock, CONSUMERS, Tick::ZERO);
    assert!(wait_for_waiters(&clock, CONSUMERS));

    clock.pulse();

    for _ in 0..CONSUMERS {
        rx.recv_timeout(TEST_TIMEOUT).expect("consumer stuck after pulse");
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_burst_of_pulses_is_seen_as_latest() {
    let clock = Arc::new(Clock::new());
    clock.initialize();

    // Three pulses land before the consumer gets to wait
    clock.pulse();
    clock.pulse();
    clock.pulse();

    let (tx, rx) = mpsc::channel();
    let consumer = {
        let clock = Arc::clone(&clock);
        thread::spawn(move || {
            let mut cursor = Tick::ZERO;
            let first = clock.wait_for_next_tick(&mut cursor);
            tx.send(first).unwrap();
            let second = clock.wait_for_next_tick(&mut cursor);
            tx.send(second).unwrap();
            cursor
        })
    };

    assert_eq!(rx.recv_timeout(TEST_TIMEOUT).unwrap(), Tick(3));

    // The second wait must block until a fourth pulse
    assert!(wait_for_waiters(&clock, 1));
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    clock.pulse();
    assert_eq!(rx.recv_timeout(TEST_TIMEOUT).unwrap(), Tick(4));
    assert_eq!(consumer.join().unwrap(), Tick(4));
}

#[test]
fn test_no_lost_pulses_before_wait() {
    const PULSES: u64 = 1_000;

    let clock = Clock::new();
    for _ in 0..PULSES {
        clock.pulse();
    }

    let mut cursor = Tick::ZERO;
    let tick = clock.wait_for_next_tick(&mut cursor);
    assert!(tick >= Tick(PULSES));
    assert_eq!(tick, Tick(PULSES));
}

#[test]
fn test_no_early_return_below_cursor() {
    let clock = Arc::new(Clock::new());
    let (handles, rx) = spawn_single_wait_consumers(&clock, 1, Tick(5));
    assert!(wait_for_waiters(&clock, 1));

    // Each of these wakes the consumer, which must go back to sleep
    for _ in 0..5 {
        clock.pulse();
        thread::sleep(Duration::from_millis(2));
    }
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    assert_eq!(clock.snapshot().waiters, 1);

    clock.pulse();
    let (_, tick, cursor) = rx.recv_timeout(TEST_TIMEOUT).unwrap();
    assert_eq!(tick, Tick(6));
    assert_eq!(cursor, Tick(6));
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_consumers_with_different_cursors() {
    let clock = Arc::new(Clock::new());
    let (low, low_rx) = spawn_single_wait_consumers(&clock, 1, Tick(0));
    let (high, high_rx) = spawn_single_wait_consumers(&clock, 1, Tick(2));
    assert!(wait_for_waiters(&clock, 2));

    clock.pulse();
    assert_eq!(low_rx.recv_timeout(TEST_TIMEOUT).unwrap().1, Tick(1));
    assert!(high_rx.recv_timeout(Duration::from_millis(50)).is_err());

    clock.pulse();
    clock.pulse();
    assert_eq!(high_rx.recv_timeout(TEST_TIMEOUT).unwrap().1, Tick(3));

    for handle in low.into_iter().chain(high) {
        handle.join().unwrap();
    }
}

#[test]
fn test_worker_sequence_is_strictly_increasing() {
    let clock = Arc::new(Clock::new());
    let worker = spawn_worker(&clock, 50, Duration::ZERO);

    for _ in 0..200 {
        clock.pulse();
    }
    // Keep pulsing until the worker has collected its observations
    while !worker.is_finished() {
        clock.pulse();
        thread::sleep(Duration::from_millis(1));
    }

    let seen = worker.join().unwrap();
    assert_eq!(seen.len(), 50);
    super::common::assert_strictly_increasing(&seen);
}
