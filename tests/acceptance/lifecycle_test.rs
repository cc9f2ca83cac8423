//! Initialization, teardown and revival.

use super::common::{
    assert_strictly_increasing, spawn_single_wait_consumers, wait_for_waiters, TEST_TIMEOUT,
};
use std::sync::{Arc, Barrier};
use std::thread;
use tick_clock::{global, Clock, ClockError, ClockState};
use tick_common::time::Tick;

#[test]
fn test_concurrent_initialize_runs_setup_once() {
    const THREADS: usize = 32;

    let clock = Arc::new(Clock::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let clock = Arc::clone(&clock);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                clock.initialize();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snap = clock.snapshot();
    assert_eq!(snap.state, ClockState::Ready);
    assert_eq!(snap.generation, 1);
    assert_eq!(snap.tick, Tick::ZERO);
}

#[test]
fn test_initialize_racing_pulses_never_resets_counter() {
    const THREADS: usize = 16;

    let clock = Arc::new(Clock::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let clock = Arc::clone(&clock);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                clock.initialize();
                clock.pulse();
                clock.initialize();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(clock.current(), Tick(u64::try_from(THREADS).unwrap()));
    assert_eq!(clock.snapshot().generation, 1);
}

#[test]
fn test_destroy_and_revive_cycles() {
    let clock = Clock::new();
    clock.destroy();
    assert_eq!(clock.state(), ClockState::Uninitialized);

    for generation in 1..=3 {
        clock.initialize();
        // The count carries over from the previous generation
        assert_eq!(clock.pulse(), Tick(2 * generation - 1));
        assert_eq!(clock.pulse(), Tick(2 * generation));
        assert_eq!(clock.snapshot().generation, generation);

        clock.destroy();
        clock.destroy();
        assert_eq!(clock.state(), ClockState::Uninitialized);
    }
}

#[test]
fn test_waiter_survives_destroy_and_sees_revived_clock() {
    let clock = Arc::new(Clock::new());
    assert_eq!(clock.pulse(), Tick(1));
    let (handles, rx) = spawn_single_wait_consumers(&clock, 1, Tick(1));
    assert!(wait_for_waiters(&clock, 1));

    clock.destroy();
    assert_eq!(clock.snapshot().waiters, 1);

    // One pulse after the revive is enough to move past the waiter's cursor
    assert_eq!(clock.pulse(), Tick(2));
    let (_, tick, cursor) = rx.recv_timeout(TEST_TIMEOUT).unwrap();
    assert_eq!(tick, Tick(2));
    assert_eq!(cursor, Tick(2));
    assert_eq!(clock.snapshot().generation, 2);

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_global_clock_facade() {
    // The global clock is shared with nothing else in this binary
    global::initialize();
    global::initialize();
    assert_eq!(global::wait_tick(None), Err(ClockError::MissingCursor));

    let mut cursor = global::clock().current();
    let pulsed = global::pulse();
    let tick = global::wait_tick(Some(&mut cursor)).unwrap();
    assert_eq!(tick, pulsed);
    assert_eq!(cursor, pulsed);

    global::destroy();
    assert_eq!(global::clock().state(), ClockState::Uninitialized);
    let revived = global::pulse();
    assert!(revived > pulsed, "global tick went backwards: {pulsed} -> {revived}");
    assert_eq!(Some(revived), pulsed.next());
}

#[test]
fn test_ticks_keep_increasing_across_destroy() {
    const PULSES: u64 = 5;

    let clock = Clock::new();
    let mut observed = Vec::new();
    let mut cursor = Tick::ZERO;
    for round in 0..3 {
        for _ in 0..PULSES {
            clock.pulse();
            observed.push(clock.wait_for_next_tick(&mut cursor));
        }
        clock.destroy();
        assert_eq!(clock.current(), Tick(PULSES * (round + 1)));
    }

    assert_eq!(clock.snapshot().generation, 3);
    assert_eq!(observed.len(), 15);
    assert_strictly_increasing(&observed);
}

#[test]
fn test_cursor_from_before_destroy_wakes_on_next_pulse() {
    const PULSES: u64 = 4;
    const CONSUMERS: usize = 3;

    let clock = Arc::new(Clock::new());
    for _ in 0..PULSES {
        clock.pulse();
    }
    let before = clock.current();

    // Parked before the destroy
    let (mut handles, parked) = spawn_single_wait_consumers(&clock, CONSUMERS, before);
    assert!(wait_for_waiters(&clock, CONSUMERS));
    clock.destroy();

    // Started after the destroy with the same stale cursor; this revives the clock
    let (late, late_rx) = spawn_single_wait_consumers(&clock, 1, before);
    handles.extend(late);
    assert!(wait_for_waiters(&clock, CONSUMERS + 1));
    assert_eq!(clock.state(), ClockState::Ready);
    assert_eq!(clock.current(), before);

    let pulsed = clock.pulse();
    assert_eq!(pulsed, Tick(PULSES + 1));
    for _ in 0..CONSUMERS {
        let (_, tick, cursor) = parked.recv_timeout(TEST_TIMEOUT).unwrap();
        assert_eq!(tick, pulsed);
        assert_eq!(cursor, pulsed);
    }
    let (_, tick, _) = late_rx.recv_timeout(TEST_TIMEOUT).unwrap();
    assert_eq!(tick, pulsed);

    for handle in handles {
        handle.join().unwrap();
    }
}
