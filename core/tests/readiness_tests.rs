use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cyfi_core::{PlayStatus, PlaybackState, ReadinessFlags, ReadinessGate};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_gate_fires_exactly_once(
        service_delay_ms in 0u64..8,
        timer_delay_ms in 0u64..8,
        waiters in 1usize..6,
        duplicate_states in 0usize..4,
    ) {
        let flags = ReadinessFlags::new();
        let gate = Arc::new(ReadinessGate::new(flags.clone()));
        let fired = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..waiters)
            .map(|_| {
                let gate = gate.clone();
                let fired = fired.clone();
                let flags = flags.clone();
                thread::spawn(move || {
                    gate.wait_then(|| {
                        assert!(flags.loading_done());
                        fired.fetch_add(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        let timer = flags
            .start_min_duration_timer(Duration::from_millis(timer_delay_ms))
            .unwrap();
        let feed = {
            let flags = flags.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(service_delay_ms));
                for _ in 0..=duplicate_states {
                    flags.observe_state(&PlaybackState::with_status(PlayStatus::Pause));
                }
            })
        };

        timer.join().unwrap();
        feed.join().unwrap();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        prop_assert_eq!(winners, 1);
        prop_assert_eq!(fired.load(Ordering::SeqCst), 1);
        prop_assert!(gate.has_fired());
        prop_assert!(!flags.interrupt_requested.is_set());
    }
}

#[test]
fn test_playing_status_readies_and_interrupts() {
    let flags = ReadinessFlags::new();
    flags.observe_state(&PlaybackState::with_status(PlayStatus::Play));
    assert!(flags.service_ready.is_set());
    assert!(flags.interrupt_requested.is_set());
    assert!(!flags.loading_done());
}

#[test]
fn test_unknown_status_counts_as_ready() {
    let flags = ReadinessFlags::new();
    let state: PlaybackState = serde_json::from_str(r#"{"status":"unknown"}"#).unwrap();
    flags.observe_state(&state);
    assert!(flags.service_ready.is_set());
    assert!(!flags.interrupt_requested.is_set());
}
