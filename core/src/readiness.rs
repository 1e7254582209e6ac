//! Readiness signals gating the startup sequence.
//!
//! Three set-once flags (`service_ready`, `min_duration_elapsed`,
//! `interrupt_requested`) and the gate that releases the loading phase once
//! the first two are both observed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::playback::PlaybackState;

/// A monotonic event: false until [`Flag::set`], then true forever.
#[derive(Debug, Default)]
pub struct Flag {
    set: Mutex<bool>,
    changed: Condvar,
}

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake every waiter. Returns `true` for the call that
    /// actually flipped it.
    pub fn set(&self) -> bool {
        let mut set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        if *set {
            return false;
        }
        *set = true;
        self.changed.notify_all();
        true
    }

    pub fn is_set(&self) -> bool {
        *self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the flag is set.
    pub fn wait(&self) {
        let mut set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        while !*set {
            set = self.changed.wait(set).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the flag is set or `timeout` elapses. Returns the flag.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        while !*set {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            set = self
                .changed
                .wait_timeout(set, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

/// The three startup signals, shared between the lifecycle thread, the
/// timer, the state feed and the command channel.
#[derive(Debug, Default)]
pub struct ReadinessFlags {
    pub service_ready: Flag,
    pub min_duration_elapsed: Flag,
    pub interrupt_requested: Flag,
}

impl ReadinessFlags {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `service_ready AND min_duration_elapsed`.
    pub fn loading_done(&self) -> bool {
        self.service_ready.is_set() && self.min_duration_elapsed.is_set()
    }

    /// Feed a player snapshot: any usable status marks the service ready,
    /// `play` also requests the interrupt that ends the ready animation.
    pub fn observe_state(&self, state: &PlaybackState) {
        if state.is_playing() && self.interrupt_requested.set() {
            log::info!("Readiness: Playback started, interrupting ready screen");
        }
        if state.has_usable_status() && self.service_ready.set() {
            log::info!("Readiness: Player service is ready ({:?})", state.status);
        }
    }

    /// Request the interrupt. Returns `true` if this call set it.
    pub fn request_interrupt(&self) -> bool {
        self.interrupt_requested.set()
    }

    /// Set `min_duration_elapsed` once `delay` has passed.
    pub fn start_min_duration_timer(
        self: &Arc<Self>,
        delay: Duration,
    ) -> std::io::Result<JoinHandle<()>> {
        let flags = Arc::clone(self);
        thread::Builder::new()
            .name("cyfi-min-loading".to_string())
            .spawn(move || {
                thread::sleep(delay);
                flags.min_duration_elapsed.set();
                log::info!("Readiness: Minimum loading duration has elapsed");
            })
    }
}

/// AND-gate over `service_ready` and `min_duration_elapsed` that fires at
/// most once, no matter how many threads wait on it or in which order the
/// flags are set.
#[derive(Debug)]
pub struct ReadinessGate {
    flags: Arc<ReadinessFlags>,
    fired: AtomicBool,
}

impl ReadinessGate {
    pub fn new(flags: Arc<ReadinessFlags>) -> Self {
        Self {
            flags,
            fired: AtomicBool::new(false),
        }
    }

    /// Block until both flags are set. Returns `true` for exactly one caller.
    pub fn wait(&self) -> bool {
        self.flags.service_ready.wait();
        self.flags.min_duration_elapsed.wait();
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Block until both flags are set and run `action` if this caller won
    /// the gate.
    pub fn wait_then<F: FnOnce()>(&self, action: F) -> bool {
        let won = self.wait();
        if won {
            action();
        }
        won
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
