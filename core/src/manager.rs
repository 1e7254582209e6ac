//! Mode Manager - the finite-state machine over [`Mode`]s.
//!
//! Owns the screen registry, serialises transitions so that
//! `stop_mode -> update -> start_mode -> notify` never interleaves with
//! another transition, and fans mode changes out to registered callbacks.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use crate::playback::{PlayStatus, PlaybackState};
use crate::screen::ScreenSet;
use crate::{Mode, Transition};

/// Callback invoked with the new mode after every committed transition.
pub type ModeChangeCallback = Arc<dyn Fn(Mode) -> anyhow::Result<()> + Send + Sync>;

/// Automatic transitions driven by player status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackPolicy {
    /// Leave the clock for the now-playing screen when playback starts
    pub show_now_playing_on_play: bool,
    /// Return from now-playing to the clock when playback stops
    pub clock_on_stop: bool,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            show_now_playing_on_play: true,
            clock_on_stop: true,
        }
    }
}

impl PlaybackPolicy {
    /// Pure decision: which transition, if any, `status` calls for in `current`.
    ///
    /// Menu-like modes are never left automatically; the user is navigating.
    pub fn decide(&self, current: Mode, status: PlayStatus) -> Option<Transition> {
        if current.is_menu_like() {
            return None;
        }
        match status {
            PlayStatus::Play if current != Mode::NowPlaying && self.show_now_playing_on_play => {
                Some(Transition::ToNowPlaying)
            }
            PlayStatus::Stop if current == Mode::NowPlaying && self.clock_on_stop => {
                Some(Transition::ToClock)
            }
            _ => None,
        }
    }
}

struct ModeState {
    current: Mode,
    /// Mode whose screen has been started and not yet stopped
    active: Option<Mode>,
}

pub struct ModeManager {
    screens: ScreenSet,
    policy: PlaybackPolicy,
    /// Held for the whole of a transition
    state: Mutex<ModeState>,
    /// Read side for `get_mode`, written only while `state` is held
    current: RwLock<Mode>,
    callbacks: Mutex<Vec<ModeChangeCallback>>,
}

impl ModeManager {
    /// Create a manager at the root mode. No screen is started until the
    /// first transition.
    pub fn new(screens: ScreenSet, policy: PlaybackPolicy) -> Arc<Self> {
        Arc::new(Self::from_parts(screens, policy))
    }

    /// Create a manager whose screens need a handle back to it.
    pub fn with_screens<F>(policy: PlaybackPolicy, build: F) -> Arc<Self>
    where
        F: FnOnce(Navigator) -> ScreenSet,
    {
        Arc::new_cyclic(|weak| {
            let screens = build(Navigator { manager: weak.clone() });
            Self::from_parts(screens, policy)
        })
    }

    fn from_parts(screens: ScreenSet, policy: PlaybackPolicy) -> Self {
        Self {
            screens,
            policy,
            state: Mutex::new(ModeState {
                current: Mode::ROOT,
                active: None,
            }),
            current: RwLock::new(Mode::ROOT),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn screens(&self) -> &ScreenSet {
        &self.screens
    }

    /// Current mode. Never waits on a transition in flight for longer than
    /// the single store that commits it.
    pub fn get_mode(&self) -> Mode {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mode whose screen is currently started, if any.
    pub fn active_mode(&self) -> Option<Mode> {
        self.lock_state().active
    }

    /// Resolve and apply `transition`. Returns `true` when a transition happened.
    ///
    /// Screens must not call back into the manager from `start_mode`/`stop_mode`
    /// and callbacks must not trigger transitions: both run under the
    /// transition lock.
    pub fn trigger(&self, transition: Transition) -> bool {
        let mut state = self.lock_state();
        let Some(target) = transition.resolve(state.current) else {
            log::info!(
                "ModeManager: No transition for '{}' from mode '{}'",
                transition,
                state.current
            );
            return false;
        };

        log::info!("ModeManager: {} -> {} via '{}'", state.current, target, transition);

        if let Some(active) = state.active.take() {
            self.screens.screen(active).stop_mode();
        }
        state.current = target;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = target;
        self.screens.screen(target).start_mode();
        state.active = Some(target);

        self.notify_mode_change(target);
        true
    }

    /// Move to the parent of the current menu-like mode. No-op elsewhere.
    pub fn back(&self) -> bool {
        if !self.get_mode().is_menu_like() {
            log::debug!("ModeManager: back ignored in mode '{}'", self.get_mode());
            return false;
        }
        self.trigger(Transition::Back)
    }

    /// Back request from an input device: the active screen may consume it
    /// first, otherwise behaves like [`ModeManager::back`].
    pub fn navigate_back(&self) -> bool {
        let mode = self.get_mode();
        if !mode.is_menu_like() {
            log::debug!("ModeManager: back ignored in mode '{}'", mode);
            return false;
        }
        if self.screens.screen(mode).handle_back() {
            log::debug!("ModeManager: back handled inside '{}'", mode);
            return true;
        }
        self.back()
    }

    /// Apply the playback policy to a state snapshot from the player.
    pub fn process_state_change(&self, state: &PlaybackState) {
        let Some(status) = state.status else {
            return;
        };
        let mode = self.get_mode();
        if let Some(transition) = self.policy.decide(mode, status) {
            log::info!("ModeManager: status {:?} in '{}' -> {}", status, mode, transition);
            self.trigger(transition);
        }
    }

    /// Register `callback` for every committed transition.
    ///
    /// Callbacks run under the transition lock: they may register further
    /// callbacks but must not trigger transitions.
    pub fn add_mode_change_callback<F>(&self, callback: F)
    where
        F: Fn(Mode) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
        log::debug!("ModeManager: Added mode change callback");
    }

    /// Invoke every callback with `mode`.
    ///
    /// Best effort: a callback that fails or panics is logged and skipped,
    /// the remaining callbacks still run and nothing is reported to the caller.
    pub fn notify_mode_change(&self, mode: Mode) {
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for (index, callback) in callbacks.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| callback(mode))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    log::error!("ModeManager: Mode change callback #{} failed: {:#}", index, e)
                }
                Err(_) => log::error!("ModeManager: Mode change callback #{} panicked", index),
            }
        }
    }

    /// Pick the first mode after startup: the playback policy decides for a
    /// playing player, anything that leaves no screen started falls back to
    /// the menu. Returns the mode entered.
    pub fn enter_startup_mode(&self, state: Option<&PlaybackState>) -> Mode {
        if let Some(state) = state.filter(|state| state.is_playing()) {
            self.process_state_change(state);
        }
        if self.active_mode().is_none() && !self.trigger(Transition::ToMenu) {
            // already in a non-root mode with no screen running
            let mut guard = self.lock_state();
            let mode = guard.current;
            self.screens.screen(mode).start_mode();
            guard.active = Some(mode);
        }
        let mode = self.get_mode();
        log::info!("ModeManager: Startup mode '{}'", mode);
        mode
    }

    /// Stop the active screen, if any. Used on daemon exit and shutdown.
    pub fn stop_active(&self) {
        let mut state = self.lock_state();
        if let Some(active) = state.active.take() {
            log::info!("ModeManager: Stopping '{}'", active);
            self.screens.screen(active).stop_mode();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ModeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Non-owning handle screens use to drive navigation.
#[derive(Clone)]
pub struct Navigator {
    manager: Weak<ModeManager>,
}

impl Navigator {
    pub fn trigger(&self, transition: Transition) -> bool {
        match self.manager.upgrade() {
            Some(manager) => manager.trigger(transition),
            None => false,
        }
    }

    pub fn back(&self) -> bool {
        self.manager.upgrade().map(|m| m.back()).unwrap_or(false)
    }

    pub fn get_mode(&self) -> Option<Mode> {
        self.manager.upgrade().map(|m| m.get_mode())
    }
}
