//! Phased startup: first-run network wait, logo, loading, ready handoff.
//!
//! Runs on the lifecycle thread. Animations run until their phase's stop
//! condition holds; the readiness flags decide when each phase ends, never
//! the animations themselves.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::animation::Animator;
use crate::markers::SeenReadyMarker;
use crate::probe::Connectivity;
use crate::readiness::{Flag, ReadinessFlags, ReadinessGate};

/// Animation assets for each phase.
#[derive(Debug, Clone)]
pub struct StartupAssets {
    pub logo: PathBuf,
    pub connecting: PathBuf,
    pub connected: PathBuf,
    pub loading: PathBuf,
    /// Shown once to a user who has never seen the ready sequence
    pub ready_new: PathBuf,
    pub ready: PathBuf,
    pub ready_loop: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct StartupTiming {
    pub logo_hold: Duration,
    pub min_loading: Duration,
    pub connected_hold: Duration,
    pub probe_interval: Duration,
}

impl Default for StartupTiming {
    fn default() -> Self {
        Self {
            logo_hold: Duration::from_secs(12),
            min_loading: Duration::from_secs(6),
            connected_hold: Duration::from_secs(2),
            probe_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupOutcome {
    /// The network wait ran
    pub first_run: bool,
    /// The first-time ready variant was shown
    pub first_time_user: bool,
}

pub struct StartupSequence {
    animator: Arc<Animator>,
    flags: Arc<ReadinessFlags>,
    assets: StartupAssets,
    timing: StartupTiming,
    marker: SeenReadyMarker,
    /// Set when network provisioning is still pending
    network_wait: Option<Arc<dyn Connectivity>>,
}

impl StartupSequence {
    pub fn new(
        animator: Arc<Animator>,
        flags: Arc<ReadinessFlags>,
        assets: StartupAssets,
        timing: StartupTiming,
        marker: SeenReadyMarker,
    ) -> Self {
        Self {
            animator,
            flags,
            assets,
            timing,
            marker,
            network_wait: None,
        }
    }

    /// Wait for `connectivity` before anything else.
    pub fn with_network_wait(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.network_wait = Some(connectivity);
        self
    }

    /// Run every phase to completion. Returns once the ready loop has been
    /// interrupted (or skipped because its asset is unavailable).
    pub fn run(&self) -> StartupOutcome {
        let first_run = match &self.network_wait {
            Some(connectivity) => {
                log::info!("Startup: First run detected, waiting for network");
                self.wait_for_network(connectivity.as_ref());
                true
            }
            None => false,
        };

        let first_time_user = !self.marker.has_seen();

        log::info!("Startup: Displaying logo");
        self.animator.show_still(&self.assets.logo, self.timing.logo_hold);
        self.animator.sink().clear();

        self.run_loading();
        self.run_ready(first_time_user);

        if first_time_user {
            if let Err(e) = self.marker.mark_seen() {
                log::error!("Startup: {}", e);
            }
        }
        log::info!("Startup: Ready sequence finished");

        StartupOutcome {
            first_run,
            first_time_user,
        }
    }

    /// Probe until online while the connecting animation plays, then show
    /// the connected animation. Retries forever.
    fn wait_for_network(&self, connectivity: &dyn Connectivity) {
        let online = Arc::new(Flag::new());
        let animation = {
            let online = online.clone();
            self.animator
                .spawn_until(self.assets.connecting.clone(), move || online.is_set())
        };
        if let Err(e) = &animation {
            log::error!("Startup: Could not start connecting animation: {}", e);
        }

        let mut attempts = 0u64;
        while !connectivity.is_online() {
            attempts += 1;
            log::debug!("Startup: Network unreachable (attempt {})", attempts);
            thread::sleep(self.timing.probe_interval);
        }
        online.set();
        if let Ok(handle) = animation {
            let _ = handle.join();
        }

        log::info!("Startup: Network connected");
        self.animator.play_once(&self.assets.connected);
        thread::sleep(self.timing.connected_hold);
    }

    /// Loop the loading animation until the player is ready and the minimum
    /// duration has elapsed.
    fn run_loading(&self) {
        log::info!("Startup: Loading");
        match self.flags.start_min_duration_timer(self.timing.min_loading) {
            Ok(_) => {}
            Err(e) => {
                log::error!("Startup: Could not start loading timer, not waiting: {}", e);
                self.flags.min_duration_elapsed.set();
            }
        }

        let animation = {
            let flags = self.flags.clone();
            self.animator
                .spawn_until(self.assets.loading.clone(), move || flags.loading_done())
        };
        if let Err(e) = &animation {
            log::error!("Startup: Could not start loading animation: {}", e);
        }

        let gate = ReadinessGate::new(self.flags.clone());
        gate.wait_then(|| log::info!("Startup: Player ready and minimum loading time passed"));

        if let Ok(handle) = animation {
            let _ = handle.join();
        }
    }

    /// Play the ready animation once, then loop the ready loop until the
    /// interrupt is requested. The interrupt is set on return either way, so
    /// a skipped loop leaves no wake command to be swallowed later.
    fn run_ready(&self, first_time_user: bool) {
        let ready = if first_time_user {
            log::info!("Startup: Showing ready sequence for a new user");
            &self.assets.ready_new
        } else {
            &self.assets.ready
        };
        self.animator.play_once(ready);

        let flags = &self.flags;
        let looped = self
            .animator
            .play_until(&self.assets.ready_loop, || flags.interrupt_requested.is_set());
        if !looped {
            log::warn!("Startup: Ready loop unavailable, handing over immediately");
        }
        flags.request_interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::FrameSink;
    use crate::playback::{PlayStatus, PlaybackState};
    use crate::dispatch::{CommandHandler, Dispatcher};
    use crate::manager::{ModeManager, PlaybackPolicy};
    use crate::testing::{
        recording_screens, EventLog, FakeLoader, RecordingPlayer, RecordingSink, SinkEvent,
    };
    use crate::{Command, Mode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const LOGO: u8 = 1;
    const LOADING: u8 = 2;
    const CONNECTING: u8 = 3;
    const CONNECTED: u8 = 4;
    const READY_NEW: u8 = 5;
    const READY: u8 = 6;
    const READY_LOOP: u8 = 7;

    fn assets() -> StartupAssets {
        StartupAssets {
            logo: "logo.png".into(),
            connecting: "connecting.gif".into(),
            connected: "connected.gif".into(),
            loading: "loading.gif".into(),
            ready_new: "ready_new.gif".into(),
            ready: "ready.gif".into(),
            ready_loop: "ready_loop.gif".into(),
        }
    }

    fn loader() -> FakeLoader {
        let frame = Duration::from_millis(2);
        FakeLoader::default()
            .with("logo.png", LOGO, 1, frame)
            .with("loading.gif", LOADING, 3, frame)
            .with("connecting.gif", CONNECTING, 3, frame)
            .with("connected.gif", CONNECTED, 2, frame)
            .with("ready_new.gif", READY_NEW, 2, frame)
            .with("ready.gif", READY, 2, frame)
            .with("ready_loop.gif", READY_LOOP, 3, frame)
    }

    fn timing() -> StartupTiming {
        StartupTiming {
            logo_hold: Duration::from_millis(5),
            min_loading: Duration::from_millis(20),
            connected_hold: Duration::from_millis(5),
            probe_interval: Duration::from_millis(2),
        }
    }

    /// Phases in the order they reached the display, consecutive frames of
    /// the same asset collapsed.
    fn phases(sink: &RecordingSink) -> Vec<u8> {
        let mut phases = sink.frame_tags();
        phases.dedup();
        phases
    }

    /// Offline for the first `offline` probes.
    struct ScriptedNetwork {
        offline: usize,
        probes: AtomicUsize,
    }

    impl Connectivity for ScriptedNetwork {
        fn is_online(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst) >= self.offline
        }
    }

    fn sequence(
        loader: FakeLoader,
        marker: SeenReadyMarker,
    ) -> (StartupSequence, Arc<ReadinessFlags>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let animator = Arc::new(Animator::new(
            Arc::new(loader),
            sink.clone() as Arc<dyn FrameSink>,
        ));
        let flags = ReadinessFlags::new();
        let sequence = StartupSequence::new(animator, flags.clone(), assets(), timing(), marker);
        (sequence, flags, sink)
    }

    /// Player comes up after `ready_after`, starts playing after `play_after`.
    fn player(flags: &Arc<ReadinessFlags>, ready_after: Duration, play_after: Duration) {
        let flags = flags.clone();
        thread::spawn(move || {
            thread::sleep(ready_after);
            flags.observe_state(&PlaybackState::with_status(PlayStatus::Stop));
            thread::sleep(play_after);
            flags.observe_state(&PlaybackState::with_status(PlayStatus::Play));
        });
    }

    #[test]
    fn test_returning_user_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let marker = SeenReadyMarker::new(dir.path().join("seen"));
        marker.mark_seen().unwrap();
        let (sequence, flags, sink) = sequence(loader(), marker);
        player(&flags, Duration::from_millis(30), Duration::from_millis(100));

        let outcome = sequence.run();
        assert_eq!(
            outcome,
            StartupOutcome {
                first_run: false,
                first_time_user: false
            }
        );
        assert_eq!(phases(&sink), vec![LOGO, LOADING, READY, READY_LOOP]);
        assert!(sink.events().contains(&SinkEvent::Clear));
        assert!(flags.interrupt_requested.is_set());
    }

    #[test]
    fn test_first_run_waits_for_network_and_marks_seen() {
        let dir = tempfile::tempdir().unwrap();
        let marker = SeenReadyMarker::new(dir.path().join("seen"));
        let (sequence, flags, sink) = sequence(loader(), marker.clone());
        let network = Arc::new(ScriptedNetwork {
            offline: 10,
            probes: AtomicUsize::new(0),
        });
        let sequence = sequence.with_network_wait(network.clone());
        player(&flags, Duration::ZERO, Duration::from_millis(200));

        let outcome = sequence.run();
        assert_eq!(
            outcome,
            StartupOutcome {
                first_run: true,
                first_time_user: true
            }
        );
        assert_eq!(network.probes.load(Ordering::SeqCst), 11);
        let phases = phases(&sink);
        assert_eq!(phases[0], CONNECTING);
        assert_eq!(phases[1], CONNECTED);
        assert_eq!(phases[2], LOGO);
        assert_eq!(phases[phases.len() - 2..], [READY_NEW, READY_LOOP]);
        assert!(marker.has_seen());
    }

    #[test]
    fn test_missing_assets_do_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let marker = SeenReadyMarker::new(dir.path().join("seen"));
        let (sequence, flags, sink) = sequence(FakeLoader::default(), marker.clone());
        flags.service_ready.set();

        // No interrupt ever arrives: the ready loop is skipped with its asset.
        let outcome = sequence.run();
        assert!(outcome.first_time_user);
        assert!(sink.frame_tags().is_empty());
        assert!(flags.min_duration_elapsed.is_set());
        assert!(flags.interrupt_requested.is_set());
        assert!(marker.has_seen());
    }

    #[test]
    fn test_first_command_after_skipped_ready_loop_is_handled() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FakeLoader::default().with("loading.gif", LOADING, 2, Duration::from_millis(2));
        let (sequence, flags, _sink) =
            sequence(loader, SeenReadyMarker::new(dir.path().join("seen")));
        flags.service_ready.set();
        sequence.run();

        let log = EventLog::default();
        let manager = ModeManager::new(recording_screens(&log), PlaybackPolicy::default());
        let player = Arc::new(RecordingPlayer::new(&log));
        let dispatcher = Dispatcher::full(flags, manager.clone(), player.clone(), player);
        dispatcher.handle(Command::Menu);
        assert_eq!(manager.get_mode(), Mode::Menu);
    }

    #[test]
    fn test_loading_waits_for_player() {
        let dir = tempfile::tempdir().unwrap();
        let (sequence, flags, _sink) =
            sequence(loader(), SeenReadyMarker::new(dir.path().join("seen")));
        let started = Instant::now();
        player(&flags, Duration::from_millis(100), Duration::ZERO);

        sequence.run();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_playback_interrupt_ends_ready_loop_within_a_frame() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Duration::from_millis(25);
        let loader = loader().with("ready_loop.gif", READY_LOOP, 40, frame);
        let (sequence, flags, sink) =
            sequence(loader, SeenReadyMarker::new(dir.path().join("seen")));
        flags.service_ready.set();

        let interrupted_at = Arc::new(std::sync::Mutex::new(None));
        {
            let flags = flags.clone();
            let sink = sink.clone();
            let interrupted_at = interrupted_at.clone();
            thread::spawn(move || {
                while !sink.frame_tags().contains(&READY_LOOP) {
                    thread::sleep(Duration::from_millis(1));
                }
                thread::sleep(Duration::from_millis(60));
                *interrupted_at.lock().unwrap() = Some(Instant::now());
                flags.observe_state(&PlaybackState::with_status(PlayStatus::Play));
            });
        }

        sequence.run();
        let interrupted_at = interrupted_at.lock().unwrap().unwrap();
        assert!(interrupted_at.elapsed() < frame * 4);
    }
}
