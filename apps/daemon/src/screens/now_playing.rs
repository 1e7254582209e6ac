//! Now-playing screen: renders the latest player snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cyfi_core::{FrameSink, PlayStatus, PlaybackState, Screen};

pub struct NowPlayingScreen {
    display: Arc<dyn FrameSink>,
    state: Mutex<Option<PlaybackState>>,
    active: AtomicBool,
}

impl NowPlayingScreen {
    pub fn new(display: Arc<dyn FrameSink>) -> Self {
        Self {
            display,
            state: Mutex::new(None),
            active: AtomicBool::new(false),
        }
    }

    /// Feed a snapshot; redraws if the screen is showing.
    pub fn update(&self, state: &PlaybackState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        if self.active.load(Ordering::Acquire) {
            self.render();
        }
    }

    fn render(&self) {
        let lines = match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(state) => lines(state),
            None => vec!["Nothing playing".to_string()],
        };
        self.display.show_text(&lines);
    }
}

impl Screen for NowPlayingScreen {
    fn start_mode(&self) {
        self.active.store(true, Ordering::Release);
        self.render();
    }

    fn stop_mode(&self) {
        self.active.store(false, Ordering::Release);
    }
}

fn lines(state: &PlaybackState) -> Vec<String> {
    let mut lines = vec![state
        .title
        .clone()
        .unwrap_or_else(|| "Unknown title".to_string())];
    lines.extend(state.artist.clone());
    lines.extend(state.album.clone());

    let status = match state.status {
        Some(PlayStatus::Play) => "Playing",
        Some(PlayStatus::Pause) => "Paused",
        Some(PlayStatus::Stop) => "Stopped",
        Some(PlayStatus::Unknown) | None => "",
    };
    let mut footer = status.to_string();
    if let (Some(seek), Some(duration)) = (state.seek, state.duration) {
        // seek is reported in milliseconds, duration in seconds
        footer.push_str(&format!(" {} / {}", clock(seek / 1000.0), clock(duration)));
    }
    if let Some(volume) = state.volume {
        footer.push_str(&format!(" vol {}", volume));
    }
    if state.repeat == Some(true) {
        footer.push_str(" rpt");
    }
    let footer = footer.trim().to_string();
    if !footer.is_empty() {
        lines.push(footer);
    }
    lines
}

fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
