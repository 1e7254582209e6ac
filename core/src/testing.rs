//! Recording fakes shared by unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::animation::{Animation, AnimationError, AnimationLoader, Frame, FrameSink};

use crate::playback::{PlaybackState, PlayerControl, SystemControl};
use crate::screen::{MenuScreen, Screen, ScreenSet};
use crate::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start(Mode),
    Stop(Mode),
    Select(Mode),
    Scroll(Mode, i32),
    /// Player or system command by name
    Player(&'static str),
}

#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
    /// Remaining back requests each mode consumes internally
    consume_back: Arc<Mutex<HashMap<Mode, usize>>>,
}

impl EventLog {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn consume_back(&self, mode: Mode, times: usize) {
        self.consume_back.lock().unwrap().insert(mode, times);
    }
}

pub struct RecordingScreen {
    mode: Mode,
    log: EventLog,
}

impl Screen for RecordingScreen {
    fn start_mode(&self) {
        self.log.push(Event::Start(self.mode));
    }

    fn stop_mode(&self) {
        self.log.push(Event::Stop(self.mode));
    }

    fn handle_back(&self) -> bool {
        let mut remaining = self.log.consume_back.lock().unwrap();
        match remaining.get_mut(&self.mode) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

impl MenuScreen for RecordingScreen {
    fn select_item(&self) {
        self.log.push(Event::Select(self.mode));
    }

    fn scroll_selection(&self, delta: i32) {
        self.log.push(Event::Scroll(self.mode, delta));
    }
}

pub fn recording_screens(log: &EventLog) -> ScreenSet {
    ScreenSet::from_factories(
        |mode| Arc::new(RecordingScreen { mode, log: log.clone() }) as Arc<dyn Screen>,
        |mode| Arc::new(RecordingScreen { mode, log: log.clone() }) as Arc<dyn MenuScreen>,
    )
}

/// Player and system fake recording every command into an [`EventLog`].
pub struct RecordingPlayer {
    log: EventLog,
}

impl RecordingPlayer {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl PlayerControl for RecordingPlayer {
    fn toggle_play_pause(&self) {
        self.log.push(Event::Player("toggle"));
    }

    fn toggle_repeat(&self) {
        self.log.push(Event::Player("repeat"));
    }

    fn volume_up(&self) {
        self.log.push(Event::Player("volume_up"));
    }

    fn volume_down(&self) {
        self.log.push(Event::Player("volume_down"));
    }

    fn current_state(&self) -> Option<PlaybackState> {
        None
    }
}

impl SystemControl for RecordingPlayer {
    fn shutdown(&self) {
        self.log.push(Event::Player("shutdown"));
    }
}

/// Loader serving synthetic animations. Frame `i` of an animation registered
/// with `tag` has pixels `[tag, i]`.
#[derive(Default)]
pub struct FakeLoader {
    animations: HashMap<PathBuf, Animation>,
}

impl FakeLoader {
    pub fn with(mut self, path: &str, tag: u8, frames: usize, delay: Duration) -> Self {
        let frames = (0..frames)
            .map(|i| Frame {
                width: 1,
                height: 1,
                rgba: vec![tag, i as u8],
                delay,
            })
            .collect();
        let animation = Animation::new(Path::new(path), frames).unwrap();
        self.animations.insert(PathBuf::from(path), animation);
        self
    }
}

impl AnimationLoader for FakeLoader {
    fn load(&self, path: &Path) -> Result<Animation, AnimationError> {
        self.animations
            .get(path)
            .cloned()
            .ok_or_else(|| AnimationError::NotFound(path.to_path_buf()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Frame(u8, u8),
    Text(Vec<String>),
    Clear,
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn frame_tags(&self) -> Vec<u8> {
        self.frames().map(|(tag, _)| tag).collect()
    }

    pub fn frame_indices(&self) -> Vec<u8> {
        self.frames().map(|(_, index)| index).collect()
    }

    fn frames(&self) -> impl Iterator<Item = (u8, u8)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Frame(tag, index) => Some((tag, index)),
                _ => None,
            })
    }
}

impl FrameSink for RecordingSink {
    fn show_frame(&self, frame: &Frame) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Frame(frame.rgba[0], frame.rgba[1]));
    }

    fn show_text(&self, lines: &[String]) {
        self.events.lock().unwrap().push(SinkEvent::Text(lines.to_vec()));
    }

    fn clear(&self) {
        self.events.lock().unwrap().push(SinkEvent::Clear);
    }
}
