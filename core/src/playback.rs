//! Playback state snapshots from the external player and the seams through
//! which the UI controls it.

use serde::{Deserialize, Serialize};

/// Player status as reported by the state feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStatus {
    Play,
    Pause,
    Stop,
    /// Anything else the player reports, including an explicit `unknown`
    #[serde(other)]
    Unknown,
}

/// A state snapshot. Only `status` is relied upon by the core; the rest is
/// carried for screens that display it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    #[serde(default)]
    pub status: Option<PlayStatus>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub seek: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub repeat: Option<bool>,
    #[serde(default)]
    pub random: Option<bool>,
}

impl PlaybackState {
    pub fn with_status(status: PlayStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == Some(PlayStatus::Play)
    }

    /// Any reported status (play, pause, stop or unknown) proves the player
    /// service is up; a snapshot without one does not.
    pub fn has_usable_status(&self) -> bool {
        self.status.is_some()
    }
}

/// Subscriber invoked for every state snapshot the feed delivers.
pub type StateCallback = Box<dyn Fn(&PlaybackState) + Send + Sync>;

/// Callback-style feed of playback state snapshots.
///
/// Delivery order is whatever the player provides; subscribers must tolerate
/// duplicates.
pub trait StateFeed: Send + Sync {
    fn subscribe(&self, callback: StateCallback);
}

/// Player commands reachable from the command channel.
pub trait PlayerControl: Send + Sync {
    fn toggle_play_pause(&self);
    fn toggle_repeat(&self);
    fn volume_up(&self);
    fn volume_down(&self);
    /// Last known snapshot, if any has been received yet.
    fn current_state(&self) -> Option<PlaybackState>;
}

/// Host-level actions (power).
pub trait SystemControl: Send + Sync {
    fn shutdown(&self);
}
