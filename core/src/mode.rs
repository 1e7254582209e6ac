//! Modes & Transitions
//!
//! The closed set of UI modes the player can be in, the navigation tree that
//! gives every menu-like mode a parent, and the deterministic transition rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named, mutually-exclusive UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Root mode, shown when idle
    Clock,
    /// Track details while the player is busy
    NowPlaying,
    /// Top-level menu
    Menu,
    Library,
    Playlists,
    Tidal,
    Qobuz,
    Spotify,
    RadioManager,
    MotherEarthRadio,
    RadioParadise,
    ConfigMenu,
    DisplayMenu,
    ClockMenu,
    RemoteMenu,
    ScreensaverMenu,
    SystemUpdate,
    SystemInfo,
}

impl Mode {
    /// Every mode, root first, in navigation-tree order.
    pub const ALL: [Mode; 18] = [
        Mode::Clock,
        Mode::NowPlaying,
        Mode::Menu,
        Mode::Library,
        Mode::Playlists,
        Mode::Tidal,
        Mode::Qobuz,
        Mode::Spotify,
        Mode::RadioManager,
        Mode::MotherEarthRadio,
        Mode::RadioParadise,
        Mode::ConfigMenu,
        Mode::DisplayMenu,
        Mode::ClockMenu,
        Mode::RemoteMenu,
        Mode::ScreensaverMenu,
        Mode::SystemUpdate,
        Mode::SystemInfo,
    ];

    /// The root mode back-navigation bottoms out in.
    pub const ROOT: Mode = Mode::Clock;

    pub fn name(self) -> &'static str {
        match self {
            Mode::Clock => "clock",
            Mode::NowPlaying => "nowplaying",
            Mode::Menu => "menu",
            Mode::Library => "library",
            Mode::Playlists => "playlists",
            Mode::Tidal => "tidal",
            Mode::Qobuz => "qobuz",
            Mode::Spotify => "spotify",
            Mode::RadioManager => "radiomanager",
            Mode::MotherEarthRadio => "motherearthradio",
            Mode::RadioParadise => "radioparadise",
            Mode::ConfigMenu => "configmenu",
            Mode::DisplayMenu => "displaymenu",
            Mode::ClockMenu => "clockmenu",
            Mode::RemoteMenu => "remotemenu",
            Mode::ScreensaverMenu => "screensavermenu",
            Mode::SystemUpdate => "systemupdate",
            Mode::SystemInfo => "systeminfo",
        }
    }

    /// Menu-like modes accept `select` / `scroll` and participate in back-navigation.
    pub fn is_menu_like(self) -> bool {
        !matches!(self, Mode::Clock | Mode::NowPlaying)
    }

    /// Designated parent in the navigation tree.
    pub fn parent(self) -> Option<Mode> {
        match self {
            Mode::Clock | Mode::NowPlaying => None,
            Mode::Menu => Some(Mode::Clock),
            Mode::Library
            | Mode::Playlists
            | Mode::Tidal
            | Mode::Qobuz
            | Mode::Spotify
            | Mode::RadioManager
            | Mode::MotherEarthRadio
            | Mode::RadioParadise
            | Mode::ConfigMenu => Some(Mode::Menu),
            Mode::DisplayMenu
            | Mode::ClockMenu
            | Mode::RemoteMenu
            | Mode::ScreensaverMenu
            | Mode::SystemUpdate
            | Mode::SystemInfo => Some(Mode::ConfigMenu),
        }
    }

    /// Direct children of this mode in the navigation tree.
    pub fn children(self) -> Vec<Mode> {
        Mode::ALL
            .iter()
            .copied()
            .filter(|m| m.is_menu_like() && m.parent() == Some(self))
            .collect()
    }

    /// Human-readable label used by menu entries.
    pub fn title(self) -> &'static str {
        match self {
            Mode::Clock => "Clock",
            Mode::NowPlaying => "Now Playing",
            Mode::Menu => "Menu",
            Mode::Library => "Library",
            Mode::Playlists => "Playlists",
            Mode::Tidal => "Tidal",
            Mode::Qobuz => "Qobuz",
            Mode::Spotify => "Spotify",
            Mode::RadioManager => "Web Radio",
            Mode::MotherEarthRadio => "Mother Earth",
            Mode::RadioParadise => "Radio Paradise",
            Mode::ConfigMenu => "Settings",
            Mode::DisplayMenu => "Display",
            Mode::ClockMenu => "Clock",
            Mode::RemoteMenu => "Remote",
            Mode::ScreensaverMenu => "Screensaver",
            Mode::SystemUpdate => "System Update",
            Mode::SystemInfo => "System Info",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// A named event that may move the machine to another mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    ToClock,
    ToMenu,
    ToNowPlaying,
    /// `to_<mode>`: open a menu-like child of the current mode
    To(Mode),
    Back,
}

impl Transition {
    /// Event name as used in logs (`to_clock`, `to_library`, `back`, ...).
    pub fn event_name(&self) -> String {
        match self {
            Transition::ToClock => "to_clock".to_string(),
            Transition::ToMenu => "to_menu".to_string(),
            Transition::ToNowPlaying => "to_nowplaying".to_string(),
            Transition::To(mode) => format!("to_{}", mode.name()),
            Transition::Back => "back".to_string(),
        }
    }

    /// Resolve the target mode for `(current, self)`, or `None` when no rule applies.
    pub fn resolve(self, current: Mode) -> Option<Mode> {
        let target = match self {
            Transition::ToClock => Mode::Clock,
            Transition::ToMenu => Mode::Menu,
            Transition::ToNowPlaying => Mode::NowPlaying,
            Transition::To(target) => {
                // Menu-like targets open only from their parent; plain targets from anywhere.
                if target.is_menu_like() && target.parent() != Some(current) {
                    return None;
                }
                target
            }
            Transition::Back => {
                if !current.is_menu_like() {
                    return None;
                }
                current.parent().unwrap_or(Mode::ROOT)
            }
        };
        (target != current).then_some(target)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.event_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.name().parse::<Mode>(), Ok(mode));
        }
        assert!("jukebox".parse::<Mode>().is_err());
    }

    #[test]
    fn test_every_menu_like_mode_reaches_root() {
        for mode in Mode::ALL.iter().copied().filter(|m| m.is_menu_like()) {
            let mut cursor = mode;
            let mut hops = 0;
            while let Some(parent) = cursor.parent() {
                cursor = parent;
                hops += 1;
                assert!(hops <= Mode::ALL.len(), "cycle above {mode}");
            }
            assert_eq!(cursor, Mode::ROOT);
        }
    }

    #[test]
    fn test_back_resolution() {
        assert_eq!(Transition::Back.resolve(Mode::Library), Some(Mode::Menu));
        assert_eq!(Transition::Back.resolve(Mode::DisplayMenu), Some(Mode::ConfigMenu));
        assert_eq!(Transition::Back.resolve(Mode::Menu), Some(Mode::Clock));
        assert_eq!(Transition::Back.resolve(Mode::Clock), None);
        assert_eq!(Transition::Back.resolve(Mode::NowPlaying), None);
    }

    #[test]
    fn test_child_transitions_are_guarded_by_parent() {
        assert_eq!(Transition::To(Mode::Library).resolve(Mode::Menu), Some(Mode::Library));
        assert_eq!(Transition::To(Mode::Library).resolve(Mode::Clock), None);
        assert_eq!(
            Transition::To(Mode::SystemInfo).resolve(Mode::ConfigMenu),
            Some(Mode::SystemInfo)
        );
        assert_eq!(Transition::To(Mode::SystemInfo).resolve(Mode::Menu), None);
        assert_eq!(Transition::To(Mode::NowPlaying).resolve(Mode::Library), Some(Mode::NowPlaying));
    }

    #[test]
    fn test_self_transition_is_unresolved() {
        assert_eq!(Transition::ToClock.resolve(Mode::Clock), None);
        assert_eq!(Transition::ToMenu.resolve(Mode::Menu), None);
        assert_eq!(Transition::ToMenu.resolve(Mode::Tidal), Some(Mode::Menu));
    }

    #[test]
    fn test_children() {
        assert_eq!(Mode::Menu.children().len(), 9);
        assert!(Mode::ConfigMenu.children().contains(&Mode::SystemUpdate));
        assert!(Mode::Clock.children().contains(&Mode::Menu));
        assert!(Mode::Library.children().is_empty());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(Transition::To(Mode::RadioParadise).event_name(), "to_radioparadise");
        assert_eq!(Transition::Back.to_string(), "back");
    }
}
