//! Screen capability contract and the per-mode screen registry.

use std::sync::Arc;

use crate::Mode;

/// Capability every screen implements.
///
/// Both calls must be idempotent: the Mode Manager may stop a screen that
/// already stopped itself (e.g. through the back-sentinel).
pub trait Screen: Send + Sync {
    /// Activate: draw, start timers, subscribe to updates.
    fn start_mode(&self);

    /// Deactivate and release anything `start_mode` acquired.
    fn stop_mode(&self);

    /// Give the screen a chance to consume a back request (e.g. pop one
    /// level of its own submenu). Returns `true` when consumed.
    fn handle_back(&self) -> bool {
        false
    }
}

/// Additional capability of menu-like screens.
pub trait MenuScreen: Screen {
    fn select_item(&self);

    /// Move the selection by `delta` (±1).
    fn scroll_selection(&self, delta: i32);
}

/// Mapping from every [`Mode`] to the object implementing it.
///
/// One field per mode so that the lookups below are exhaustive matches:
/// adding a mode without registering a screen for it does not compile.
pub struct ScreenSet {
    pub clock: Arc<dyn Screen>,
    pub now_playing: Arc<dyn Screen>,
    pub menu: Arc<dyn MenuScreen>,
    pub library: Arc<dyn MenuScreen>,
    pub playlists: Arc<dyn MenuScreen>,
    pub tidal: Arc<dyn MenuScreen>,
    pub qobuz: Arc<dyn MenuScreen>,
    pub spotify: Arc<dyn MenuScreen>,
    pub radio_manager: Arc<dyn MenuScreen>,
    pub mother_earth_radio: Arc<dyn MenuScreen>,
    pub radio_paradise: Arc<dyn MenuScreen>,
    pub config_menu: Arc<dyn MenuScreen>,
    pub display_menu: Arc<dyn MenuScreen>,
    pub clock_menu: Arc<dyn MenuScreen>,
    pub remote_menu: Arc<dyn MenuScreen>,
    pub screensaver_menu: Arc<dyn MenuScreen>,
    pub system_update: Arc<dyn MenuScreen>,
    pub system_info: Arc<dyn MenuScreen>,
}

impl ScreenSet {
    /// Build a set by asking `plain` for the non-menu modes and `menu` for
    /// every menu-like mode.
    pub fn from_factories<P, M>(mut plain: P, mut menu: M) -> Self
    where
        P: FnMut(Mode) -> Arc<dyn Screen>,
        M: FnMut(Mode) -> Arc<dyn MenuScreen>,
    {
        Self {
            clock: plain(Mode::Clock),
            now_playing: plain(Mode::NowPlaying),
            menu: menu(Mode::Menu),
            library: menu(Mode::Library),
            playlists: menu(Mode::Playlists),
            tidal: menu(Mode::Tidal),
            qobuz: menu(Mode::Qobuz),
            spotify: menu(Mode::Spotify),
            radio_manager: menu(Mode::RadioManager),
            mother_earth_radio: menu(Mode::MotherEarthRadio),
            radio_paradise: menu(Mode::RadioParadise),
            config_menu: menu(Mode::ConfigMenu),
            display_menu: menu(Mode::DisplayMenu),
            clock_menu: menu(Mode::ClockMenu),
            remote_menu: menu(Mode::RemoteMenu),
            screensaver_menu: menu(Mode::ScreensaverMenu),
            system_update: menu(Mode::SystemUpdate),
            system_info: menu(Mode::SystemInfo),
        }
    }

    /// Screen registered for `mode`.
    pub fn screen(&self, mode: Mode) -> &dyn Screen {
        match self.slot(mode) {
            Slot::Plain(screen) => screen.as_ref(),
            Slot::Menu(menu) => menu.as_ref(),
        }
    }

    /// Menu capability for `mode`, `None` for plain modes.
    pub fn menu_screen(&self, mode: Mode) -> Option<&dyn MenuScreen> {
        match self.slot(mode) {
            Slot::Plain(_) => None,
            Slot::Menu(menu) => Some(menu.as_ref()),
        }
    }

    fn slot(&self, mode: Mode) -> Slot<'_> {
        let menu = match mode {
            Mode::Clock => return Slot::Plain(&self.clock),
            Mode::NowPlaying => return Slot::Plain(&self.now_playing),
            Mode::Menu => &self.menu,
            Mode::Library => &self.library,
            Mode::Playlists => &self.playlists,
            Mode::Tidal => &self.tidal,
            Mode::Qobuz => &self.qobuz,
            Mode::Spotify => &self.spotify,
            Mode::RadioManager => &self.radio_manager,
            Mode::MotherEarthRadio => &self.mother_earth_radio,
            Mode::RadioParadise => &self.radio_paradise,
            Mode::ConfigMenu => &self.config_menu,
            Mode::DisplayMenu => &self.display_menu,
            Mode::ClockMenu => &self.clock_menu,
            Mode::RemoteMenu => &self.remote_menu,
            Mode::ScreensaverMenu => &self.screensaver_menu,
            Mode::SystemUpdate => &self.system_update,
            Mode::SystemInfo => &self.system_info,
        };
        Slot::Menu(menu)
    }
}

enum Slot<'a> {
    Plain(&'a Arc<dyn Screen>),
    Menu(&'a Arc<dyn MenuScreen>),
}
