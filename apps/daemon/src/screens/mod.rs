//! Screens shown by the Mode Manager.

pub mod clock;
pub mod list_menu;
pub mod now_playing;

use std::sync::Arc;

use cyfi_config::ClockConfig;
use cyfi_core::{FrameSink, MenuScreen, Mode, Navigator, Screen, ScreenSet};

pub use clock::ClockScreen;
pub use list_menu::ListMenuScreen;
pub use now_playing::NowPlayingScreen;

/// Assemble the screen for every mode.
pub fn build(
    navigator: Navigator,
    display: Arc<dyn FrameSink>,
    clock: &ClockConfig,
    now_playing: Arc<NowPlayingScreen>,
) -> ScreenSet {
    let clock_screen: Arc<dyn Screen> = Arc::new(ClockScreen::new(clock, display.clone()));
    ScreenSet::from_factories(
        |mode| match mode {
            Mode::NowPlaying => now_playing.clone() as Arc<dyn Screen>,
            _ => clock_screen.clone(),
        },
        |mode| {
            Arc::new(ListMenuScreen::new(
                mode,
                list_menu::items_for(mode),
                navigator.clone(),
                display.clone(),
            )) as Arc<dyn MenuScreen>
        },
    )
}
