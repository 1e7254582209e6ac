//! CyFi display core: modes and navigation, the command channel and the
//! phased startup sequence.

pub mod mode;
pub use mode::{Mode, Transition, UnknownMode};

pub mod screen;
pub use screen::{MenuScreen, Screen, ScreenSet};

pub mod playback;
pub use playback::{
    PlayStatus, PlaybackState, PlayerControl, StateCallback, StateFeed, SystemControl,
};

pub mod manager;
pub use manager::{ModeChangeCallback, ModeManager, Navigator, PlaybackPolicy};

pub mod menu;
pub use menu::{ensure_back_item, handle_menu_select, ItemAction, MenuItem, MenuList, BACK_LABEL};

pub mod command;
pub use command::Command;

pub mod dispatch;
pub use dispatch::{route, Action, CommandHandler, Dispatcher};

pub mod server;
pub use server::{CommandServer, ServerError};

pub mod readiness;
pub use readiness::{Flag, ReadinessFlags, ReadinessGate};

pub mod animation;
pub use animation::{Animation, AnimationError, AnimationLoader, Animator, Frame, FrameSink};

pub mod markers;
pub use markers::{is_first_run, MarkerError, SeenReadyMarker};

pub mod probe;
pub use probe::{Connectivity, TcpProbe};

pub mod startup;
pub use startup::{StartupAssets, StartupOutcome, StartupSequence, StartupTiming};

#[cfg(test)]
mod testing;
