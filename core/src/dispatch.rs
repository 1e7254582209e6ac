//! Command routing.
//!
//! [`route`] is the pure mapping from `(command, current mode)` to an
//! [`Action`]; [`Dispatcher`] applies it. The dispatcher exists in two
//! phases: during boot it only watches for wake commands, after the Mode
//! Manager is constructed it is rebuilt bound to the manager.

use std::sync::Arc;

use crate::command::Command;
use crate::manager::ModeManager;
use crate::playback::{PlayerControl, SystemControl};
use crate::readiness::ReadinessFlags;
use crate::{Mode, Transition};

/// Receiver of parsed commands, one at a time in arrival order.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, command: Command);
}

/// What a command does in a given mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Trigger(Transition),
    NavigateBack,
    Shutdown,
    TogglePlayback,
    ToggleRepeat,
    VolumeUp,
    VolumeDown,
    /// `select_item` on the screen of this mode
    Select(Mode),
    /// `scroll_selection(delta)` on the screen of this mode
    Scroll { mode: Mode, delta: i32 },
    Ignore,
}

/// Resolve `command` against the current mode.
pub fn route(command: Command, mode: Mode) -> Action {
    match command {
        Command::Home => Action::Trigger(Transition::ToClock),
        Command::Shutdown => Action::Shutdown,
        Command::Toggle => Action::TogglePlayback,
        Command::Repeat => Action::ToggleRepeat,
        Command::VolumePlus => Action::VolumeUp,
        Command::VolumeMinus => Action::VolumeDown,
        Command::Back => Action::NavigateBack,
        Command::Menu if mode == Mode::ROOT => Action::Trigger(Transition::ToMenu),
        Command::Menu => Action::Ignore,
        Command::Select if mode.is_menu_like() => Action::Select(mode),
        // Horizontal scrolling always drives the top-level menu.
        Command::ScrollLeft => Action::Scroll { mode: Mode::Menu, delta: -1 },
        Command::ScrollRight => Action::Scroll { mode: Mode::Menu, delta: 1 },
        Command::ScrollUp if mode.is_menu_like() => Action::Scroll { mode, delta: -1 },
        Command::ScrollDown if mode.is_menu_like() => Action::Scroll { mode, delta: 1 },
        Command::Select | Command::ScrollUp | Command::ScrollDown | Command::Ok => Action::Ignore,
    }
}

enum Phase {
    /// No Mode Manager yet; only wake commands have an effect
    Bootstrap,
    Full {
        manager: Arc<ModeManager>,
        player: Arc<dyn PlayerControl>,
        system: Arc<dyn SystemControl>,
    },
}

pub struct Dispatcher {
    flags: Arc<ReadinessFlags>,
    phase: Phase,
}

impl Dispatcher {
    /// Boot-phase dispatcher: wake commands request the interrupt, the rest
    /// are inert.
    pub fn bootstrap(flags: Arc<ReadinessFlags>) -> Self {
        Self {
            flags,
            phase: Phase::Bootstrap,
        }
    }

    /// Dispatcher bound to the Mode Manager and the player.
    pub fn full(
        flags: Arc<ReadinessFlags>,
        manager: Arc<ModeManager>,
        player: Arc<dyn PlayerControl>,
        system: Arc<dyn SystemControl>,
    ) -> Self {
        Self {
            flags,
            phase: Phase::Full {
                manager,
                player,
                system,
            },
        }
    }

    pub fn is_bootstrap(&self) -> bool {
        matches!(self.phase, Phase::Bootstrap)
    }

    /// A wake command that arrives before the interrupt was requested only
    /// requests it and is consumed.
    fn consume_wake(&self, command: Command) -> bool {
        if !command.is_wake() || self.flags.interrupt_requested.is_set() {
            return false;
        }
        if self.flags.request_interrupt() {
            log::info!("Dispatcher: '{}' requested the startup interrupt", command);
        }
        true
    }

    fn apply(
        &self,
        action: Action,
        manager: &ModeManager,
        player: &dyn PlayerControl,
        system: &dyn SystemControl,
    ) {
        match action {
            Action::Trigger(transition) => {
                manager.trigger(transition);
            }
            Action::NavigateBack => {
                manager.navigate_back();
            }
            Action::Shutdown => {
                manager.stop_active();
                system.shutdown();
            }
            Action::TogglePlayback => player.toggle_play_pause(),
            Action::ToggleRepeat => player.toggle_repeat(),
            Action::VolumeUp => player.volume_up(),
            Action::VolumeDown => player.volume_down(),
            Action::Select(mode) => match manager.screens().menu_screen(mode) {
                Some(screen) => screen.select_item(),
                None => log::warn!("Dispatcher: No select handler for mode '{}'", mode),
            },
            Action::Scroll { mode, delta } => match manager.screens().menu_screen(mode) {
                Some(screen) => screen.scroll_selection(delta),
                None => log::warn!("Dispatcher: No scroll handler for mode '{}'", mode),
            },
            Action::Ignore => {}
        }
    }
}

impl CommandHandler for Dispatcher {
    fn handle(&self, command: Command) {
        if self.consume_wake(command) {
            return;
        }
        match &self.phase {
            Phase::Bootstrap => {
                log::debug!("Dispatcher: '{}' ignored during startup", command);
            }
            Phase::Full {
                manager,
                player,
                system,
            } => {
                let mode = manager.get_mode();
                let action = route(command, mode);
                if action == Action::Ignore {
                    log::info!("Dispatcher: '{}' has no effect in mode '{}'", command, mode);
                    return;
                }
                log::debug!("Dispatcher: '{}' in '{}' -> {:?}", command, mode, action);
                self.apply(action, manager, player.as_ref(), system.as_ref());
            }
        }
    }
}
