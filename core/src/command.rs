//! Command vocabulary of the local command channel.

use std::fmt;

/// Tokens accepted on the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Home,
    Shutdown,
    Menu,
    Toggle,
    Repeat,
    Select,
    /// Remote "OK" key; only meaningful as a wake command during boot
    Ok,
    ScrollLeft,
    ScrollRight,
    ScrollUp,
    ScrollDown,
    VolumePlus,
    VolumeMinus,
    Back,
}

impl Command {
    pub const ALL: [Command; 14] = [
        Command::Home,
        Command::Shutdown,
        Command::Menu,
        Command::Toggle,
        Command::Repeat,
        Command::Select,
        Command::Ok,
        Command::ScrollLeft,
        Command::ScrollRight,
        Command::ScrollUp,
        Command::ScrollDown,
        Command::VolumePlus,
        Command::VolumeMinus,
        Command::Back,
    ];

    /// Parse one token. Surrounding whitespace is ignored; matching is exact.
    pub fn parse(token: &str) -> Option<Command> {
        let token = token.trim();
        Self::ALL.iter().copied().find(|c| c.token() == token)
    }

    pub fn token(self) -> &'static str {
        match self {
            Command::Home => "home",
            Command::Shutdown => "shutdown",
            Command::Menu => "menu",
            Command::Toggle => "toggle",
            Command::Repeat => "repeat",
            Command::Select => "select",
            Command::Ok => "ok",
            Command::ScrollLeft => "scroll_left",
            Command::ScrollRight => "scroll_right",
            Command::ScrollUp => "scroll_up",
            Command::ScrollDown => "scroll_down",
            Command::VolumePlus => "volume_plus",
            Command::VolumeMinus => "volume_minus",
            Command::Back => "back",
        }
    }

    /// Commands that end the startup "ready" animation.
    pub fn is_wake(self) -> bool {
        matches!(self, Command::Menu | Command::Select | Command::Ok | Command::Toggle)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Extract the command token from a raw payload: first line, NUL
/// terminator and surrounding whitespace stripped. `None` when empty.
pub fn extract_token(payload: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(payload);
    let line = text.split(['\n', '\0']).next().unwrap_or("").trim();
    (!line.is_empty()).then(|| line.to_string())
}
