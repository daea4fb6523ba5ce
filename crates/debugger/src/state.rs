use std::fmt;

use crate::registers::RegisterSlot;

/// Where the debug session is in its lifecycle.
///
/// Only server responses and a successful image load move the session between
/// states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Closed,
    Open,
    FileLoaded,
    Running,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Closed => "closed",
            SessionState::Open => "open",
            SessionState::FileLoaded => "file loaded",
            SessionState::Running => "running",
        };
        f.write_str(name)
    }
}

/// Notifications published by the [`Debugger`](crate::Debugger).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StateChanged(SessionState),
    /// A register-bearing response updated the bank
    Registers(Vec<RegisterSlot>),
    /// The breakpoint set after a toggle, in address order
    Breakpoints(Vec<u64>),
    /// An image was parsed and disassembled
    ImageLoaded { entry_address: u64, lines: usize },
    /// A status or error line for the debug console
    Console(String),
    /// Text the program wrote to stdout
    Output(String),
}

impl From<SessionState> for Event {
    fn from(value: SessionState) -> Self {
        Event::StateChanged(value)
    }
}
