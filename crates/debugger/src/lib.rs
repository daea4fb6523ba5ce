//! High level debugger client for the VM debug server
//!
//! [`Debugger`] owns the session state, the register bank, the breakpoint set
//! and the loaded image. Every change is published as an [`Event`] so a view
//! can follow along without polling.
mod async_event;
mod debugger;
mod error;
mod internals;
mod registers;
pub(crate) mod state;

pub use async_event::AsyncEventReceiver;
pub use debugger::{DEFAULT_RETRY_INTERVAL, Debugger};
pub use error::ClientError;
pub use internals::LoadedImage;
pub use registers::{RegisterBank, RegisterSlot};
pub use state::{Event, SessionState};
