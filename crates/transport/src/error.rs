//! Error types for the wire protocol.

use uvm_types::RuntimeErrorKind;

/// A frame that does not follow the wire format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The frame ends before a required field.
    #[error("frame truncated: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },

    /// The frame does not start with the expected magic number.
    #[error("bad magic {found:#018x}")]
    BadMagic { found: u64 },

    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("unknown error code {0:#04x}")]
    UnknownErrorCode(u8),

    #[error("unknown runtime error {0:#04x}")]
    UnknownRuntimeError(u8),

    #[error("unknown register id {0:#04x} in register block")]
    UnknownRegister(u8),

    #[error("register id {0:#04x} appears twice in register block")]
    DuplicateRegister(u8),

    /// A RUN body longer than its 32 bit length prefix can describe.
    #[error("file of {len} bytes is too large to send")]
    RequestTooLarge { len: usize },
}

/// An error reported by the debug server in an `ERROR` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ServerError {
    #[error("ALREADY_IN_SESSION")]
    AlreadyInSession,
    #[error("NOT_IN_SESSION")]
    NotInSession,
    #[error("RUNTIME_ERROR ({0})")]
    Runtime(RuntimeErrorKind),
    #[error("FILE_FORMAT_ERROR")]
    FileFormat,
    #[error("BREAKPOINT_ALREADY_SET")]
    BreakpointAlreadySet,
    #[error("BREAKPOINT_NOT_EXISTING")]
    BreakpointNotExisting,
}

impl ServerError {
    pub const RUNTIME_ERROR_CODE: u8 = 3;

    /// The error code byte on the wire
    pub fn code(&self) -> u8 {
        match self {
            ServerError::AlreadyInSession => 1,
            ServerError::NotInSession => 2,
            ServerError::Runtime(_) => Self::RUNTIME_ERROR_CODE,
            ServerError::FileFormat => 4,
            ServerError::BreakpointAlreadySet => 5,
            ServerError::BreakpointNotExisting => 6,
        }
    }
}

/// The exchange with the debug server did not complete.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}
