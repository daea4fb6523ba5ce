use disasm::DecodeError;
use image::FormatError;
use transport::{Opcode, ProtocolError, ServerError, TransportError};

/// Everything a [`Debugger`](crate::Debugger) operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid image: {0}")]
    Format(#[from] FormatError),

    #[error("cannot disassemble image: {0}")]
    Decode(#[from] DecodeError),

    #[error("malformed response: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("server reported {0}")]
    Server(#[from] ServerError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A well formed response whose opcode does not answer the request
    #[error("unexpected {found} response to {expected}")]
    UnexpectedResponse { expected: Opcode, found: Opcode },

    #[error("no image loaded")]
    NoImageLoaded,

    #[error("operation cancelled")]
    Cancelled,
}
