use bytes::{Buf, Bytes};
use uvm_types::{REGISTER_COUNT, RegisterId, RuntimeErrorKind};

use crate::{HEADER_LEN, Opcode, ProtocolError, RESPONSE_MAGIC, ServerError};

/// Width of one `[id][value]` entry in a register block.
pub const REGISTER_ENTRY_LEN: usize = 9;

/// Width of the register block carried by register-bearing responses.
pub const REGISTER_BLOCK_LEN: usize = REGISTER_COUNT * REGISTER_ENTRY_LEN;

/// Register values and program output carried by a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSnapshot {
    /// Raw register values in block order
    pub registers: Vec<(RegisterId, u64)>,
    /// Bytes the program wrote to stdout since the previous response
    pub console: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Empty,
    Registers(RegisterSnapshot),
    Error(ServerError),
}

/// A parsed response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub opcode: Opcode,
    pub payload: Payload,
}

impl Response {
    /// Parse a response frame.
    ///
    /// The whole frame is validated before anything is returned.
    pub fn parse(frame: &[u8]) -> Result<Response, ProtocolError> {
        let truncated = |needed| ProtocolError::Truncated {
            len: frame.len(),
            needed,
        };
        if frame.len() < HEADER_LEN {
            return Err(truncated(HEADER_LEN));
        }

        let mut buf = frame;
        let magic = buf.get_u64_le();
        if magic != RESPONSE_MAGIC {
            return Err(ProtocolError::BadMagic { found: magic });
        }
        let raw_opcode = buf.get_u8();
        let opcode =
            Opcode::try_from(raw_opcode).map_err(|_| ProtocolError::UnknownOpcode(raw_opcode))?;

        let payload = if opcode == Opcode::Error {
            if !buf.has_remaining() {
                return Err(truncated(HEADER_LEN + 1));
            }
            Payload::Error(parse_error(buf.get_u8(), &mut buf, frame.len())?)
        } else if opcode.carries_registers() {
            if buf.remaining() < REGISTER_BLOCK_LEN {
                return Err(truncated(HEADER_LEN + REGISTER_BLOCK_LEN));
            }
            let mut registers = Vec::with_capacity(REGISTER_COUNT);
            // ids are below 64; a full block names every register once
            let mut seen = 0u64;
            for _ in 0..REGISTER_COUNT {
                let id = buf.get_u8();
                let register = RegisterId::new(id).ok_or(ProtocolError::UnknownRegister(id))?;
                let bit = 1u64 << id;
                if seen & bit != 0 {
                    return Err(ProtocolError::DuplicateRegister(id));
                }
                seen |= bit;
                registers.push((register, buf.get_u64_le()));
            }
            Payload::Registers(RegisterSnapshot {
                registers,
                console: Bytes::copy_from_slice(buf),
            })
        } else {
            Payload::Empty
        };

        Ok(Response { opcode, payload })
    }
}

fn parse_error(code: u8, buf: &mut &[u8], len: usize) -> Result<ServerError, ProtocolError> {
    let error = match code {
        1 => ServerError::AlreadyInSession,
        2 => ServerError::NotInSession,
        ServerError::RUNTIME_ERROR_CODE => {
            if !buf.has_remaining() {
                return Err(ProtocolError::Truncated {
                    len,
                    needed: HEADER_LEN + 2,
                });
            }
            let subcode = buf.get_u8();
            let kind = RuntimeErrorKind::try_from(subcode)
                .map_err(|_| ProtocolError::UnknownRuntimeError(subcode))?;
            ServerError::Runtime(kind)
        }
        4 => ServerError::FileFormat,
        5 => ServerError::BreakpointAlreadySet,
        6 => ServerError::BreakpointNotExisting,
        other => return Err(ProtocolError::UnknownErrorCode(other)),
    };
    Ok(error)
}
