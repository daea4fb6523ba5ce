use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{HEADER_LEN, Opcode, ProtocolError, REQUEST_MAGIC};

/// A request to the debug server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    OpenSession,
    CloseSession,
    GetRegisters,
    SetBreakpoint(u64),
    RemoveBreakpoint(u64),
    /// Load and start the given executable image
    Run(Bytes),
    NextInstruction,
    Continue,
    Stop,
}

impl Request {
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::OpenSession => Opcode::OpenSession,
            Request::CloseSession => Opcode::CloseSession,
            Request::GetRegisters => Opcode::GetRegisters,
            Request::SetBreakpoint(_) => Opcode::SetBreakpoint,
            Request::RemoveBreakpoint(_) => Opcode::RemoveBreakpoint,
            Request::Run(_) => Opcode::Run,
            Request::NextInstruction => Opcode::NextInstruction,
            Request::Continue => Opcode::Continue,
            Request::Stop => Opcode::Stop,
        }
    }

    /// Encode the request as a complete frame.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let body_len = match self {
            Request::SetBreakpoint(_) | Request::RemoveBreakpoint(_) => 8,
            Request::Run(file) => 4 + file.len(),
            _ => 0,
        };

        let mut buf = BytesMut::with_capacity(HEADER_LEN + body_len);
        buf.put_u64(REQUEST_MAGIC);
        buf.put_u8(self.opcode() as u8);
        match self {
            Request::SetBreakpoint(address) | Request::RemoveBreakpoint(address) => {
                buf.put_u64_le(*address);
            }
            Request::Run(file) => {
                let len = u32::try_from(file.len())
                    .map_err(|_| ProtocolError::RequestTooLarge { len: file.len() })?;
                buf.put_u32_le(len);
                buf.put_slice(file);
            }
            _ => {}
        }
        Ok(buf.freeze())
    }

    /// Parse a request frame, as the debug server would.
    pub fn parse(frame: &[u8]) -> Result<Request, ProtocolError> {
        let truncated = |needed| ProtocolError::Truncated {
            len: frame.len(),
            needed,
        };
        if frame.len() < HEADER_LEN {
            return Err(truncated(HEADER_LEN));
        }

        let mut buf = frame;
        let magic = buf.get_u64();
        if magic != REQUEST_MAGIC {
            return Err(ProtocolError::BadMagic { found: magic });
        }
        let raw_opcode = buf.get_u8();
        let opcode =
            Opcode::try_from(raw_opcode).map_err(|_| ProtocolError::UnknownOpcode(raw_opcode))?;

        let request = match opcode {
            Opcode::OpenSession => Request::OpenSession,
            Opcode::CloseSession => Request::CloseSession,
            Opcode::GetRegisters => Request::GetRegisters,
            Opcode::NextInstruction => Request::NextInstruction,
            Opcode::Continue => Request::Continue,
            Opcode::Stop => Request::Stop,
            Opcode::SetBreakpoint | Opcode::RemoveBreakpoint => {
                if buf.remaining() < 8 {
                    return Err(truncated(HEADER_LEN + 8));
                }
                let address = buf.get_u64_le();
                if opcode == Opcode::SetBreakpoint {
                    Request::SetBreakpoint(address)
                } else {
                    Request::RemoveBreakpoint(address)
                }
            }
            Opcode::Run => {
                if buf.remaining() < 4 {
                    return Err(truncated(HEADER_LEN + 4));
                }
                let len = buf.get_u32_le() as usize;
                if buf.remaining() < len {
                    return Err(truncated(HEADER_LEN + 4 + len));
                }
                Request::Run(Bytes::copy_from_slice(&buf[..len]))
            }
            Opcode::Error | Opcode::ExecutionFinished => {
                return Err(ProtocolError::UnknownOpcode(raw_opcode));
            }
        };
        Ok(request)
    }
}
