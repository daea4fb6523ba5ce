//! Testing utilities for the wire protocol.
//!
//! This module provides an in-memory [`Transport`](crate::Transport) and helpers
//! that build response frames the way the debug server does.

mod memory;

pub use memory::MemoryTransport;

use uvm_types::RegisterId;

use crate::{RESPONSE_MAGIC, ServerError};

/// Construct a response frame with the given opcode byte and payload.
///
/// # Example
///
/// ```
/// use transport::{Opcode, Response, testing::response_frame};
///
/// let frame = response_frame(0x01, &[]);
/// let response = Response::parse(&frame).unwrap();
/// assert_eq!(response.opcode, Opcode::OpenSession);
/// ```
pub fn response_frame(opcode: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = RESPONSE_MAGIC.to_le_bytes().to_vec();
    frame.push(opcode);
    frame.extend_from_slice(payload);
    frame
}

/// Construct an `ERROR` response carrying `code`.
pub fn error_frame(code: u8) -> Vec<u8> {
    response_frame(0xEE, &[code])
}

/// Construct a `RUNTIME_ERROR` response carrying `subcode`.
pub fn runtime_error_frame(subcode: u8) -> Vec<u8> {
    response_frame(0xEE, &[ServerError::RUNTIME_ERROR_CODE, subcode])
}

/// Construct a register-bearing response.
///
/// Every register is included in id order; registers missing from `values` are
/// zero. `console` is appended after the register block.
pub fn register_frame(opcode: u8, values: &[(u8, u64)], console: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    for register in RegisterId::all() {
        let value = values
            .iter()
            .find(|(id, _)| *id == register.raw())
            .map(|(_, value)| *value)
            .unwrap_or(0);
        payload.push(register.raw());
        payload.extend_from_slice(&value.to_le_bytes());
    }
    payload.extend_from_slice(console);
    response_frame(opcode, &payload)
}
