//! Value types shared by the image parser, the disassembler and the debug client.
//!
//! Everything here is a plain description of the virtual machine: register ids and
//! their names, the flag bits of `fl`, the inline type tags used by the instruction
//! encoding and the runtime errors the VM reports through the debug server.
mod address;
mod registers;
mod runtime_error;
mod type_tag;

pub use address::format_vaddr;
pub use registers::{Flags, REGISTER_COUNT, RegisterClass, RegisterId, RegisterValue};
pub use runtime_error::RuntimeErrorKind;
pub use type_tag::TypeTag;

/// A byte that does not map onto any known value of an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:#04x}")]
pub struct UnknownValue {
    /// What the byte was supposed to encode
    pub kind: &'static str,
    /// The byte as read
    pub value: u8,
}
