//! Table driven disassembler for the VM's bytecode.
//!
//! The instruction [`catalog`] is expanded once from the declarative encoding
//! table in [`encoding`] and shared for the life of the process. [`disassemble`]
//! walks the code section of an [`image::ExecutableImage`] and renders one
//! [`DisassembledLine`] per instruction.
mod catalog;
mod disassembler;
pub mod encoding;

pub use catalog::{Catalog, CatalogError, Instruction, OperandKind, build_catalog, catalog};
pub use disassembler::{DecodeError, DisassembledLine, decode, disassemble};
