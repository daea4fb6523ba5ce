
use image::ExecutableImage;
use serde::Serialize;
use uvm_types::{RegisterId, TypeTag};

use crate::catalog::{Catalog, OperandKind, catalog};

/// Errors raised while decoding a code section.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("image has no code section")]
    MissingCodeSection,

    #[error("unknown opcode {opcode:#04x} at {address:#x}")]
    UnknownOpcode { opcode: u8, address: u64 },

    #[error("unknown type tag {tag:#04x} in instruction at {address:#x}")]
    UnknownTypeTag { tag: u8, address: u64 },

    #[error("unknown register offset layout {selector:#04x} in instruction at {address:#x}")]
    UnknownSelector { selector: u8, address: u64 },

    #[error("instruction at {address:#x} runs to {end:#x}, past the end of the code at {limit:#x}")]
    Overrun { address: u64, end: u64, limit: u64 },
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisassembledLine {
    /// File offset of the opcode byte
    pub address: u64,
    pub text: String,
    /// Encoded width in bytes
    pub size: usize,
}

/// Disassemble the code section of `image`.
///
/// Decoding stops at the first byte sequence that cannot be decoded; no partial
/// result is returned.
#[tracing::instrument(skip_all)]
pub fn disassemble(image: &ExecutableImage) -> Result<Vec<DisassembledLine>, DecodeError> {
    let section = image
        .code_section()
        .ok_or(DecodeError::MissingCodeSection)?;

    let lines = decode(catalog(), image.bytes(), section.start_addr, section.end_addr())?;
    tracing::debug!(lines = lines.len(), "disassembled code section");
    Ok(lines)
}

/// Decode the instructions in `bytes[start..end]`.
pub fn decode(
    catalog: &Catalog,
    bytes: &[u8],
    start: u64,
    end: u64,
) -> Result<Vec<DisassembledLine>, DecodeError> {
    let limit = end.min(bytes.len() as u64);
    let mut lines = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let line = decode_one(catalog, bytes, cursor, limit)?;
        cursor += line.size as u64;
        lines.push(line);
    }
    Ok(lines)
}

struct InstructionReader<'a> {
    bytes: &'a [u8],
    address: u64,
    width: u64,
    limit: u64,
}

impl InstructionReader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let start = self.address.saturating_add(self.width);
        let end = start.saturating_add(N as u64);
        if end > self.limit {
            return Err(DecodeError::Overrun {
                address: self.address,
                end,
                limit: self.limit,
            });
        }
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.bytes[start as usize..end as usize]);
        self.width += N as u64;
        Ok(buf)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }
}

fn decode_one(
    catalog: &Catalog,
    bytes: &[u8],
    address: u64,
    limit: u64,
) -> Result<DisassembledLine, DecodeError> {
    let mut reader = InstructionReader {
        bytes,
        address,
        width: 0,
        limit,
    };

    let opcode = reader.byte()?;
    let instruction = catalog
        .get(opcode)
        .ok_or(DecodeError::UnknownOpcode { opcode, address })?;

    let mut text = format!("{} ", instruction.mnemonic);
    if let Some(suffix) = &instruction.type_suffix {
        text.push_str(suffix);
        text.push(' ');
    }

    for operand in &instruction.operands {
        match *operand {
            OperandKind::Int { width: 1 } => {
                text.push_str(&reader.byte()?.to_string());
            }
            OperandKind::Int { width: 2 } => {
                text.push_str(&u16::from_le_bytes(reader.take()?).to_string());
            }
            OperandKind::Int { width: 4 } => {
                text.push_str(&u32::from_le_bytes(reader.take()?).to_string());
            }
            OperandKind::Int { .. } | OperandKind::AddressImmediate => {
                text.push_str(&u64::from_le_bytes(reader.take()?).to_string());
            }
            OperandKind::Float { width: 4 } => {
                text.push_str(&f32::from_le_bytes(reader.take()?).to_string());
            }
            OperandKind::Float { .. } => {
                text.push_str(&f64::from_le_bytes(reader.take()?).to_string());
            }
            OperandKind::IntTypeTag | OperandKind::FloatTypeTag => {
                let tag = reader.byte()?;
                let tag = TypeTag::try_from(tag)
                    .map_err(|_| DecodeError::UnknownTypeTag { tag, address })?;
                text.push_str(tag.name());
            }
            OperandKind::IntegerRegister | OperandKind::FloatRegister => {
                text.push_str(&register_name(reader.byte()?));
            }
            OperandKind::RegisterOffset => {
                let raw = reader.take::<6>()?;
                text.push_str(&register_offset(raw, address)?);
            }
        }
        text.push(' ');
    }

    Ok(DisassembledLine {
        address,
        text,
        size: reader.width as usize,
    })
}

fn register_name(id: u8) -> String {
    match RegisterId::new(id) {
        Some(register) => register.to_string(),
        None => format!("?{id:#04x}"),
    }
}

/// Render a 6 byte register offset operand.
///
/// Layout: selector, base register, then either an index register followed by a
/// 16 bit scale or a 32 bit displacement starting right after the base register.
fn register_offset(raw: [u8; 6], address: u64) -> Result<String, DecodeError> {
    let [selector, base, index, ..] = raw;
    let base = register_name(base);
    let imm32 = u32::from_le_bytes([raw[2], raw[3], raw[4], raw[5]]);
    let imm16 = u16::from_le_bytes([raw[3], raw[4]]);

    let rendered = match selector {
        0x4F => format!("[{base}]"),
        0x2F => format!("[{base} + {imm32}]"),
        0xAF => format!("[{base} - {imm32}]"),
        0x1F => format!("[{base} + {} * {imm16}]", register_name(index)),
        0x8F => format!("[{base} - {} * {imm16}]", register_name(index)),
        selector => return Err(DecodeError::UnknownSelector { selector, address }),
    };
    Ok(rendered)
}
