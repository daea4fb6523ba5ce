//! Parser for the VM's executable image format.
//!
//! An image starts with a fixed size header, followed by the section table and the
//! section name table:
//!
//! ```text
//! 0x00  magic            u32
//! 0x04  version          u8
//! 0x05  mode             u8
//! 0x08  entry address    u64
//! 0x60  section table    u32 (size in bytes)
//! 0x64  section entries  0x16 bytes each
//! ....  name table       [len: u8][utf8 bytes; len]...
//! ```
//!
//! All multi-byte fields are little-endian. Parsing either produces a complete
//! [`ExecutableImage`] or a [`FormatError`], never a partially populated image.
mod error;
mod parser;
mod section;

pub mod testing;

pub use error::FormatError;
pub use parser::parse;
pub use section::{Permissions, Section, SectionKind, SectionNameEntry};

use std::fmt;

use serde::Serialize;

pub(crate) const MAGIC_OFFSET: usize = 0x00;
pub(crate) const VERSION_OFFSET: usize = 0x04;
pub(crate) const MODE_OFFSET: usize = 0x05;
pub(crate) const ENTRY_OFFSET: usize = 0x08;
pub(crate) const SECTION_TABLE_SIZE_OFFSET: usize = 0x60;

/// Offset of the first section entry, which is also the size of the header.
pub const HEADER_SIZE: usize = 0x64;

/// Width in bytes of one entry in the section table.
pub const SECTION_ENTRY_SIZE: usize = 0x16;

/// Build mode recorded in the image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Release,
    Debug,
    Unknown(u8),
}

impl Mode {
    pub fn raw(self) -> u8 {
        match self {
            Mode::Release => 1,
            Mode::Debug => 2,
            Mode::Unknown(value) => value,
        }
    }
}

impl From<u8> for Mode {
    fn from(value: u8) -> Self {
        match value {
            1 => Mode::Release,
            2 => Mode::Debug,
            other => Mode::Unknown(other),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Release => f.write_str("Release"),
            Mode::Debug => f.write_str("Debug"),
            Mode::Unknown(_) => f.write_str("Unknown"),
        }
    }
}

/// A parsed executable image.
///
/// Owns the raw bytes it was parsed from so they can be sent to the debug server
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutableImage {
    #[serde(skip)]
    bytes: Vec<u8>,
    magic: u32,
    version: u8,
    mode: Mode,
    entry_address: u64,
    section_table_size: u32,
    sections: Vec<Section>,
    section_names: Vec<SectionNameEntry>,
}

impl ExecutableImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn entry_address(&self) -> u64 {
        self.entry_address
    }

    /// Size in bytes of the section table, as recorded in the header
    pub fn section_table_size(&self) -> u32 {
        self.section_table_size
    }

    /// Sections in file order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Section name table entries in table order
    pub fn section_names(&self) -> &[SectionNameEntry] {
        &self.section_names
    }

    /// The first section of kind [`SectionKind::Code`], if any.
    pub fn code_section(&self) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == SectionKind::Code)
    }

    /// Re-encode the header fields over the original header bytes.
    ///
    /// Bytes the parser does not interpret are copied through untouched.
    pub fn encode_header(&self) -> Vec<u8> {
        let mut header = self.bytes[..HEADER_SIZE].to_vec();
        header[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(&self.magic.to_le_bytes());
        header[VERSION_OFFSET] = self.version;
        header[MODE_OFFSET] = self.mode.raw();
        header[ENTRY_OFFSET..ENTRY_OFFSET + 8].copy_from_slice(&self.entry_address.to_le_bytes());
        header[SECTION_TABLE_SIZE_OFFSET..SECTION_TABLE_SIZE_OFFSET + 4]
            .copy_from_slice(&self.section_table_size.to_le_bytes());
        header
    }

    /// Re-encode every section entry in file order.
    pub fn encode_section_table(&self) -> Vec<u8> {
        self.sections.iter().flat_map(Section::encode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ImageBuilder;

    #[test]
    fn mode_names() {
        assert_eq!(Mode::from(1).to_string(), "Release");
        assert_eq!(Mode::from(2).to_string(), "Debug");
        assert_eq!(Mode::from(0).to_string(), "Unknown");
        assert_eq!(Mode::from(9).raw(), 9);
    }

    #[test]
    fn serializes_metadata_without_raw_bytes() {
        let bytes = ImageBuilder::new()
            .magic(0xC0FFEE)
            .names(&["code"])
            .code(&[0x50])
            .build();
        let image = parse(&bytes).unwrap();

        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["magic"], 0xC0FFEE);
        assert_eq!(value["mode"], "Release");
        assert_eq!(value["sections"][1]["kind"], "Code");
        assert_eq!(value["sections"][1]["perms"], 0xa0);
        assert_eq!(value["section_names"][0]["text"], "code");
        assert!(value.get("bytes").is_none());
    }
}
