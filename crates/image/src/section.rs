use std::fmt;

use serde::Serialize;

use crate::SECTION_ENTRY_SIZE;

/// Kind of content held by a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    NameStrings,
    MetaData,
    Debug,
    Static,
    Global,
    Code,
    Unknown(u8),
}

impl SectionKind {
    pub fn raw(self) -> u8 {
        match self {
            SectionKind::NameStrings => 1,
            SectionKind::MetaData => 2,
            SectionKind::Debug => 3,
            SectionKind::Static => 4,
            SectionKind::Global => 5,
            SectionKind::Code => 6,
            SectionKind::Unknown(value) => value,
        }
    }
}

impl From<u8> for SectionKind {
    fn from(value: u8) -> Self {
        match value {
            1 => SectionKind::NameStrings,
            2 => SectionKind::MetaData,
            3 => SectionKind::Debug,
            4 => SectionKind::Static,
            5 => SectionKind::Global,
            6 => SectionKind::Code,
            other => SectionKind::Unknown(other),
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionKind::NameStrings => "SEC_NAME_STRINGS",
            SectionKind::MetaData => "SEC_META_DATA",
            SectionKind::Debug => "SEC_DEBUG",
            SectionKind::Static => "SEC_STATIC",
            SectionKind::Global => "SEC_GLOBAL",
            SectionKind::Code => "SEC_CODE",
            SectionKind::Unknown(_) => "Unknown",
        };
        f.write_str(name)
    }
}

/// Section permission bits.
///
/// Displays as `rwx`, with `-` in place of each cleared bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permissions(pub u8);

impl Permissions {
    pub const READ: u8 = 0x80;
    pub const WRITE: u8 = 0x40;
    pub const EXECUTE: u8 = 0x20;

    pub fn readable(self) -> bool {
        self.0 & Self::READ != 0
    }

    pub fn writable(self) -> bool {
        self.0 & Self::WRITE != 0
    }

    pub fn executable(self) -> bool {
        self.0 & Self::EXECUTE != 0
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.readable(), 'r'),
            flag(self.writable(), 'w'),
            flag(self.executable(), 'x')
        )
    }
}

/// One entry of the section table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub perms: Permissions,
    /// Virtual address of the first byte of the section
    pub start_addr: u64,
    pub size: u32,
    /// Reference into the name table. Its relationship to
    /// [`SectionNameEntry::offset`] is not defined by the format.
    pub name_ref: u64,
}

impl Section {
    /// Address one past the last byte of the section
    pub fn end_addr(&self) -> u64 {
        self.start_addr.saturating_add(u64::from(self.size))
    }

    pub fn encode(&self) -> [u8; SECTION_ENTRY_SIZE] {
        let mut buf = [0u8; SECTION_ENTRY_SIZE];
        buf[0] = self.kind.raw();
        buf[1] = self.perms.0;
        buf[2..10].copy_from_slice(&self.start_addr.to_le_bytes());
        buf[10..14].copy_from_slice(&self.size.to_le_bytes());
        buf[14..22].copy_from_slice(&self.name_ref.to_le_bytes());
        buf
    }
}

/// One entry of the section name table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionNameEntry {
    /// File offset of the entry's length byte
    pub offset: u64,
    pub length: u8,
    pub text: String,
}
