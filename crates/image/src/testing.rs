//! Helpers for building executable images byte by byte in tests.

use crate::{
    ENTRY_OFFSET, HEADER_SIZE, MAGIC_OFFSET, MODE_OFFSET, SECTION_ENTRY_SIZE,
    SECTION_TABLE_SIZE_OFFSET, VERSION_OFFSET,
    section::{Permissions, Section, SectionKind},
};

enum Entry {
    Raw(Section),
    Names,
    Code(Vec<u8>),
}

/// Builder for the raw bytes of an executable image.
///
/// Sections are written in the order they are added. The name table (if any) is
/// placed directly after the section table, followed by the bytes of every
/// [`ImageBuilder::code`] section, whose start addresses point at those bytes.
///
/// ```
/// use image::{SectionKind, testing::ImageBuilder};
///
/// let bytes = ImageBuilder::new()
///     .names(&["code"])
///     .code(&[0x50])
///     .build();
///
/// let image = image::parse(&bytes).unwrap();
/// assert_eq!(image.sections()[1].kind, SectionKind::Code);
/// ```
pub struct ImageBuilder {
    header: [u8; HEADER_SIZE],
    section_table_size: Option<u32>,
    entries: Vec<Entry>,
    name_table: Vec<u8>,
    name_table_size: Option<u32>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    /// An image with version 1, release mode and no sections.
    pub fn new() -> Self {
        let mut header = [0u8; HEADER_SIZE];
        header[VERSION_OFFSET] = 1;
        header[MODE_OFFSET] = 1;
        Self {
            header,
            section_table_size: None,
            entries: Vec::new(),
            name_table: Vec::new(),
            name_table_size: None,
        }
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.header[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(&magic.to_le_bytes());
        self
    }

    pub fn version(mut self, version: u8) -> Self {
        self.header[VERSION_OFFSET] = version;
        self
    }

    pub fn mode(mut self, mode: u8) -> Self {
        self.header[MODE_OFFSET] = mode;
        self
    }

    pub fn entry_address(mut self, address: u64) -> Self {
        self.header[ENTRY_OFFSET..ENTRY_OFFSET + 8].copy_from_slice(&address.to_le_bytes());
        self
    }

    /// Set an arbitrary header byte, e.g. to place code inside the header padding.
    pub fn header_byte(mut self, offset: usize, value: u8) -> Self {
        self.header[offset] = value;
        self
    }

    /// Override the section table size written to the header.
    pub fn section_table_size(mut self, size: u32) -> Self {
        self.section_table_size = Some(size);
        self
    }

    /// Add a section entry with explicit field values.
    pub fn section(
        mut self,
        kind: SectionKind,
        perms: u8,
        start_addr: u64,
        size: u32,
        name_ref: u64,
    ) -> Self {
        self.entries.push(Entry::Raw(Section {
            kind,
            perms: Permissions(perms),
            start_addr,
            size,
            name_ref,
        }));
        self
    }

    /// Add a name table section holding `names`.
    pub fn names(self, names: &[&str]) -> Self {
        let mut table = Vec::new();
        for name in names {
            let length = u8::try_from(name.len()).expect("section name longer than 255 bytes");
            table.push(length);
            table.extend_from_slice(name.as_bytes());
        }
        self.raw_name_table(table)
    }

    /// Add a name table section with the given raw table bytes.
    pub fn raw_name_table(mut self, table: Vec<u8>) -> Self {
        self.name_table = table;
        self.entries.push(Entry::Names);
        self
    }

    /// Override the size recorded for the name table section.
    pub fn name_table_size(mut self, size: u32) -> Self {
        self.name_table_size = Some(size);
        self
    }

    /// Add a code section containing `code`.
    pub fn code(mut self, code: &[u8]) -> Self {
        self.entries.push(Entry::Code(code.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let table_len = self.entries.len() * SECTION_ENTRY_SIZE;
        let name_table_start = HEADER_SIZE + table_len;
        let mut payload_start = name_table_start + self.name_table.len();

        let mut header = self.header;
        let table_size = self.section_table_size.unwrap_or(table_len as u32);
        header[SECTION_TABLE_SIZE_OFFSET..SECTION_TABLE_SIZE_OFFSET + 4]
            .copy_from_slice(&table_size.to_le_bytes());

        let mut bytes = header.to_vec();
        let mut payload = Vec::new();
        for entry in &self.entries {
            let section = match entry {
                Entry::Raw(section) => *section,
                Entry::Names => Section {
                    kind: SectionKind::NameStrings,
                    perms: Permissions(Permissions::READ),
                    start_addr: name_table_start as u64,
                    size: self
                        .name_table_size
                        .unwrap_or(self.name_table.len() as u32),
                    name_ref: 0,
                },
                Entry::Code(code) => {
                    let section = Section {
                        kind: SectionKind::Code,
                        perms: Permissions(Permissions::READ | Permissions::EXECUTE),
                        start_addr: payload_start as u64,
                        size: code.len() as u32,
                        name_ref: 0,
                    };
                    payload.extend_from_slice(code);
                    payload_start += code.len();
                    section
                }
            };
            bytes.extend_from_slice(&section.encode());
        }

        bytes.extend_from_slice(&self.name_table);
        bytes.extend_from_slice(&payload);
        bytes
    }
}
