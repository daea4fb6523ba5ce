use crate::{
    ENTRY_OFFSET, ExecutableImage, FormatError, HEADER_SIZE, MAGIC_OFFSET, MODE_OFFSET, Mode,
    SECTION_ENTRY_SIZE, SECTION_TABLE_SIZE_OFFSET, VERSION_OFFSET,
    section::{Permissions, Section, SectionKind, SectionNameEntry},
};

/// Bounds checked little-endian reads from the image buffer
struct ByteReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    fn slice(&self, offset: usize, len: usize, field: &'static str) -> Result<&'a [u8], FormatError> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(FormatError::Truncated {
                field,
                offset,
                needed: len,
                available: self.bytes.len().saturating_sub(offset),
            })
    }

    fn array<const N: usize>(&self, offset: usize, field: &'static str) -> Result<[u8; N], FormatError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.slice(offset, N, field)?);
        Ok(buf)
    }

    fn u8(&self, offset: usize, field: &'static str) -> Result<u8, FormatError> {
        let [b] = self.array::<1>(offset, field)?;
        Ok(b)
    }

    fn u32(&self, offset: usize, field: &'static str) -> Result<u32, FormatError> {
        self.array(offset, field).map(u32::from_le_bytes)
    }

    fn u64(&self, offset: usize, field: &'static str) -> Result<u64, FormatError> {
        self.array(offset, field).map(u64::from_le_bytes)
    }
}

/// Parse an executable image.
///
/// The returned image keeps its own copy of `bytes`.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn parse(bytes: &[u8]) -> Result<ExecutableImage, FormatError> {
    let reader = ByteReader { bytes };

    let magic = reader.u32(MAGIC_OFFSET, "magic")?;
    let version = reader.u8(VERSION_OFFSET, "version")?;
    let mode = Mode::from(reader.u8(MODE_OFFSET, "mode")?);
    let entry_address = reader.u64(ENTRY_OFFSET, "entry address")?;

    let section_table_size = reader.u32(SECTION_TABLE_SIZE_OFFSET, "section table size")?;
    if section_table_size as usize % SECTION_ENTRY_SIZE != 0 {
        return Err(FormatError::UnevenSectionTable {
            size: section_table_size,
        });
    }
    let entry_count = section_table_size as usize / SECTION_ENTRY_SIZE;

    // the table size is untrusted; only reserve what the input can hold
    let available = bytes.len().saturating_sub(HEADER_SIZE) / SECTION_ENTRY_SIZE;
    let mut sections = Vec::with_capacity(entry_count.min(available));
    let mut name_table_size = None;
    let mut cursor = HEADER_SIZE;
    for _ in 0..entry_count {
        let section = Section {
            kind: SectionKind::from(reader.u8(cursor, "section type")?),
            perms: Permissions(reader.u8(cursor + 1, "section permissions")?),
            start_addr: reader.u64(cursor + 2, "section start address")?,
            size: reader.u32(cursor + 0x0a, "section size")?,
            name_ref: reader.u64(cursor + 0x0e, "section name reference")?,
        };
        // a later name table section replaces an earlier one
        if section.kind == SectionKind::NameStrings {
            name_table_size = Some(section.size as usize);
        }
        sections.push(section);
        cursor += SECTION_ENTRY_SIZE;
    }

    let section_names = match name_table_size {
        Some(size) => parse_name_table(&reader, cursor, cursor + size)?,
        None => Vec::new(),
    };

    tracing::debug!(
        sections = sections.len(),
        names = section_names.len(),
        "parsed executable image"
    );

    Ok(ExecutableImage {
        bytes: bytes.to_vec(),
        magic,
        version,
        mode,
        entry_address,
        section_table_size,
        sections,
        section_names,
    })
}

fn parse_name_table(
    reader: &ByteReader<'_>,
    start: usize,
    end: usize,
) -> Result<Vec<SectionNameEntry>, FormatError> {
    let mut names = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let length = reader.u8(cursor, "section name length")?;
        let text_end = cursor + 1 + usize::from(length);
        if text_end > end {
            return Err(FormatError::NameTableOverrun {
                offset: cursor,
                end,
            });
        }
        let raw = reader.slice(cursor + 1, usize::from(length), "section name")?;
        let text = std::str::from_utf8(raw)
            .map_err(|_| FormatError::InvalidName { offset: cursor })?
            .to_owned();

        names.push(SectionNameEntry {
            offset: cursor as u64,
            length,
            text,
        });
        cursor = text_end;
    }
    Ok(names)
}
