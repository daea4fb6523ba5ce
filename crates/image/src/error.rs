/// Errors raised while parsing an executable image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The buffer ends before a field could be read.
    #[error("image truncated reading {field} at {offset:#x}: need {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The section table size is not a whole number of entries.
    #[error("section table size {size:#x} is not a multiple of the section entry size")]
    UnevenSectionTable { size: u32 },

    /// A name table entry extends past the end of the name table.
    #[error("section name at {offset:#x} overruns the name table ending at {end:#x}")]
    NameTableOverrun { offset: usize, end: usize },

    /// A section name is not valid UTF-8.
    #[error("section name at {offset:#x} is not valid UTF-8")]
    InvalidName { offset: usize },
}
