use std::fmt;

use crate::UnknownValue;

/// Inline type tag selecting the concrete width of a generic operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    I8 = 0x01,
    I16 = 0x02,
    I32 = 0x03,
    I64 = 0x04,
    F32 = 0xF0,
    F64 = 0xF1,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
        }
    }

    /// Width in bytes of a value of this type
    pub fn width(self) -> u8 {
        match self {
            TypeTag::I8 => 1,
            TypeTag::I16 => 2,
            TypeTag::I32 | TypeTag::F32 => 4,
            TypeTag::I64 | TypeTag::F64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, TypeTag::F32 | TypeTag::F64)
    }
}

impl TryFrom<u8> for TypeTag {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(TypeTag::I8),
            0x02 => Ok(TypeTag::I16),
            0x03 => Ok(TypeTag::I32),
            0x04 => Ok(TypeTag::I64),
            0xF0 => Ok(TypeTag::F32),
            0xF1 => Ok(TypeTag::F64),
            value => Err(UnknownValue {
                kind: "type tag",
                value,
            }),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
