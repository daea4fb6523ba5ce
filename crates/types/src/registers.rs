use std::fmt;

/// Number of registers the VM exposes: `ip`, `sp`, `bp`, `fl`, `r0..r15` and `f0..f15`.
pub const REGISTER_COUNT: usize = 36;

const FIRST_INTEGER: u8 = 0x05;
const LAST_INTEGER: u8 = 0x14;
const FIRST_FLOAT: u8 = 0x15;
const LAST_FLOAT: u8 = 0x24;

/// How the 64 bits stored in a register are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterClass {
    /// `ip`, `sp`, `bp` and `fl`
    Special,
    /// `r0` to `r15`, signed 64-bit integers
    Integer,
    /// `f0` to `f15`, 64-bit floats
    Float,
}

/// Id of a register known to the VM.
///
/// The same ids are used in the instruction encoding and in the register block
/// returned by the debug server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterId(u8);

impl RegisterId {
    pub const IP: RegisterId = RegisterId(0x01);
    pub const SP: RegisterId = RegisterId(0x02);
    pub const BP: RegisterId = RegisterId(0x03);
    pub const FL: RegisterId = RegisterId(0x04);

    /// Returns `None` for ids that do not name a register.
    pub fn new(id: u8) -> Option<Self> {
        match id {
            0x01..=LAST_FLOAT => Some(Self(id)),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn class(self) -> RegisterClass {
        match self.0 {
            FIRST_INTEGER..=LAST_INTEGER => RegisterClass::Integer,
            FIRST_FLOAT..=LAST_FLOAT => RegisterClass::Float,
            _ => RegisterClass::Special,
        }
    }

    /// Every register in id order.
    pub fn all() -> impl Iterator<Item = RegisterId> {
        (0x01..=LAST_FLOAT).map(RegisterId)
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0x01 => write!(f, "ip"),
            0x02 => write!(f, "sp"),
            0x03 => write!(f, "bp"),
            0x04 => write!(f, "fl"),
            id @ FIRST_INTEGER..=LAST_INTEGER => write!(f, "r{}", id - FIRST_INTEGER),
            id => write!(f, "f{}", id - FIRST_FLOAT),
        }
    }
}

/// Typed view of the bits held by a register.
#[derive(Debug, Clone, Copy)]
pub enum RegisterValue {
    Integer(i64),
    Float(f64),
}

impl RegisterValue {
    pub fn from_raw(class: RegisterClass, raw: u64) -> Self {
        match class {
            RegisterClass::Special | RegisterClass::Integer => Self::Integer(raw as i64),
            RegisterClass::Float => Self::Float(f64::from_bits(raw)),
        }
    }
}

impl Default for RegisterValue {
    fn default() -> Self {
        Self::Integer(0)
    }
}

// Numeric equality: an integer and a float compare by value, so `0` and `0.0` are equal.
impl PartialEq for RegisterValue {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                a as f64 == b
            }
        }
    }
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Condition flags held in the top bits of `fl`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub carry: bool,
    pub zero: bool,
    pub sign: bool,
}

impl Flags {
    pub fn from_raw(raw: u64) -> Self {
        Self {
            carry: (raw >> 63) & 1 == 1,
            zero: (raw >> 62) & 1 == 1,
            sign: (raw >> 61) & 1 == 1,
        }
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "carry={} zero={} sign={}",
            self.carry as u8, self.zero as u8, self.sign as u8
        )
    }
}
