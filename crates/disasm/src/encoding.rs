//! Declarative description of the instruction encoding.
//!
//! Each mnemonic lists its shapes. A shape with variants stands for one opcode
//! per variant, with its generic immediate resolved to the variant's type.
use uvm_types::TypeTag;

/// Abstract operand as written in the encoding table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    IntType,
    FloatType,
    Int,
    Float,
    IntReg,
    FloatReg,
    Label,
    RegOffset,
    SysId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub tag: TypeTag,
    pub opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeDef {
    pub opcode: u8,
    /// Whether the type tag byte is present in the encoded instruction
    pub encode_type: bool,
    pub params: &'static [Param],
    pub variants: &'static [Variant],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MnemonicDef {
    pub name: &'static str,
    pub shapes: &'static [ShapeDef],
}

macro_rules! shape {
    ($opcode:literal, $encode:literal, [$($param:ident),*]) => {
        ShapeDef {
            opcode: $opcode,
            encode_type: $encode,
            params: &[$(Param::$param),*],
            variants: &[],
        }
    };
    ($opcode:literal, $encode:literal, [$($param:ident),*], [$($tag:ident = $variant:literal),+]) => {
        ShapeDef {
            opcode: $opcode,
            encode_type: $encode,
            params: &[$(Param::$param),*],
            variants: &[$(Variant { tag: TypeTag::$tag, opcode: $variant }),+],
        }
    };
}

macro_rules! mnemonic {
    ($name:literal, $($shape:expr),+ $(,)?) => {
        MnemonicDef {
            name: $name,
            shapes: &[$($shape),+],
        }
    };
}

/// Encoding of every instruction the VM understands.
pub static INSTRUCTIONS: &[MnemonicDef] = &[
    mnemonic!("nop", shape!(0xA0, false, [])),
    mnemonic!(
        "push",
        shape!(0x01, false, [IntType, Int], [I8 = 0x01, I16 = 0x02, I32 = 0x03, I64 = 0x04]),
        shape!(0x05, true, [IntType, IntReg]),
    ),
    mnemonic!(
        "pop",
        shape!(0x06, true, [IntType]),
        shape!(0x07, true, [IntType, IntReg]),
    ),
    mnemonic!(
        "load",
        shape!(0x11, false, [IntType, Int, IntReg], [I8 = 0x11, I16 = 0x12, I32 = 0x13, I64 = 0x14]),
        shape!(0x15, true, [IntType, RegOffset, IntReg]),
    ),
    mnemonic!(
        "loadf",
        shape!(0x16, false, [FloatType, Float, FloatReg], [F32 = 0x16, F64 = 0x17]),
        shape!(0x18, true, [FloatType, RegOffset, FloatReg]),
    ),
    mnemonic!("store", shape!(0x08, true, [IntType, IntReg, RegOffset])),
    mnemonic!("storef", shape!(0x09, true, [FloatType, FloatReg, RegOffset])),
    mnemonic!(
        "copy",
        shape!(0x21, false, [IntType, Int, RegOffset], [I8 = 0x21, I16 = 0x22, I32 = 0x23, I64 = 0x24]),
        shape!(0x25, true, [IntType, IntReg, IntReg]),
        shape!(0x26, true, [IntType, RegOffset, RegOffset]),
    ),
    mnemonic!(
        "copyf",
        shape!(0x27, false, [FloatType, Float, RegOffset], [F32 = 0x27, F64 = 0x28]),
        shape!(0x29, true, [FloatType, FloatReg, FloatReg]),
        shape!(0x2A, true, [FloatType, RegOffset, RegOffset]),
    ),
    mnemonic!("exit", shape!(0x50, false, [])),
    mnemonic!("call", shape!(0x20, false, [Label])),
    mnemonic!("ret", shape!(0x30, false, [])),
    mnemonic!("sys", shape!(0x40, false, [SysId])),
    mnemonic!("lea", shape!(0x10, false, [RegOffset, IntReg])),
    mnemonic!(
        "add",
        shape!(0x31, false, [IntType, IntReg, Int], [I8 = 0x31, I16 = 0x32, I32 = 0x33, I64 = 0x34]),
        shape!(0x35, true, [IntType, IntReg, IntReg]),
    ),
    mnemonic!(
        "addf",
        shape!(0x36, false, [FloatType, FloatReg, Float], [F32 = 0x36, F64 = 0x37]),
        shape!(0x38, true, [FloatType, FloatReg, FloatReg]),
    ),
    mnemonic!(
        "sub",
        shape!(0x41, false, [IntType, IntReg, Int], [I8 = 0x41, I16 = 0x42, I32 = 0x43, I64 = 0x44]),
        shape!(0x45, true, [IntType, IntReg, IntReg]),
    ),
    mnemonic!(
        "subf",
        shape!(0x46, false, [FloatType, FloatReg, Float], [F32 = 0x46, F64 = 0x47]),
        shape!(0x48, true, [FloatType, FloatReg, FloatReg]),
    ),
    mnemonic!(
        "mul",
        shape!(0x51, false, [IntType, IntReg, Int], [I8 = 0x51, I16 = 0x52, I32 = 0x53, I64 = 0x54]),
        shape!(0x55, true, [IntType, IntReg, IntReg]),
    ),
    mnemonic!(
        "mulf",
        shape!(0x56, false, [FloatType, FloatReg, Float], [F32 = 0x56, F64 = 0x57]),
        shape!(0x58, true, [FloatType, FloatReg, FloatReg]),
    ),
    mnemonic!(
        "muls",
        shape!(0x59, false, [IntType, IntReg, Int], [I8 = 0x59, I16 = 0x5A, I32 = 0x5B, I64 = 0x5C]),
        shape!(0x5D, true, [IntType, IntReg, IntReg]),
    ),
    mnemonic!(
        "div",
        shape!(0x61, false, [IntType, IntReg, Int], [I8 = 0x61, I16 = 0x62, I32 = 0x63, I64 = 0x64]),
        shape!(0x65, true, [IntType, IntReg, IntReg]),
    ),
    mnemonic!(
        "divf",
        shape!(0x66, false, [FloatType, FloatReg, Float], [F32 = 0x66, F64 = 0x67]),
        shape!(0x68, true, [FloatType, FloatReg, FloatReg]),
    ),
    mnemonic!(
        "divs",
        shape!(0x69, false, [IntType, IntReg, Int], [I8 = 0x69, I16 = 0x6A, I32 = 0x6B, I64 = 0x6C]),
        shape!(0x6D, true, [IntType, IntReg, IntReg]),
    ),
    mnemonic!("sqrt", shape!(0x86, true, [FloatType, FloatReg])),
    mnemonic!("mod", shape!(0x96, true, [IntType, IntReg, IntReg])),
    mnemonic!("and", shape!(0x75, true, [IntType, IntReg, IntReg])),
    mnemonic!("or", shape!(0x85, true, [IntType, IntReg, IntReg])),
    mnemonic!("xor", shape!(0x95, true, [IntType, IntReg, IntReg])),
    mnemonic!("not", shape!(0xA5, true, [IntType, IntReg])),
    mnemonic!("lsh", shape!(0x76, false, [IntReg, IntReg])),
    mnemonic!("rsh", shape!(0x77, false, [IntReg, IntReg])),
    mnemonic!("srsh", shape!(0x78, false, [IntReg, IntReg])),
    mnemonic!("b2l", shape!(0xB1, false, [IntReg])),
    mnemonic!("s2l", shape!(0xB2, false, [IntReg])),
    mnemonic!("i2l", shape!(0xB3, false, [IntReg])),
    mnemonic!("b2sl", shape!(0xC1, false, [IntReg])),
    mnemonic!("s2sl", shape!(0xC2, false, [IntReg])),
    mnemonic!("i2sl", shape!(0xC3, false, [IntReg])),
    mnemonic!("f2d", shape!(0xB4, false, [FloatReg])),
    mnemonic!("d2f", shape!(0xC4, false, [FloatReg])),
    mnemonic!("i2f", shape!(0xB5, false, [IntReg, FloatReg])),
    mnemonic!("i2d", shape!(0xC5, false, [IntReg, FloatReg])),
    mnemonic!("f2i", shape!(0xB6, false, [FloatReg, IntReg])),
    mnemonic!("d2i", shape!(0xC6, false, [FloatReg, IntReg])),
    mnemonic!("cmp", shape!(0xD1, true, [IntType, IntReg, IntReg])),
    mnemonic!("cmpf", shape!(0xD5, true, [FloatType, FloatReg, FloatReg])),
    mnemonic!("jmp", shape!(0xE1, false, [Label])),
    mnemonic!("je", shape!(0xE2, false, [Label])),
    mnemonic!("jne", shape!(0xE3, false, [Label])),
    mnemonic!("jgt", shape!(0xE4, false, [Label])),
    mnemonic!("jlt", shape!(0xE5, false, [Label])),
    mnemonic!("jge", shape!(0xE6, false, [Label])),
    mnemonic!("jle", shape!(0xE7, false, [Label])),
];
