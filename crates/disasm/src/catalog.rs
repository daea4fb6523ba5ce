use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt,
    sync::LazyLock,
};

use serde::Serialize;
use uvm_types::TypeTag;

use crate::encoding::{INSTRUCTIONS, MnemonicDef, Param, ShapeDef};

/// Concrete operand as it appears in the encoded instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperandKind {
    /// Integer immediate of 1, 2, 4 or 8 bytes
    Int { width: u8 },
    /// Float immediate of 4 or 8 bytes
    Float { width: u8 },
    /// 8 byte absolute code address
    AddressImmediate,
    IntTypeTag,
    FloatTypeTag,
    /// 6 byte addressing mode
    RegisterOffset,
    IntegerRegister,
    FloatRegister,
}

impl OperandKind {
    /// Number of bytes the operand occupies
    pub fn width(self) -> usize {
        match self {
            OperandKind::Int { width } | OperandKind::Float { width } => usize::from(width),
            OperandKind::AddressImmediate => 8,
            OperandKind::RegisterOffset => 6,
            OperandKind::IntTypeTag
            | OperandKind::FloatTypeTag
            | OperandKind::IntegerRegister
            | OperandKind::FloatRegister => 1,
        }
    }
}

/// Shape of the instruction selected by an opcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub opcode: u8,
    pub mnemonic: String,
    pub operands: Vec<OperandKind>,
    /// Name of the type this opcode was expanded for, e.g. `i32`
    pub type_suffix: Option<String>,
}

impl Instruction {
    /// Encoded width in bytes, including the opcode
    pub fn width(&self) -> usize {
        1 + self.operands.iter().map(|o| o.width()).sum::<usize>()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic)?;
        if let Some(suffix) = &self.type_suffix {
            write!(f, " {suffix}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("opcode {opcode:#04x} of {mnemonic} is already taken by {existing}")]
    DuplicateOpcode {
        opcode: u8,
        mnemonic: String,
        existing: String,
    },

    #[error("{mnemonic} ({opcode:#04x}) has a generic immediate but no type variants")]
    UnresolvedGeneric { mnemonic: String, opcode: u8 },

    #[error("{mnemonic} variant {tag} ({opcode:#04x}) does not fit its generic immediate")]
    VariantMismatch {
        mnemonic: String,
        opcode: u8,
        tag: TypeTag,
    },
}

/// Opcode to instruction lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    instructions: BTreeMap<u8, Instruction>,
}

impl Catalog {
    pub fn get(&self, opcode: u8) -> Option<&Instruction> {
        self.instructions.get(&opcode)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instructions in opcode order
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.values()
    }

    fn insert(&mut self, instruction: Instruction) -> Result<(), CatalogError> {
        match self.instructions.entry(instruction.opcode) {
            Entry::Occupied(existing) => Err(CatalogError::DuplicateOpcode {
                opcode: instruction.opcode,
                mnemonic: instruction.to_string(),
                existing: existing.get().to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(instruction);
                Ok(())
            }
        }
    }
}

static CATALOG: LazyLock<Catalog> = LazyLock::new(|| {
    build_catalog(INSTRUCTIONS).expect("built-in instruction table has a conflicting opcode")
});

/// The catalog of every instruction the VM understands, built on first use.
pub fn catalog() -> &'static Catalog {
    &CATALOG
}

/// Expand an encoding table into an opcode keyed catalog.
///
/// Shapes with type variants produce one entry per variant, keyed by the
/// variant's opcode. Fails if two entries end up with the same opcode.
pub fn build_catalog(table: &[MnemonicDef]) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::default();
    for mnemonic in table {
        for shape in mnemonic.shapes {
            if shape.variants.is_empty() {
                catalog.insert(expand(mnemonic.name, shape, shape.opcode, None)?)?;
            } else {
                for variant in shape.variants {
                    catalog.insert(expand(
                        mnemonic.name,
                        shape,
                        variant.opcode,
                        Some(variant.tag),
                    )?)?;
                }
            }
        }
    }
    tracing::debug!(instructions = catalog.len(), "built instruction catalog");
    Ok(catalog)
}

fn expand(
    mnemonic: &str,
    shape: &ShapeDef,
    opcode: u8,
    variant: Option<TypeTag>,
) -> Result<Instruction, CatalogError> {
    let unresolved = || CatalogError::UnresolvedGeneric {
        mnemonic: mnemonic.to_string(),
        opcode,
    };
    let mismatch = |tag| CatalogError::VariantMismatch {
        mnemonic: mnemonic.to_string(),
        opcode,
        tag,
    };

    let mut operands = Vec::with_capacity(shape.params.len());
    for param in shape.params {
        let operand = match param {
            Param::IntType if shape.encode_type => OperandKind::IntTypeTag,
            Param::FloatType if shape.encode_type => OperandKind::FloatTypeTag,
            Param::IntType | Param::FloatType => continue,
            Param::Int => match variant {
                Some(tag) if !tag.is_float() => OperandKind::Int { width: tag.width() },
                Some(tag) => return Err(mismatch(tag)),
                None => return Err(unresolved()),
            },
            Param::Float => match variant {
                Some(tag) if tag.is_float() => OperandKind::Float { width: tag.width() },
                Some(tag) => return Err(mismatch(tag)),
                None => return Err(unresolved()),
            },
            Param::IntReg => OperandKind::IntegerRegister,
            Param::FloatReg => OperandKind::FloatRegister,
            Param::Label => OperandKind::AddressImmediate,
            Param::RegOffset => OperandKind::RegisterOffset,
            Param::SysId => OperandKind::Int { width: 1 },
        };
        operands.push(operand);
    }

    Ok(Instruction {
        opcode,
        mnemonic: mnemonic.to_string(),
        operands,
        type_suffix: variant.map(|tag| tag.name().to_string()),
    })
}
