use std::fmt;

use crate::UnknownValue;

/// Errors raised by the VM while executing a program.
///
/// The debug server reports these as a single subcode byte following the
/// `RUNTIME_ERROR` error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RuntimeErrorKind {
    StackOverflow = 20,
    StackUnderflow = 21,
    InvalidOpcode = 22,
    InvalidRegister = 23,
    InvalidType = 24,
    InvalidAddressingMode = 25,
    SegmentationFault = 26,
    ReadPermissionDenied = 27,
    WritePermissionDenied = 28,
    ExecutePermissionDenied = 29,
    DivisionByZero = 30,
    InvalidSystemCall = 31,
    HeapAllocationFailed = 32,
    InvalidJumpTarget = 33,
    InstructionPointerOutOfBounds = 34,
    UnalignedAccess = 35,
    IntegerOverflow = 36,
    FloatingPointException = 37,
    InternalError = 38,
}

impl RuntimeErrorKind {
    const ALL: [RuntimeErrorKind; 19] = [
        RuntimeErrorKind::StackOverflow,
        RuntimeErrorKind::StackUnderflow,
        RuntimeErrorKind::InvalidOpcode,
        RuntimeErrorKind::InvalidRegister,
        RuntimeErrorKind::InvalidType,
        RuntimeErrorKind::InvalidAddressingMode,
        RuntimeErrorKind::SegmentationFault,
        RuntimeErrorKind::ReadPermissionDenied,
        RuntimeErrorKind::WritePermissionDenied,
        RuntimeErrorKind::ExecutePermissionDenied,
        RuntimeErrorKind::DivisionByZero,
        RuntimeErrorKind::InvalidSystemCall,
        RuntimeErrorKind::HeapAllocationFailed,
        RuntimeErrorKind::InvalidJumpTarget,
        RuntimeErrorKind::InstructionPointerOutOfBounds,
        RuntimeErrorKind::UnalignedAccess,
        RuntimeErrorKind::IntegerOverflow,
        RuntimeErrorKind::FloatingPointException,
        RuntimeErrorKind::InternalError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuntimeErrorKind::StackOverflow => "STACK_OVERFLOW",
            RuntimeErrorKind::StackUnderflow => "STACK_UNDERFLOW",
            RuntimeErrorKind::InvalidOpcode => "INVALID_OPCODE",
            RuntimeErrorKind::InvalidRegister => "INVALID_REGISTER",
            RuntimeErrorKind::InvalidType => "INVALID_TYPE",
            RuntimeErrorKind::InvalidAddressingMode => "INVALID_ADDRESSING_MODE",
            RuntimeErrorKind::SegmentationFault => "SEGMENTATION_FAULT",
            RuntimeErrorKind::ReadPermissionDenied => "READ_PERMISSION_DENIED",
            RuntimeErrorKind::WritePermissionDenied => "WRITE_PERMISSION_DENIED",
            RuntimeErrorKind::ExecutePermissionDenied => "EXECUTE_PERMISSION_DENIED",
            RuntimeErrorKind::DivisionByZero => "DIVISION_BY_ZERO",
            RuntimeErrorKind::InvalidSystemCall => "INVALID_SYSTEM_CALL",
            RuntimeErrorKind::HeapAllocationFailed => "HEAP_ALLOCATION_FAILED",
            RuntimeErrorKind::InvalidJumpTarget => "INVALID_JUMP_TARGET",
            RuntimeErrorKind::InstructionPointerOutOfBounds => "INSTRUCTION_POINTER_OUT_OF_BOUNDS",
            RuntimeErrorKind::UnalignedAccess => "UNALIGNED_ACCESS",
            RuntimeErrorKind::IntegerOverflow => "INTEGER_OVERFLOW",
            RuntimeErrorKind::FloatingPointException => "FLOATING_POINT_EXCEPTION",
            RuntimeErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl TryFrom<u8> for RuntimeErrorKind {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| *kind as u8 == value)
            .ok_or(UnknownValue {
                kind: "runtime error",
                value,
            })
    }
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::RuntimeErrorKind;

    #[test]
    fn every_subcode_in_range_is_known() {
        for code in 20..=38u8 {
            let kind = RuntimeErrorKind::try_from(code).expect("subcode in range");
            assert_eq!(kind as u8, code);
        }
    }

    #[test]
    fn out_of_range_subcodes() {
        for code in [0u8, 19, 39, 0xff] {
            assert!(RuntimeErrorKind::try_from(code).is_err());
        }
    }

    #[test]
    fn display() {
        assert_eq!(
            RuntimeErrorKind::DivisionByZero.to_string(),
            "DIVISION_BY_ZERO"
        );
    }
}
