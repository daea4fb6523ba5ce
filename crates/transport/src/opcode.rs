use std::fmt;

use uvm_types::UnknownValue;

/// Opcode byte following the magic in every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    OpenSession = 0x01,
    CloseSession = 0x02,
    GetRegisters = 0x10,
    SetBreakpoint = 0xB0,
    RemoveBreakpoint = 0xB1,
    Run = 0xE0,
    NextInstruction = 0xE1,
    Continue = 0xE2,
    Stop = 0xE3,
    Error = 0xEE,
    ExecutionFinished = 0xFF,
}

impl Opcode {
    /// Whether responses with this opcode carry a register block.
    pub fn carries_registers(self) -> bool {
        matches!(
            self,
            Opcode::GetRegisters
                | Opcode::NextInstruction
                | Opcode::Run
                | Opcode::Continue
                | Opcode::ExecutionFinished
        )
    }
}

impl TryFrom<u8> for Opcode {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, UnknownValue> {
        let opcode = match value {
            0x01 => Opcode::OpenSession,
            0x02 => Opcode::CloseSession,
            0x10 => Opcode::GetRegisters,
            0xB0 => Opcode::SetBreakpoint,
            0xB1 => Opcode::RemoveBreakpoint,
            0xE0 => Opcode::Run,
            0xE1 => Opcode::NextInstruction,
            0xE2 => Opcode::Continue,
            0xE3 => Opcode::Stop,
            0xEE => Opcode::Error,
            0xFF => Opcode::ExecutionFinished,
            value => {
                return Err(UnknownValue {
                    kind: "opcode",
                    value,
                });
            }
        };
        Ok(opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::OpenSession => "OPEN_SESSION",
            Opcode::CloseSession => "CLOSE_SESSION",
            Opcode::GetRegisters => "GET_REGISTERS",
            Opcode::SetBreakpoint => "SET_BREAKPOINT",
            Opcode::RemoveBreakpoint => "REMOVE_BREAKPOINT",
            Opcode::Run => "RUN",
            Opcode::NextInstruction => "NEXT_INSTRUCTION",
            Opcode::Continue => "CONTINUE",
            Opcode::Stop => "STOP",
            Opcode::Error => "ERROR",
            Opcode::ExecutionFinished => "EXECUTION_FINISHED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Opcode;

    #[rstest]
    #[case(Opcode::OpenSession)]
    #[case(Opcode::CloseSession)]
    #[case(Opcode::GetRegisters)]
    #[case(Opcode::SetBreakpoint)]
    #[case(Opcode::RemoveBreakpoint)]
    #[case(Opcode::Run)]
    #[case(Opcode::NextInstruction)]
    #[case(Opcode::Continue)]
    #[case(Opcode::Stop)]
    #[case(Opcode::Error)]
    #[case(Opcode::ExecutionFinished)]
    fn byte_values_map_back(#[case] opcode: Opcode) {
        assert_eq!(Opcode::try_from(opcode as u8).unwrap(), opcode);
    }

    #[test]
    fn unknown_byte() {
        assert!(Opcode::try_from(0x03).is_err());
    }
}
