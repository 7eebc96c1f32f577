//! Emulation error types.

use std::fmt;

/// Errors the interpreter raises while executing an instruction window.
///
/// These are wrapped into [`crate::Error::Emulation`] when they cross the crate boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum EmulationError {
    /// Evaluation stack overflow.
    StackOverflow {
        /// The configured maximum depth.
        limit: usize,
    },
    /// Evaluation stack underflow (pop from empty stack).
    StackUnderflow,
    /// Local variable index out of bounds, or the slot was never declared.
    LocalIndexOutOfBounds {
        /// The requested index.
        index: u16,
        /// Number of declared locals.
        count: usize,
    },
    /// Argument index out of bounds, or the slot was never declared.
    ArgumentIndexOutOfBounds {
        /// The requested index.
        index: u16,
        /// Number of declared parameters.
        count: usize,
    },
    /// Instruction limit exceeded.
    InstructionLimitExceeded {
        /// Number of instructions executed.
        executed: u64,
        /// Maximum allowed.
        limit: u64,
    },
    /// Opcode whose stack effect cannot be modelled without a method signature, or that
    /// leaves the instruction window.
    UnsupportedOpcode {
        /// The unsupported opcode.
        opcode: u8,
        /// Optional prefix byte.
        prefix: Option<u8>,
        /// Instruction mnemonic if known.
        mnemonic: Option<&'static str>,
    },
    /// Invalid operand for instruction.
    InvalidOperand {
        /// Instruction mnemonic.
        instruction: &'static str,
        /// Description of what was expected.
        expected: &'static str,
    },
}

impl fmt::Display for EmulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulationError::StackOverflow { limit } => {
                write!(f, "evaluation stack overflow (limit: {limit})")
            }
            EmulationError::StackUnderflow => write!(f, "evaluation stack underflow"),
            EmulationError::LocalIndexOutOfBounds { index, count } => {
                write!(
                    f,
                    "local variable index {index} out of bounds (count: {count})"
                )
            }
            EmulationError::ArgumentIndexOutOfBounds { index, count } => {
                write!(f, "argument index {index} out of bounds (count: {count})")
            }
            EmulationError::InstructionLimitExceeded { executed, limit } => {
                write!(f, "instruction limit exceeded: {executed} (limit: {limit})")
            }
            EmulationError::UnsupportedOpcode {
                opcode,
                prefix,
                mnemonic,
            } => {
                let mnemonic_str = mnemonic.unwrap_or("unknown");
                if let Some(p) = prefix {
                    write!(
                        f,
                        "unsupported opcode: 0x{p:02X}:0x{opcode:02X} ({mnemonic_str})"
                    )
                } else {
                    write!(f, "unsupported opcode: 0x{opcode:02X} ({mnemonic_str})")
                }
            }
            EmulationError::InvalidOperand {
                instruction,
                expected,
            } => {
                write!(f, "invalid operand for {instruction}: expected {expected}")
            }
        }
    }
}

impl std::error::Error for EmulationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = EmulationError::LocalIndexOutOfBounds {
            index: 10,
            count: 5,
        };
        assert_eq!(
            err.to_string(),
            "local variable index 10 out of bounds (count: 5)"
        );

        let err = EmulationError::UnsupportedOpcode {
            opcode: 0x28,
            prefix: None,
            mnemonic: Some("call"),
        };
        assert_eq!(err.to_string(), "unsupported opcode: 0x28 (call)");

        let err = EmulationError::UnsupportedOpcode {
            opcode: 0x1A,
            prefix: Some(0xFE),
            mnemonic: None,
        };
        assert_eq!(err.to_string(), "unsupported opcode: 0xFE:0x1A (unknown)");
    }

    #[test]
    fn converts_into_crate_error() {
        let err: crate::Error = EmulationError::StackUnderflow.into();
        assert!(matches!(
            err,
            crate::Error::Emulation(EmulationError::StackUnderflow)
        ));
    }
}
