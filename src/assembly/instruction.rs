//! Decoded CIL instructions and the queries the loop locator runs over them.
//!
//! The central type is [`Instruction`], which carries everything the decoder knows about an
//! opcode: where it sits in the method, its mnemonic, how it affects control flow and the
//! evaluation stack, and its typed operand. Branch targets are stored as absolute RVAs so an
//! instruction can be copied out of its method and still be resolved against it later.
//!
//! Besides the generic accessors, [`Instruction`] exposes a small set of shape predicates
//! ([`Instruction::is_ldloc`], [`Instruction::local_index`], [`Instruction::ldc_i4_value`], ...)
//! that treat the short, `.s` and long encodings of an opcode family uniformly.
//!
//! # Examples
//!
//! ```rust
//! use keyscope::{assembly::{decode_instruction, FlowType}, Parser};
//!
//! let mut parser = Parser::new(&[0x11, 0x05]); // ldloc.s 5
//! let instruction = decode_instruction(&mut parser, 0x2000)?;
//!
//! assert!(instruction.is_ldloc());
//! assert_eq!(instruction.local_index(), Some(5));
//! assert_eq!(instruction.flow_type, FlowType::Sequential);
//! # Ok::<(), keyscope::Error>(())
//! ```

use std::fmt::{self, UpperHex};

use crate::{assembly::opcodes, metadata::token::Token};

/// The encoded operand kind of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// No operand present
    None,
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 8-bit integer
    UInt8,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 16-bit integer
    UInt16,
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 32-bit integer
    UInt32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 64-bit integer
    UInt64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// Metadata token reference
    Token,
    /// Switch table operand
    Switch,
}

impl OperandType {
    /// Returns the size in bytes of this operand type, or `None` for the variable-size switch table.
    #[must_use]
    pub const fn size(&self) -> Option<usize> {
        match self {
            OperandType::None => Some(0),
            OperandType::Int8 | OperandType::UInt8 => Some(1),
            OperandType::Int16 | OperandType::UInt16 => Some(2),
            OperandType::Int32
            | OperandType::UInt32
            | OperandType::Float32
            | OperandType::Token => Some(4),
            OperandType::Int64 | OperandType::UInt64 | OperandType::Float64 => Some(8),
            OperandType::Switch => None,
        }
    }
}

/// A constant encoded directly in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// Signed 8-bit immediate value
    Int8(i8),
    /// Unsigned 8-bit immediate value
    UInt8(u8),
    /// Signed 16-bit immediate value
    Int16(i16),
    /// Unsigned 16-bit immediate value
    UInt16(u16),
    /// Signed 32-bit immediate value
    Int32(i32),
    /// Unsigned 32-bit immediate value
    UInt32(u32),
    /// Signed 64-bit immediate value
    Int64(i64),
    /// Unsigned 64-bit immediate value
    UInt64(u64),
    /// 32-bit floating point immediate value
    Float32(f32),
    /// 64-bit floating point immediate value
    Float64(f64),
}

impl UpperHex for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int8(value) => write!(f, "{value:02X}"),
            Immediate::UInt8(value) => write!(f, "{value:02X}"),
            Immediate::Int16(value) => write!(f, "{value:04X}"),
            Immediate::UInt16(value) => write!(f, "{value:04X}"),
            Immediate::Int32(value) => write!(f, "{value:08X}"),
            Immediate::UInt32(value) => write!(f, "{value:08X}"),
            Immediate::Int64(value) => write!(f, "{value:016X}"),
            Immediate::UInt64(value) => write!(f, "{value:016X}"),
            Immediate::Float32(value) => write!(f, "{:08X}", value.to_bits()),
            Immediate::Float64(value) => write!(f, "{:016X}", value.to_bits()),
        }
    }
}

impl From<Immediate> for u64 {
    fn from(val: Immediate) -> Self {
        // signed values keep their two's complement bit pattern
        match val {
            #[allow(clippy::cast_sign_loss)]
            Immediate::Int8(value) => value as u64,
            Immediate::UInt8(value) => u64::from(value),
            #[allow(clippy::cast_sign_loss)]
            Immediate::Int16(value) => value as u64,
            Immediate::UInt16(value) => u64::from(value),
            #[allow(clippy::cast_sign_loss)]
            Immediate::Int32(value) => value as u64,
            Immediate::UInt32(value) => u64::from(value),
            #[allow(clippy::cast_sign_loss)]
            Immediate::Int64(value) => value as u64,
            Immediate::UInt64(value) => value,
            Immediate::Float32(value) => u64::from(value.to_bits()),
            Immediate::Float64(value) => value.to_bits(),
        }
    }
}

/// A decoded operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand present
    None,
    /// Immediate value (constant embedded in instruction)
    Immediate(Immediate),
    /// Branch target address
    Target(u64),
    /// Metadata token reference
    Token(Token),
    /// Local variable index
    Local(u16),
    /// Method argument index
    Argument(u16),
    /// Switch table with multiple signed branch offsets
    Switch(Vec<i32>),
}

/// How an instruction affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Normal execution continues to next instruction
    Sequential,
    /// Conditional branch to another location
    ConditionalBranch,
    /// Always branches to another location (unconditional jump)
    UnconditionalBranch,
    /// Call to another method
    Call,
    /// Returns from current method
    Return,
    /// Multi-way branch (switch statement)
    Switch,
    /// Exception throwing
    Throw,
    /// End of finally or filter block
    EndFinally,
    /// Leave protected region (try/catch/finally)
    Leave,
}

/// Fixed stack effect of an instruction.
///
/// Opcodes whose effect depends on a signature (`call`, `newobj`, `ret`, ...) are recorded with
/// zero pops and pushes; consumers must special-case them through [`FlowType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBehavior {
    /// Number of items popped from stack
    pub pops: u8,
    /// Number of items pushed to stack
    pub pushes: u8,
    /// Net effect on stack depth (pushes - pops)
    pub net_effect: i8,
}

/// Categorization of instructions by their primary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionCategory {
    /// Arithmetic operations (add, sub, mul, div, rem, neg)
    Arithmetic,
    /// Bitwise and logical operations (and, or, xor, not, shl, shr)
    BitwiseLogical,
    /// Comparison operations (ceq, cgt, clt)
    Comparison,
    /// Control flow operations (br, switch, ret, call)
    ControlFlow,
    /// Type conversion operations (conv.i4, conv.r8, box, unbox)
    Conversion,
    /// Load and store operations (ldloc, stfld, ldarg)
    LoadStore,
    /// Object model operations (newobj, ldfld, castclass)
    ObjectModel,
    /// Prefix instructions (unaligned, volatile, tail)
    Prefix,
    /// Miscellaneous operations (nop, break, dup)
    Misc,
}

/// A decoded CIL instruction.
#[derive(Clone, PartialEq)]
pub struct Instruction {
    /// Relative virtual address of the first byte of this instruction
    pub rva: u64,
    /// Offset of the instruction inside the parsed buffer
    pub offset: u64,
    /// Encoded size in bytes, prefix and operand included
    pub size: u64,
    /// Opcode byte (second byte for `0xFE`-prefixed opcodes)
    pub opcode: u8,
    /// `0xFE` for two-byte opcodes, 0 otherwise
    pub prefix: u8,

    /// Canonical ECMA-335 mnemonic
    pub mnemonic: &'static str,
    /// Functional category
    pub category: InstructionCategory,
    /// Control flow behavior
    pub flow_type: FlowType,

    /// Decoded operand
    pub operand: Operand,

    /// Fixed stack effect
    pub stack_behavior: StackBehavior,
    /// Absolute RVAs this instruction may transfer control to
    pub branch_targets: Vec<u64>,
}

impl Instruction {
    /// Check if this instruction is any kind of branch (conditional, unconditional or switch).
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self.flow_type,
            FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Switch
        )
    }

    /// Check if execution simply falls through to the next instruction.
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        self.flow_type == FlowType::Sequential
    }

    /// Check if this is `br` or `br.s`.
    #[must_use]
    pub fn is_br(&self) -> bool {
        self.prefix == 0 && matches!(self.opcode, opcodes::BR | opcodes::BR_S)
    }

    /// Check if this is `bne.un` or `bne.un.s`.
    #[must_use]
    pub fn is_bne_un(&self) -> bool {
        self.prefix == 0 && matches!(self.opcode, opcodes::BNE_UN | opcodes::BNE_UN_S)
    }

    /// Check if this loads a local variable (`ldloc.0`-`ldloc.3`, `ldloc.s`, `ldloc`).
    #[must_use]
    pub fn is_ldloc(&self) -> bool {
        match self.prefix {
            0 => matches!(
                self.opcode,
                opcodes::LDLOC_0
                    | opcodes::LDLOC_1
                    | opcodes::LDLOC_2
                    | opcodes::LDLOC_3
                    | opcodes::LDLOC_S
            ),
            opcodes::FE_PREFIX => self.opcode == opcodes::FE_LDLOC,
            _ => false,
        }
    }

    /// Check if this stores a local variable (`stloc.0`-`stloc.3`, `stloc.s`, `stloc`).
    #[must_use]
    pub fn is_stloc(&self) -> bool {
        match self.prefix {
            0 => matches!(
                self.opcode,
                opcodes::STLOC_0
                    | opcodes::STLOC_1
                    | opcodes::STLOC_2
                    | opcodes::STLOC_3
                    | opcodes::STLOC_S
            ),
            opcodes::FE_PREFIX => self.opcode == opcodes::FE_STLOC,
            _ => false,
        }
    }

    /// Check if this takes the address of a local variable (`ldloca.s`, `ldloca`).
    #[must_use]
    pub fn is_ldloca(&self) -> bool {
        match self.prefix {
            0 => self.opcode == opcodes::LDLOCA_S,
            opcodes::FE_PREFIX => self.opcode == opcodes::FE_LDLOCA,
            _ => false,
        }
    }

    /// The local slot referenced by a `ldloc`, `stloc` or `ldloca` in any of its encodings.
    ///
    /// Returns `None` for every other instruction.
    #[must_use]
    pub fn local_index(&self) -> Option<u16> {
        if self.prefix == 0 {
            match self.opcode {
                opcodes::LDLOC_0..=opcodes::LDLOC_3 => {
                    return Some(u16::from(self.opcode - opcodes::LDLOC_0))
                }
                opcodes::STLOC_0..=opcodes::STLOC_3 => {
                    return Some(u16::from(self.opcode - opcodes::STLOC_0))
                }
                _ => {}
            }
        }

        if self.is_ldloc() || self.is_stloc() || self.is_ldloca() {
            self.get_u16_operand()
        } else {
            None
        }
    }

    /// The slot referenced by a `ldarg`, `starg` or `ldarga` in any of its encodings.
    #[must_use]
    pub fn argument_index(&self) -> Option<u16> {
        match (self.prefix, self.opcode) {
            (0, opcodes::LDARG_0..=opcodes::LDARG_3) => {
                Some(u16::from(self.opcode - opcodes::LDARG_0))
            }
            (0, opcodes::LDARG_S | opcodes::LDARGA_S | opcodes::STARG_S)
            | (
                opcodes::FE_PREFIX,
                opcodes::FE_LDARG | opcodes::FE_LDARGA | opcodes::FE_STARG,
            ) => self.get_u16_operand(),
            _ => None,
        }
    }

    /// The constant pushed by any `ldc.i4` form (`ldc.i4.m1`-`ldc.i4.8`, `ldc.i4.s`, `ldc.i4`).
    #[must_use]
    pub fn ldc_i4_value(&self) -> Option<i32> {
        if self.prefix != 0 {
            return None;
        }

        match self.opcode {
            opcodes::LDC_I4_M1 => Some(-1),
            opcodes::LDC_I4_0..=opcodes::LDC_I4_8 => {
                Some(i32::from(self.opcode - opcodes::LDC_I4_0))
            }
            opcodes::LDC_I4_S => self.get_i8_operand().map(i32::from),
            opcodes::LDC_I4 => self.get_i32_operand(),
            _ => None,
        }
    }

    /// The first branch target of this instruction, as an absolute RVA.
    #[must_use]
    pub fn branch_target(&self) -> Option<u64> {
        match &self.operand {
            Operand::Target(target) => Some(*target),
            _ if self.is_branch() || self.flow_type == FlowType::Leave => {
                self.branch_targets.first().copied()
            }
            _ => None,
        }
    }

    /// RVA of the instruction that follows this one.
    #[must_use]
    pub fn next_rva(&self) -> u64 {
        self.rva + self.size
    }

    /// Get the operand as an unsigned 16-bit value (local and argument indices).
    #[must_use]
    pub fn get_u16_operand(&self) -> Option<u16> {
        match &self.operand {
            Operand::Immediate(Immediate::UInt8(v)) => Some(u16::from(*v)),
            Operand::Immediate(Immediate::UInt16(v)) => Some(*v),
            Operand::Immediate(imm) => {
                let val: u64 = (*imm).into();
                u16::try_from(val).ok()
            }
            Operand::Local(idx) | Operand::Argument(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Get the operand as a signed 8-bit value.
    #[must_use]
    pub fn get_i8_operand(&self) -> Option<i8> {
        match &self.operand {
            Operand::Immediate(Immediate::Int8(v)) => Some(*v),
            Operand::Immediate(Immediate::UInt8(v)) => Some(i8::from_ne_bytes(v.to_ne_bytes())),
            _ => None,
        }
    }

    /// Get the operand as a signed 32-bit value, widening smaller immediates.
    #[must_use]
    pub fn get_i32_operand(&self) -> Option<i32> {
        match &self.operand {
            Operand::Immediate(Immediate::Int32(v)) => Some(*v),
            Operand::Immediate(Immediate::UInt32(v)) => Some(i32::from_ne_bytes(v.to_ne_bytes())),
            Operand::Immediate(Immediate::Int16(v)) => Some(i32::from(*v)),
            Operand::Immediate(Immediate::UInt16(v)) => Some(i32::from(*v)),
            Operand::Immediate(Immediate::Int8(v)) => Some(i32::from(*v)),
            Operand::Immediate(Immediate::UInt8(v)) => Some(i32::from(*v)),
            _ => None,
        }
    }

    /// Get the operand as a signed 64-bit value, widening smaller integer immediates.
    #[must_use]
    pub fn get_i64_operand(&self) -> Option<i64> {
        match &self.operand {
            Operand::Immediate(Immediate::Int64(v)) => Some(*v),
            Operand::Immediate(Immediate::UInt64(v)) => Some(i64::from_ne_bytes(v.to_ne_bytes())),
            _ => self.get_i32_operand().map(i64::from),
        }
    }

    /// Get the operand as a 64-bit float (`ldc.r4` operands are widened).
    #[must_use]
    pub fn get_f64_operand(&self) -> Option<f64> {
        match &self.operand {
            Operand::Immediate(Immediate::Float64(v)) => Some(*v),
            Operand::Immediate(Immediate::Float32(v)) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X} - ", self.rva)?;
        if self.prefix != 0 {
            write!(f, "{:02X}:", self.prefix)?;
        }
        write!(f, "{:02X} - {:<12}", self.opcode, self.mnemonic)?;

        match &self.operand {
            Operand::None => {}
            Operand::Immediate(imm) => write!(f, " 0x{imm:X}")?,
            Operand::Target(target) => write!(f, " -> 0x{target:08X}")?,
            Operand::Token(token) => write!(f, " token:{token}")?,
            Operand::Local(local) => write!(f, " local:{local}")?,
            Operand::Argument(arg) => write!(f, " arg:{arg}")?,
            Operand::Switch(items) => write!(f, " switch[{}]", items.len())?,
        }

        write!(f, " | {:?}", self.category)?;
        if self.flow_type != FlowType::Sequential {
            write!(f, " | {:?}", self.flow_type)?;
        }
        if self.stack_behavior.net_effect != 0 {
            write!(f, " | stack:{:+}", self.stack_behavior.net_effect)?;
        }
        if !self.branch_targets.is_empty() {
            write!(f, " | targets:{:X?}", self.branch_targets)?;
        }

        Ok(())
    }
}
