//! CIL instruction model, decoding and encoding.
//!
//! # Key Components
//!
//! - [`crate::assembly::Instruction`] - A decoded instruction with operand, flow and stack metadata
//! - [`crate::assembly::decode_instruction`] / [`crate::assembly::decode_stream`] - Bytecode to instructions
//! - [`crate::assembly::InstructionEncoder`] - Mnemonics to bytecode with label fixups
//! - [`crate::assembly::InstructionAssembler`] - Fluent wrapper over the encoder
//! - [`crate::assembly::opcodes`] - Raw opcode byte values
//!
//! # Examples
//!
//! ```rust
//! use keyscope::{assembly::{decode_stream, InstructionAssembler}, Parser};
//!
//! let mut asm = InstructionAssembler::new();
//! asm.ldloc(0)?.conv_r_un()?.conv_r8()?.conv_u4()?.add()?;
//! let (bytecode, _, _) = asm.finish()?;
//!
//! let instructions = decode_stream(&mut Parser::new(&bytecode), 0)?;
//! assert_eq!(instructions[1].mnemonic, "conv.r.un");
//! # Ok::<(), keyscope::Error>(())
//! ```

mod assembler;
mod decoder;
mod encoder;
mod instruction;
mod instructions;
pub mod opcodes;

pub use assembler::InstructionAssembler;
pub use decoder::{decode_instruction, decode_stream};
pub use encoder::InstructionEncoder;
pub use instruction::{
    FlowType, Immediate, Instruction, InstructionCategory, Operand, OperandType, StackBehavior,
};
pub use instructions::{CilInstruction, INSTRUCTIONS, INSTRUCTIONS_FE};
