//! Abstract CIL emulation for keystream recovery.
//!
//! Resource keys produced by obfuscated decrypter methods are computed by short, straight-line
//! instruction windows. This module executes such windows without running the target: values
//! are tracked abstractly, so a result is only trusted when every bit of it is known.
//!
//! # Key Components
//!
//! ## Value System
//! - [`EmValue`] - Abstract stack and slot values (`int32`, `int64`, float, unknown)
//! - [`Int32Value`] - 32-bit integers with per-bit knowledge
//! - [`BinaryOp`], [`UnaryOp`], [`CompareOp`], [`ConversionType`] - Operation kinds
//!
//! ## Memory Model
//! - [`EvaluationStack`] - CIL evaluation stack with overflow protection
//! - [`SlotTable`] - Declared locals or arguments with flavor-aware stores
//!
//! ## Execution Engine
//! - [`InstructionEmulator`] - The one-instruction-at-a-time seam the decrypter drives
//! - [`Interpreter`] - The bundled implementation of that seam
//! - [`EmulationLimits`] - Stack depth and instruction budget
//! - [`EmulationError`] - Why an instruction could not be executed

mod config;
mod emulator;
mod error;
mod interpreter;
mod memory;
mod value;

pub use config::EmulationLimits;
pub use emulator::InstructionEmulator;
pub use error::EmulationError;
pub use interpreter::Interpreter;
pub use memory::{EvaluationStack, SlotKind, SlotTable};
pub use value::{BinaryOp, CompareOp, ConversionType, EmValue, Int32Value, UnaryOp};
