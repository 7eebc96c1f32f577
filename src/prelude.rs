//! # keyscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the keyscope library. Import this module to get quick access to everything needed
//! to build a decrypter from a method body.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all keyscope operations
pub use crate::Error;

/// The result type used throughout keyscope
pub use crate::Result;

/// Low-level byte parsing
pub use crate::Parser;

// ================================================================================================
// Decryption
// ================================================================================================

/// Resource decryption and its configuration
pub use crate::deobfuscation::{
    decrypt_all, DecrypterConfig, Dialect, LocateStrategies, LocateStrategy, LoopWindow,
    ResourceDecrypter,
};

// ================================================================================================
// Methods and Metadata
// ================================================================================================

/// Method bodies and their declared slots
pub use crate::metadata::method::{Local, Method, MethodBody};

/// Metadata tokens
pub use crate::metadata::token::Token;

/// Declared kinds of locals and parameters
pub use crate::metadata::typesystem::CilFlavor;

// ================================================================================================
// Instructions
// ================================================================================================

/// Decoded CIL instructions
pub use crate::assembly::{
    decode_stream, FlowType, Instruction, InstructionAssembler, Operand, StackBehavior,
};

// ================================================================================================
// Emulation
// ================================================================================================

/// Abstract values and the interpreter seam
pub use crate::emulation::{EmValue, EmulationLimits, InstructionEmulator, Interpreter};
