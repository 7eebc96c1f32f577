//! The single-instruction emulation seam used by the resource decrypter.

use crate::{
    assembly::Instruction,
    emulation::EmValue,
    metadata::method::Local,
    Result,
};

/// An abstract interpreter that executes one instruction at a time.
///
/// The decrypter owns one emulator and drives it over its instruction window: it calls
/// [`initialize`](Self::initialize) before every calculation, seeds the accumulator with
/// [`set_local`](Self::set_local), feeds the window through [`emulate`](Self::emulate) and
/// reads the result with [`pop`](Self::pop). Control flow is never followed; branches only
/// consume their operands.
///
/// [`crate::emulation::Interpreter`] is the implementation shipped with this crate.
pub trait InstructionEmulator {
    /// Discard all state and declare the slots of the method about to be emulated.
    ///
    /// Locals start at the zero of their flavor when `init_locals` is set and are unknown
    /// otherwise; parameters are always unknown.
    fn initialize(&mut self, params: &[Local], locals: &[Local], init_locals: bool);

    /// Store `value` into local `index`.
    ///
    /// # Errors
    ///
    /// Fails if the local was not declared.
    fn set_local(&mut self, index: u16, value: EmValue) -> Result<()>;

    /// The current value of local `index`.
    ///
    /// # Errors
    ///
    /// Fails if the local was not declared.
    fn get_local(&self, index: u16) -> Result<&EmValue>;

    /// Execute one instruction.
    ///
    /// # Errors
    ///
    /// Fails on stack underflow or overflow, undeclared slots, malformed operands, exhausted
    /// limits, and instructions the emulator cannot model.
    fn emulate(&mut self, instruction: &Instruction) -> Result<()>;

    /// Pop the top of the evaluation stack.
    ///
    /// # Errors
    ///
    /// Fails if the stack is empty.
    fn pop(&mut self) -> Result<EmValue>;
}
