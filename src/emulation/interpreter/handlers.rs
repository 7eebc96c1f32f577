//! Handler methods for the CIL interpreter.
//!
//! These are the private helpers the dispatch loop in the parent module calls for each
//! instruction family:
//!
//! - **Error helpers**: `invalid_operand`, `unsupported`, `slot_operand`
//! - **Locals and arguments**: `load_local`, `store_local`, `load_argument`, `store_argument`,
//!   `push_address`
//! - **Arithmetic**: `binary_op`, `unary_op`, `compare`, `convert`
//! - **Everything else**: `branch`, `load_narrow`, `opaque`

use crate::{
    assembly::Instruction,
    emulation::{
        interpreter::Interpreter, BinaryOp, CompareOp, ConversionType, EmValue, EmulationError,
        Int32Value, UnaryOp,
    },
    Error, Result,
};

impl Interpreter {
    /// Creates an error for an invalid operand.
    ///
    /// # Arguments
    ///
    /// * `instruction` - The instruction with the invalid operand.
    /// * `expected` - Description of the expected operand type.
    pub(super) fn invalid_operand(instruction: &Instruction, expected: &'static str) -> Error {
        EmulationError::InvalidOperand {
            instruction: instruction.mnemonic,
            expected,
        }
        .into()
    }

    /// Creates an error for an opcode the interpreter does not model.
    pub(super) fn unsupported(instruction: &Instruction) -> Error {
        EmulationError::UnsupportedOpcode {
            opcode: instruction.opcode,
            prefix: (instruction.prefix != 0).then_some(instruction.prefix),
            mnemonic: Some(instruction.mnemonic),
        }
        .into()
    }

    /// Reads the slot index operand of the `.s` and long forms of `ldloc`/`stloc`/`ldarg`/`starg`.
    pub(super) fn slot_operand(instruction: &Instruction) -> Result<u16> {
        instruction
            .get_u16_operand()
            .ok_or_else(|| Self::invalid_operand(instruction, "slot index"))
    }

    /// Loads a local variable onto the evaluation stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the local was not declared or the stack is full.
    pub(super) fn load_local(&mut self, index: u16) -> Result<()> {
        let value = *self.locals.get(index)?;
        self.stack.push(value)
    }

    /// Stores the top of the stack into a local variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty or the local was not declared.
    pub(super) fn store_local(&mut self, index: u16) -> Result<()> {
        let value = self.stack.pop()?;
        self.locals.set(index, value)
    }

    /// Loads an argument onto the evaluation stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument was not declared or the stack is full.
    pub(super) fn load_argument(&mut self, index: u16) -> Result<()> {
        let value = *self.args.get(index)?;
        self.stack.push(value)
    }

    /// Stores the top of the stack into an argument slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty or the argument was not declared.
    pub(super) fn store_argument(&mut self, index: u16) -> Result<()> {
        let value = self.stack.pop()?;
        self.args.set(index, value)
    }

    /// Pushes the (unmodelled) address of a local or argument.
    pub(super) fn push_address(&mut self) -> Result<()> {
        self.stack.push(EmValue::Unknown)
    }

    /// Pops two values, applies `op` and pushes the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack holds fewer than two values.
    pub(super) fn binary_op(&mut self, op: BinaryOp) -> Result<()> {
        let right = self.stack.pop()?;
        let left = self.stack.pop()?;
        self.stack.push(left.binary_op(right, op))
    }

    /// Pops one value, applies `op` and pushes the result.
    pub(super) fn unary_op(&mut self, op: UnaryOp) -> Result<()> {
        let value = self.stack.pop()?;
        self.stack.push(value.unary_op(op))
    }

    /// Pops two values, compares them and pushes 0 or 1.
    pub(super) fn compare(&mut self, op: CompareOp) -> Result<()> {
        let right = self.stack.pop()?;
        let left = self.stack.pop()?;
        self.stack.push(left.compare(right, op))
    }

    /// Pops one value, converts it and pushes the result.
    pub(super) fn convert(&mut self, conv: ConversionType) -> Result<()> {
        let value = self.stack.pop()?;
        self.stack.push(value.convert(conv))
    }

    /// Consumes the operands of a branch or `switch`; control never transfers.
    pub(super) fn branch(&mut self, instruction: &Instruction) -> Result<()> {
        self.stack
            .discard(usize::from(instruction.stack_behavior.pops))
    }

    /// `ldind.u1`/`ldelem.u1` style loads: the value is unknown but zero-extended from `bits`.
    pub(super) fn load_narrow(&mut self, instruction: &Instruction, bits: u32) -> Result<()> {
        self.stack
            .discard(usize::from(instruction.stack_behavior.pops))?;
        self.stack
            .push(EmValue::I32(Int32Value::unknown().zero_extend(bits)))
    }

    /// Any other opcode with a fixed stack effect: pop the inputs, push unknown results.
    pub(super) fn opaque(&mut self, instruction: &Instruction) -> Result<()> {
        self.stack
            .discard(usize::from(instruction.stack_behavior.pops))?;
        for _ in 0..instruction.stack_behavior.pushes {
            self.stack.push(EmValue::Unknown)?;
        }
        Ok(())
    }
}
