//! CIL instruction interpreter over abstract values.
//!
//! [`Interpreter`] executes one instruction at a time against an evaluation stack and the
//! declared locals and arguments of a method. It implements [`InstructionEmulator`] and is the
//! emulator the resource decrypter uses unless another one is injected.
//!
//! # Execution model
//!
//! The interpreter never transfers control: branches pop their operands and execution
//! continues with whatever instruction the caller feeds next. Arithmetic, comparisons and
//! conversions are modelled on [`EmValue`], including partially known `int32` values.
//! Instructions with a fixed stack effect that are not modelled (field, array, indirect
//! loads and stores, `ldstr`, `box`, ...) pop their inputs and push unknown values.
//! Instructions whose effect depends on a method signature or that leave the method
//! (`call`, `newobj`, `ret`, `throw`, `leave`, ...) fail with
//! [`EmulationError::UnsupportedOpcode`].
//!
//! # Example
//!
//! ```rust
//! use keyscope::{
//!     assembly::{decode_stream, InstructionAssembler},
//!     emulation::{EmValue, InstructionEmulator, Interpreter},
//!     metadata::{method::Local, typesystem::CilFlavor},
//!     Parser,
//! };
//!
//! let mut asm = InstructionAssembler::new();
//! asm.ldloc(0)?.ldc_i4(3)?.mul()?.ldc_i4(1)?.add()?;
//! let (code, _, _) = asm.finish()?;
//! let instructions = decode_stream(&mut Parser::new(&code), 0)?;
//!
//! let mut interpreter = Interpreter::default();
//! interpreter.initialize(&[], &[Local::new(0, CilFlavor::U4)], true);
//! interpreter.set_local(0, EmValue::u32(5))?;
//! for instruction in &instructions {
//!     interpreter.emulate(instruction)?;
//! }
//!
//! assert_eq!(interpreter.pop()?, EmValue::u32(16));
//! # Ok::<(), keyscope::Error>(())
//! ```

mod handlers;
#[cfg(test)]
mod tests;

use crate::{
    assembly::{FlowType, Instruction},
    emulation::{
        BinaryOp, CompareOp, ConversionType, EmValue, EmulationError, EmulationLimits,
        EvaluationStack, InstructionEmulator, SlotKind, SlotTable, UnaryOp,
    },
    metadata::method::Local,
    Result,
};

/// Abstract CIL interpreter.
///
/// Cloning an interpreter clones its whole state; clones are independent.
#[derive(Clone, Debug)]
pub struct Interpreter {
    limits: EmulationLimits,
    stack: EvaluationStack,
    locals: SlotTable,
    args: SlotTable,
    executed: u64,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(EmulationLimits::default())
    }
}

impl Interpreter {
    /// Creates an interpreter with the given limits and no declared slots.
    #[must_use]
    pub fn new(limits: EmulationLimits) -> Self {
        Interpreter {
            limits,
            stack: EvaluationStack::new(limits.max_stack_depth),
            locals: SlotTable::new(SlotKind::Local),
            args: SlotTable::new(SlotKind::Argument),
            executed: 0,
        }
    }

    /// The configured limits.
    #[must_use]
    pub fn limits(&self) -> &EmulationLimits {
        &self.limits
    }

    /// Instructions executed since the last [`InstructionEmulator::initialize`].
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// The evaluation stack.
    #[must_use]
    pub fn stack(&self) -> &EvaluationStack {
        &self.stack
    }

    /// The current value of argument `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument was not declared.
    pub fn get_argument(&self, index: u16) -> Result<&EmValue> {
        self.args.get(index)
    }

    /// Checks the instruction limit.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::InstructionLimitExceeded`] once the budget is used up.
    pub fn check_limits(&self) -> Result<()> {
        let limit = self.limits.max_instructions;
        if limit != 0 && self.executed >= limit {
            return Err(EmulationError::InstructionLimitExceeded {
                executed: self.executed,
                limit,
            }
            .into());
        }
        Ok(())
    }

    /// Executes a single instruction.
    ///
    /// This is the main dispatch method that examines the instruction and
    /// delegates to the appropriate handler based on the opcode.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits are exhausted, the stack underflows or overflows, a slot
    /// is not declared, an operand is malformed, or the opcode cannot be modelled.
    pub fn step(&mut self, instruction: &Instruction) -> Result<()> {
        self.check_limits()?;
        self.executed += 1;

        if matches!(
            instruction.flow_type,
            FlowType::Call
                | FlowType::Return
                | FlowType::Throw
                | FlowType::EndFinally
                | FlowType::Leave
        ) {
            return Err(Self::unsupported(instruction));
        }

        match instruction.prefix {
            0 => self.execute_standard(instruction),
            0xFE => self.execute_fe_prefixed(instruction),
            _ => Err(Self::unsupported(instruction)),
        }
    }

    fn execute_standard(&mut self, instruction: &Instruction) -> Result<()> {
        match instruction.opcode {
            // ================================================================
            // Stack Operations (0x00 - 0x01, 0x25, 0x26)
            // ================================================================
            0x00 | 0x01 => Ok(()), // nop, break
            0x25 => self.stack.dup(), // dup
            0x26 => self.stack.pop().map(|_| ()), // pop

            // ================================================================
            // Arguments (0x02 - 0x05, 0x0E - 0x10)
            // ================================================================
            0x02 => self.load_argument(0), // ldarg.0
            0x03 => self.load_argument(1), // ldarg.1
            0x04 => self.load_argument(2), // ldarg.2
            0x05 => self.load_argument(3), // ldarg.3
            0x0E => {
                // ldarg.s
                let index = Self::slot_operand(instruction)?;
                self.load_argument(index)
            }
            0x0F => self.push_address(), // ldarga.s
            0x10 => {
                // starg.s
                let index = Self::slot_operand(instruction)?;
                self.store_argument(index)
            }

            // ================================================================
            // Locals (0x06 - 0x0D, 0x11 - 0x13)
            // ================================================================
            0x06 => self.load_local(0), // ldloc.0
            0x07 => self.load_local(1), // ldloc.1
            0x08 => self.load_local(2), // ldloc.2
            0x09 => self.load_local(3), // ldloc.3
            0x0A => self.store_local(0), // stloc.0
            0x0B => self.store_local(1), // stloc.1
            0x0C => self.store_local(2), // stloc.2
            0x0D => self.store_local(3), // stloc.3
            0x11 => {
                // ldloc.s
                let index = Self::slot_operand(instruction)?;
                self.load_local(index)
            }
            0x12 => self.push_address(), // ldloca.s
            0x13 => {
                // stloc.s
                let index = Self::slot_operand(instruction)?;
                self.store_local(index)
            }

            // ================================================================
            // Constants (0x15 - 0x23)
            // ================================================================
            0x15..=0x20 => {
                // ldc.i4.m1 - ldc.i4.8, ldc.i4.s, ldc.i4
                let value = instruction
                    .ldc_i4_value()
                    .ok_or_else(|| Self::invalid_operand(instruction, "int32"))?;
                self.stack.push(EmValue::i32(value))
            }
            0x21 => {
                // ldc.i8
                let value = instruction
                    .get_i64_operand()
                    .ok_or_else(|| Self::invalid_operand(instruction, "int64"))?;
                self.stack.push(EmValue::I64(value))
            }
            0x22 | 0x23 => {
                // ldc.r4, ldc.r8
                let value = instruction
                    .get_f64_operand()
                    .ok_or_else(|| Self::invalid_operand(instruction, "float"))?;
                self.stack.push(EmValue::F64(value))
            }

            // ================================================================
            // Branches (0x2B - 0x45)
            // ================================================================
            0x2B..=0x45 => self.branch(instruction),

            // ================================================================
            // Narrow Loads (0x47, 0x49, 0x91, 0x93)
            // ================================================================
            0x47 | 0x91 => self.load_narrow(instruction, 8), // ldind.u1, ldelem.u1
            0x49 | 0x93 => self.load_narrow(instruction, 16), // ldind.u2, ldelem.u2

            // ================================================================
            // Arithmetic (0x58 - 0x5E, 0xD6 - 0xDB)
            // ================================================================
            0x58 => self.binary_op(BinaryOp::Add),      // add
            0x59 => self.binary_op(BinaryOp::Sub),      // sub
            0x5A => self.binary_op(BinaryOp::Mul),      // mul
            0x5B => self.binary_op(BinaryOp::Div),      // div
            0x5C => self.binary_op(BinaryOp::DivUn),    // div.un
            0x5D => self.binary_op(BinaryOp::Rem),      // rem
            0x5E => self.binary_op(BinaryOp::RemUn),    // rem.un
            0xD6 => self.binary_op(BinaryOp::AddOvf),   // add.ovf
            0xD7 => self.binary_op(BinaryOp::AddOvfUn), // add.ovf.un
            0xD8 => self.binary_op(BinaryOp::MulOvf),   // mul.ovf
            0xD9 => self.binary_op(BinaryOp::MulOvfUn), // mul.ovf.un
            0xDA => self.binary_op(BinaryOp::SubOvf),   // sub.ovf
            0xDB => self.binary_op(BinaryOp::SubOvfUn), // sub.ovf.un

            // ================================================================
            // Bitwise (0x5F - 0x66)
            // ================================================================
            0x5F => self.binary_op(BinaryOp::And),   // and
            0x60 => self.binary_op(BinaryOp::Or),    // or
            0x61 => self.binary_op(BinaryOp::Xor),   // xor
            0x62 => self.binary_op(BinaryOp::Shl),   // shl
            0x63 => self.binary_op(BinaryOp::Shr),   // shr
            0x64 => self.binary_op(BinaryOp::ShrUn), // shr.un
            0x65 => self.unary_op(UnaryOp::Neg),     // neg
            0x66 => self.unary_op(UnaryOp::Not),     // not

            // ================================================================
            // Conversions (0x67 - 0x6E, 0x76, 0x82 - 0x8B, 0xB3 - 0xBA, 0xD1 - 0xD5, 0xE0)
            // ================================================================
            0x67 => self.convert(ConversionType::I1),      // conv.i1
            0x68 => self.convert(ConversionType::I2),      // conv.i2
            0x69 => self.convert(ConversionType::I4),      // conv.i4
            0x6A => self.convert(ConversionType::I8),      // conv.i8
            0x6B => self.convert(ConversionType::R4),      // conv.r4
            0x6C => self.convert(ConversionType::R8),      // conv.r8
            0x6D => self.convert(ConversionType::U4),      // conv.u4
            0x6E => self.convert(ConversionType::U8),      // conv.u8
            0x76 => self.convert(ConversionType::RUn),     // conv.r.un
            0x82 => self.convert(ConversionType::I1OvfUn), // conv.ovf.i1.un
            0x83 => self.convert(ConversionType::I2OvfUn), // conv.ovf.i2.un
            0x84 => self.convert(ConversionType::I4OvfUn), // conv.ovf.i4.un
            0x85 => self.convert(ConversionType::I8OvfUn), // conv.ovf.i8.un
            0x86 => self.convert(ConversionType::U1OvfUn), // conv.ovf.u1.un
            0x87 => self.convert(ConversionType::U2OvfUn), // conv.ovf.u2.un
            0x88 => self.convert(ConversionType::U4OvfUn), // conv.ovf.u4.un
            0x89 => self.convert(ConversionType::U8OvfUn), // conv.ovf.u8.un
            0x8A => self.convert(ConversionType::IOvfUn),  // conv.ovf.i.un
            0x8B => self.convert(ConversionType::UOvfUn),  // conv.ovf.u.un
            0xB3 => self.convert(ConversionType::I1Ovf),   // conv.ovf.i1
            0xB4 => self.convert(ConversionType::U1Ovf),   // conv.ovf.u1
            0xB5 => self.convert(ConversionType::I2Ovf),   // conv.ovf.i2
            0xB6 => self.convert(ConversionType::U2Ovf),   // conv.ovf.u2
            0xB7 => self.convert(ConversionType::I4Ovf),   // conv.ovf.i4
            0xB8 => self.convert(ConversionType::U4Ovf),   // conv.ovf.u4
            0xB9 => self.convert(ConversionType::I8Ovf),   // conv.ovf.i8
            0xBA => self.convert(ConversionType::U8Ovf),   // conv.ovf.u8
            0xD1 => self.convert(ConversionType::U2),      // conv.u2
            0xD2 => self.convert(ConversionType::U1),      // conv.u1
            0xD3 => self.convert(ConversionType::I),       // conv.i
            0xD4 => self.convert(ConversionType::IOvf),    // conv.ovf.i
            0xD5 => self.convert(ConversionType::UOvf),    // conv.ovf.u
            0xE0 => self.convert(ConversionType::U),       // conv.u

            _ => self.opaque(instruction),
        }
    }

    fn execute_fe_prefixed(&mut self, instruction: &Instruction) -> Result<()> {
        match instruction.opcode {
            // ================================================================
            // Comparisons (0xFE 0x01 - 0x05)
            // ================================================================
            0x01 => self.compare(CompareOp::Eq),   // ceq
            0x02 => self.compare(CompareOp::Gt),   // cgt
            0x03 => self.compare(CompareOp::GtUn), // cgt.un
            0x04 => self.compare(CompareOp::Lt),   // clt
            0x05 => self.compare(CompareOp::LtUn), // clt.un

            // ================================================================
            // Long-form Slots (0xFE 0x09 - 0x0E)
            // ================================================================
            0x09 => {
                // ldarg
                let index = Self::slot_operand(instruction)?;
                self.load_argument(index)
            }
            0x0B => {
                // starg
                let index = Self::slot_operand(instruction)?;
                self.store_argument(index)
            }
            0x0C => {
                // ldloc
                let index = Self::slot_operand(instruction)?;
                self.load_local(index)
            }
            0x0E => {
                // stloc
                let index = Self::slot_operand(instruction)?;
                self.store_local(index)
            }
            0x0A | 0x0D => self.push_address(), // ldarga, ldloca

            // ================================================================
            // Prefixes (unaligned., volatile., tail., constrained., no., readonly.)
            // ================================================================
            0x12 | 0x13 | 0x14 | 0x16 | 0x19 | 0x1E => Ok(()),

            _ => self.opaque(instruction),
        }
    }
}

impl InstructionEmulator for Interpreter {
    fn initialize(&mut self, params: &[Local], locals: &[Local], init_locals: bool) {
        self.stack.clear();
        self.stack.set_max_depth(self.limits.max_stack_depth);
        self.args.reset(params, false);
        self.locals.reset(locals, init_locals);
        self.executed = 0;
    }

    fn set_local(&mut self, index: u16, value: EmValue) -> Result<()> {
        self.locals.set(index, value)
    }

    fn get_local(&self, index: u16) -> Result<&EmValue> {
        self.locals.get(index)
    }

    fn emulate(&mut self, instruction: &Instruction) -> Result<()> {
        self.step(instruction)
    }

    fn pop(&mut self) -> Result<EmValue> {
        self.stack.pop()
    }
}
