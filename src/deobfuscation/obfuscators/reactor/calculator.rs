//! Magic-word calculation over a located [`LoopWindow`].
//!
//! Every call starts from a freshly initialised emulator, seeds the accumulator with the
//! running sum and runs the window once. In the [`Dialect::GuardedDecrementLoop`] dialect the
//! generator sprinkles dead decrement guards into the update:
//!
//! ```text
//! ldloc  X
//! ldc.i4.0
//! bne.un AFTER
//! ldloc  X
//! ldc.i4.1
//! sub
//! stloc  X
//! AFTER:
//! ```
//!
//! The interpreter never follows branches, so a guard whose local is already known to be
//! non-zero is stepped over as a whole instead of being emulated.

use crate::{
    assembly::{opcodes, Instruction},
    deobfuscation::obfuscators::reactor::locator::{Dialect, LoopWindow},
    emulation::{EmValue, InstructionEmulator},
    metadata::method::{Local, Method},
    Error, Result,
};

/// Length of a guarded decrement in instructions.
const GUARD_LEN: usize = 7;

/// Runs a [`LoopWindow`] to produce successive keystream words.
#[derive(Debug, Clone)]
pub struct MagicCalculator<E> {
    emulator: E,
    window: LoopWindow,
    params: Vec<Local>,
    locals: Vec<Local>,
    init_locals: bool,
}

impl<E: InstructionEmulator> MagicCalculator<E> {
    /// Creates a calculator for `window`, taking slot declarations from `method`.
    pub fn new(method: &Method, window: LoopWindow, emulator: E) -> Self {
        MagicCalculator {
            emulator,
            window,
            params: method.params.clone(),
            locals: method.locals.clone(),
            init_locals: method.init_locals,
        }
    }

    /// The window being emulated.
    #[must_use]
    pub fn window(&self) -> &LoopWindow {
        &self.window
    }

    /// Computes the keystream word following `input`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MagicCalculation`] if emulation fails or the value left on the stack
    /// is not a fully known 32-bit integer.
    pub fn calculate(&mut self, input: u32) -> Result<u32> {
        self.run(input).map_err(|error| match error {
            Error::MagicCalculation { .. } => error,
            other => {
                log::warn!("Emulation of keystream loop failed: {other}");
                Error::MagicCalculation {
                    reason: other.to_string(),
                }
            }
        })
    }

    fn run(&mut self, input: u32) -> Result<u32> {
        self.emulator
            .initialize(&self.params, &self.locals, self.init_locals);
        self.emulator
            .set_local(self.window.accumulator, EmValue::u32(input))?;

        let instructions = &self.window.instructions;
        let guarded = self.window.dialect == Dialect::GuardedDecrementLoop;

        let mut index = 0;
        while index < instructions.len() {
            if guarded && guard_is_dead(&self.emulator, &instructions[index..]) {
                log::trace!("Skipping guarded decrement at window offset {index}");
                index += GUARD_LEN;
                continue;
            }

            self.emulator.emulate(&instructions[index])?;
            index += 1;
        }

        let result = self.emulator.pop()?;
        result.as_concrete_u32().ok_or_else(|| {
            log::warn!("Keystream loop produced {result} for input {input:#010x}");
            Error::MagicCalculation {
                reason: format!("final stack value {result} is not a concrete int32"),
            }
        })
    }
}

/// Local decremented by the guard at the start of `instructions`, if they start with one.
fn guarded_local(instructions: &[Instruction]) -> Option<u16> {
    let guard = instructions.get(..GUARD_LEN)?;

    let matches = guard[0].is_ldloc()
        && guard[1].ldc_i4_value() == Some(0)
        && guard[2].is_bne_un()
        && guard[3].is_ldloc()
        && guard[4].ldc_i4_value() == Some(1)
        && guard[5].prefix == 0
        && guard[5].opcode == opcodes::SUB
        && guard[6].is_stloc();

    if matches {
        guard[6].local_index()
    } else {
        None
    }
}

/// A guard is dead when the local it decrements already holds a known non-zero value.
/// A local without a value counts as a mismatch.
fn guard_is_dead<E: InstructionEmulator>(emulator: &E, instructions: &[Instruction]) -> bool {
    guarded_local(instructions)
        .and_then(|local| emulator.get_local(local).ok())
        .is_some_and(EmValue::is_nonzero_concrete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        deobfuscation::{obfuscators::reactor::locator::locate, LocateStrategies},
        emulation::Interpreter,
        test::{guarded_decrement_method, increment_loop_method, single_phase_method, MethodBuilder},
    };

    fn calculator(method: &Method) -> MagicCalculator<Interpreter> {
        let window = locate(method, LocateStrategies::all()).unwrap();
        MagicCalculator::new(method, window, Interpreter::default())
    }

    #[test]
    fn increment_sequence() {
        let mut calc = calculator(&increment_loop_method());

        let mut sum = 0;
        for expected in 1..=4 {
            sum = calc.calculate(sum).unwrap();
            assert_eq!(sum, expected);
        }
        assert_eq!(calc.calculate(u32::MAX).unwrap(), 0);
    }

    #[test]
    fn calculation_is_pure() {
        let mut calc = calculator(&single_phase_method());
        let first = calc.calculate(0x1234_5678).unwrap();
        let second = calc.calculate(0x1234_5678).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, 0x2468_ACF0);
    }

    #[test]
    fn dead_guard_is_skipped() {
        let mut calc = calculator(&guarded_decrement_method());
        assert_eq!(calc.window().dialect, Dialect::GuardedDecrementLoop);

        // skipped: 2x + 5, emulated: 2x + 4
        assert_eq!(calc.calculate(10).unwrap(), 25);
        assert_eq!(calc.calculate(0).unwrap(), 5);
    }

    #[test]
    fn guard_is_emulated_in_standard_dialect() {
        let method = guarded_decrement_method();
        let mut window = locate(&method, LocateStrategies::all()).unwrap();
        window.dialect = Dialect::StandardLoop;

        let mut calc = MagicCalculator::new(&method, window, Interpreter::default());
        assert_eq!(calc.calculate(10).unwrap(), 24);
    }

    #[test]
    fn guard_on_zero_local_is_emulated() {
        let method = MethodBuilder::new("ZeroGuard")
            .locals(3)
            .build(|asm| {
                asm.br("start")?
                    .nop()?
                    .label("start")?
                    .ldloc(0)?
                    .ldloc(2)?
                    .ldc_i4(0)?
                    .bne_un("after")?
                    .ldloc(2)?
                    .ldc_i4(1)?
                    .sub()?
                    .stloc(2)?
                    .label("after")?
                    .ldloc(2)?
                    .add()?
                    .ldloc(0)?
                    .conv_r_un()?
                    .conv_r8()?
                    .conv_u4()?
                    .add()?;
                Ok(())
            });

        let mut calc = calculator(&method);
        // local 2 starts at zero, so the decrement runs: 2x - 1
        assert_eq!(calc.calculate(3).unwrap(), 5);
    }

    #[test]
    fn guard_shape() {
        let guard = guarded_decrement_method().instructions[5..12].to_vec();
        assert_eq!(guarded_local(&guard), Some(2));
        assert_eq!(guarded_local(&guard[..6]), None);
        assert_eq!(guarded_local(&guarded_decrement_method().instructions[4..11]), None);
    }

    #[test]
    fn unknown_result_fails() {
        let method = MethodBuilder::new("Argument")
            .locals(1)
            .params(1)
            .build(|asm| {
                asm.br("start")?
                    .label("start")?
                    .ldloc(0)?
                    .ldarg(0)?
                    .conv_r_un()?
                    .conv_r8()?
                    .conv_u4()?
                    .add()?;
                Ok(())
            });

        let mut calc = calculator(&method);
        assert!(matches!(
            calc.calculate(1),
            Err(Error::MagicCalculation { .. })
        ));
    }

    #[test]
    fn emulation_failure_is_reported_as_calculation_error() {
        let method = MethodBuilder::new("Call")
            .locals(1)
            .build(|asm| {
                asm.br("start")?
                    .label("start")?
                    .ldloc(0)?
                    .call(crate::metadata::token::Token::new(0x0A00_0001))?
                    .conv_r_un()?
                    .conv_r8()?
                    .conv_u4()?
                    .add()?;
                Ok(())
            });

        let mut calc = calculator(&method);
        let error = calc.calculate(1).unwrap_err();
        assert!(matches!(error, Error::MagicCalculation { ref reason } if reason.contains("call")));
    }
}
