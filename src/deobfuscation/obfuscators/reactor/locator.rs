//! Locating the keystream loop inside a decrypter method.
//!
//! The resource decrypter generated by .NET Reactor folds every encrypted word into a running
//! sum computed by a short, per-assembly-generated instruction sequence. Two shapes of that
//! sequence are recognised:
//!
//! - **Two-phase** ([`LocateStrategy::TwoPhase`]): the loop body ends with the byte fold
//!   `conv.u; ldelem.u1; or; stloc; ldloc L; ldloc; add; stloc L`. The instructions following
//!   it (directly, or at the target of a `br`) load `L` again; from there the window extends
//!   up to, but not including, the first store back to `L`.
//! - **Single-phase** ([`LocateStrategy::SinglePhase`]): the update is closed by the
//!   floating-point round trip `conv.r.un; conv.r8; conv.u4; add`. The window starts at the
//!   target of the nearest preceding forward `br` and ends at that `add`. A `bne.un` inside the
//!   straight-line code before the round trip marks the [`Dialect::GuardedDecrementLoop`].
//!
//! The selected instructions are cloned into a [`LoopWindow`], which is all the magic-word
//! calculation needs from the method afterwards.

use strum::{Display, EnumIter};

use crate::{
    assembly::{opcodes, Instruction},
    deobfuscation::LocateStrategies,
    metadata::method::Method,
    Error, Result,
};

/// Instruction shape of the keystream loop, as emitted by different generator versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Dialect {
    /// Straight-line update; every instruction of the window is emulated.
    #[default]
    StandardLoop,
    /// Update interleaved with `if (x == 0) x--;` guards that are dead once `x` is known non-zero.
    GuardedDecrementLoop,
}

/// Which locating strategy produced a [`LoopWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum LocateStrategy {
    /// Byte-fold pattern followed by the accumulator update.
    TwoPhase,
    /// Floating-point round trip closing the accumulator update.
    SinglePhase,
}

/// The instructions implementing one keystream update, copied out of the decrypter method.
#[derive(Debug, Clone)]
pub struct LoopWindow {
    /// Strategy that matched
    pub strategy: LocateStrategy,
    /// Dialect of the matched loop
    pub dialect: Dialect,
    /// Index of the first window instruction in the method
    pub start: usize,
    /// Index of the last window instruction in the method (inclusive)
    pub end: usize,
    /// Local slot carrying the running sum
    pub accumulator: u16,
    /// Every local loaded or stored inside the window, in order of first use
    pub touched_locals: Vec<u16>,
    /// Cloned instructions `start..=end`
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Copy)]
struct LoopMatch {
    strategy: LocateStrategy,
    dialect: Dialect,
    start: usize,
    end: usize,
    accumulator: u16,
}

impl LoopWindow {
    fn new(method: &Method, found: LoopMatch) -> Self {
        let instructions = method.instructions[found.start..=found.end].to_vec();

        let mut touched_locals: Vec<u16> = Vec::new();
        for instruction in &instructions {
            if let Some(local) =
                loaded_local(method, instruction).or_else(|| stored_local(method, instruction))
            {
                if !touched_locals.contains(&local) {
                    touched_locals.push(local);
                }
            }
        }

        LoopWindow {
            strategy: found.strategy,
            dialect: found.dialect,
            start: found.start,
            end: found.end,
            accumulator: found.accumulator,
            touched_locals,
            instructions,
        }
    }

    /// Number of instructions in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the window holds no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Finds the keystream loop of `method`, trying the enabled strategies in order.
///
/// # Errors
///
/// Returns [`Error::LoopNotFound`] if no enabled strategy matches.
pub fn locate(method: &Method, strategies: LocateStrategies) -> Result<LoopWindow> {
    let found = strategies
        .contains(LocateStrategies::TWO_PHASE)
        .then(|| find_two_phase(method))
        .flatten()
        .or_else(|| {
            strategies
                .contains(LocateStrategies::SINGLE_PHASE)
                .then(|| find_single_phase(method))
                .flatten()
        });

    let Some(found) = found else {
        log::debug!(
            "No keystream loop in {} ({} instructions)",
            method.name,
            method.instructions.len()
        );
        return Err(Error::LoopNotFound);
    };

    log::debug!(
        "{} loop in {}: window [{}..={}], accumulator V_{}, dialect {}",
        found.strategy,
        method.name,
        found.start,
        found.end,
        found.accumulator,
        found.dialect
    );

    Ok(LoopWindow::new(method, found))
}

fn find_two_phase(method: &Method) -> Option<LoopMatch> {
    let instructions = &method.instructions;

    // the first byte fold decides; a failed end search is not retried further down
    let (start, accumulator) = (0..instructions.len().saturating_sub(8))
        .find_map(|index| two_phase_start(method, index))?;

    let store = instructions[start..]
        .iter()
        .take_while(|instruction| instruction.is_sequential())
        .position(|instruction| stored_local(method, instruction) == Some(accumulator))?;
    let end = (start + store).checked_sub(1)?;

    (end >= start).then_some(LoopMatch {
        strategy: LocateStrategy::TwoPhase,
        dialect: Dialect::StandardLoop,
        start,
        end,
        accumulator,
    })
}

fn two_phase_start(method: &Method, index: usize) -> Option<(usize, u16)> {
    let shape = method.instructions.get(index..index + 9)?;

    if !(is_opcode(&shape[0], opcodes::CONV_U)
        && is_opcode(&shape[1], opcodes::LDELEM_U1)
        && is_opcode(&shape[2], opcodes::OR))
    {
        return None;
    }
    stored_local(method, &shape[3])?;
    let counter = loaded_local(method, &shape[4])?;
    loaded_local(method, &shape[5])?;
    if !is_opcode(&shape[6], opcodes::ADD) || stored_local(method, &shape[7]) != Some(counter) {
        return None;
    }

    let start = if shape[8].is_br() {
        method.branch_target_index(index + 8)?
    } else {
        index + 8
    };

    (loaded_local(method, &method.instructions[start]) == Some(counter))
        .then_some((start, counter))
}

fn find_single_phase(method: &Method) -> Option<LoopMatch> {
    (0..method.instructions.len().saturating_sub(3))
        .find_map(|index| single_phase_at(method, index))
}

fn single_phase_at(method: &Method, index: usize) -> Option<LoopMatch> {
    let instructions = &method.instructions;
    let shape = instructions.get(index..index + 4)?;

    if !(is_opcode(&shape[0], opcodes::CONV_R_UN)
        && is_opcode(&shape[1], opcodes::CONV_R8)
        && is_opcode(&shape[2], opcodes::CONV_U4)
        && is_opcode(&shape[3], opcodes::ADD))
    {
        return None;
    }

    let end = index + 3;
    let start = single_phase_start(method, end)?;
    if start > end {
        return None;
    }
    let accumulator = loaded_local(method, &instructions[start])?;

    Some(LoopMatch {
        strategy: LocateStrategy::SinglePhase,
        dialect: classify(&instructions[..=end]),
        start,
        end,
        accumulator,
    })
}

/// Walks back from the end of `instructions` through straight-line code; `bne.un` guards are
/// stepped over and select the guarded dialect. The first instruction is never inspected.
fn classify(instructions: &[Instruction]) -> Dialect {
    let mut dialect = Dialect::StandardLoop;

    for instruction in instructions.iter().skip(1).rev() {
        if instruction.is_sequential() {
            continue;
        }
        if instruction.is_bne_un() {
            dialect = Dialect::GuardedDecrementLoop;
            continue;
        }
        break;
    }

    dialect
}

/// Target of the nearest `br` at or before `end` that jumps forward.
///
/// A backward `br` is given one more chance through the branch right before it.
fn single_phase_start(method: &Method, end: usize) -> Option<usize> {
    for branch in (0..=end).rev() {
        if !method.instructions[branch].is_br() {
            continue;
        }
        let Some(target) = method.branch_target_index(branch) else {
            continue;
        };
        if target >= branch {
            return Some(target);
        }

        let previous = branch
            .checked_sub(1)
            .and_then(|previous| method.branch_target_index(previous));
        if let Some(target) = previous.filter(|&target| target >= branch) {
            return Some(target);
        }
    }

    None
}

fn is_opcode(instruction: &Instruction, opcode: u8) -> bool {
    instruction.prefix == 0 && instruction.opcode == opcode
}

/// Declared local loaded by `instruction`.
pub(super) fn loaded_local(method: &Method, instruction: &Instruction) -> Option<u16> {
    if !instruction.is_ldloc() {
        return None;
    }
    instruction
        .local_index()
        .filter(|&index| method.local(index).is_some())
}

/// Declared local stored by `instruction`.
pub(super) fn stored_local(method: &Method, instruction: &Instruction) -> Option<u16> {
    if !instruction.is_stloc() {
        return None;
    }
    instruction
        .local_index()
        .filter(|&index| method.local(index).is_some())
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::test::{
        guarded_decrement_method, increment_loop_method, no_loop_method, single_phase_method,
        MethodBuilder,
    };

    #[test]
    fn two_phase_window() {
        let method = increment_loop_method();
        let window = locate(&method, LocateStrategies::all()).unwrap();

        assert_eq!(window.strategy, LocateStrategy::TwoPhase);
        assert_eq!(window.dialect, Dialect::StandardLoop);
        assert_eq!((window.start, window.end), (8, 10));
        assert_eq!(window.accumulator, 0);
        assert_eq!(window.len(), 3);
        assert_eq!(window.touched_locals, vec![0]);
        assert_eq!(window.instructions[0].mnemonic, "ldloc.0");
    }

    #[test]
    fn two_phase_follows_branch_to_start() {
        let method = MethodBuilder::new("Branched")
            .locals(4)
            .build(|asm| {
                asm.conv_u()?
                    .ldelem_u1()?
                    .or()?
                    .stloc(2)?
                    .ldloc(1)?
                    .ldloc(3)?
                    .add()?
                    .stloc(1)?
                    .br("update")?
                    .nop()?
                    .label("update")?
                    .ldloc(1)?
                    .ldc_i4(7)?
                    .mul()?
                    .stloc(1)?
                    .ret()?;
                Ok(())
            });

        let window = locate(&method, LocateStrategies::TWO_PHASE).unwrap();
        assert_eq!((window.start, window.end), (10, 12));
        assert_eq!(window.accumulator, 1);
    }

    #[test]
    fn two_phase_rejects_branch_before_store() {
        let method = MethodBuilder::new("Broken")
            .locals(4)
            .build(|asm| {
                asm.conv_u()?
                    .ldelem_u1()?
                    .or()?
                    .stloc(2)?
                    .ldloc(0)?
                    .ldloc(3)?
                    .add()?
                    .stloc(0)?
                    .ldloc(0)?
                    .brtrue("out")?
                    .ldloc(0)?
                    .stloc(0)?
                    .label("out")?
                    .ret()?;
                Ok(())
            });

        assert!(matches!(
            locate(&method, LocateStrategies::TWO_PHASE),
            Err(Error::LoopNotFound)
        ));
    }

    #[test]
    fn single_phase_window() {
        let method = single_phase_method();
        let window = locate(&method, LocateStrategies::all()).unwrap();

        assert_eq!(window.strategy, LocateStrategy::SinglePhase);
        assert_eq!(window.dialect, Dialect::StandardLoop);
        assert_eq!((window.start, window.end), (2, 7));
        assert_eq!(window.accumulator, 0);
    }

    #[test]
    fn guarded_dialect() {
        let method = guarded_decrement_method();
        let window = locate(&method, LocateStrategies::all()).unwrap();

        assert_eq!(window.strategy, LocateStrategy::SinglePhase);
        assert_eq!(window.dialect, Dialect::GuardedDecrementLoop);
        assert_eq!((window.start, window.end), (2, 18));
        assert_eq!(window.touched_locals, vec![0, 2]);
    }

    #[test]
    fn backward_branch_resolved_through_predecessor() {
        let method = MethodBuilder::new("Indirect")
            .locals(2)
            .build(|asm| {
                asm.label("top")?
                    .nop()?
                    .brfalse("update")?
                    .br("top")?
                    .nop()?
                    .label("update")?
                    .ldloc(1)?
                    .ldloc(1)?
                    .conv_r_un()?
                    .conv_r8()?
                    .conv_u4()?
                    .add()?
                    .ret()?;
                Ok(())
            });

        let window = locate(&method, LocateStrategies::SINGLE_PHASE).unwrap();
        assert_eq!((window.start, window.end), (4, 9));
        assert_eq!(window.accumulator, 1);
    }

    #[test]
    fn single_phase_start_must_load_a_local() {
        let method = MethodBuilder::new("NoLoad")
            .locals(1)
            .build(|asm| {
                asm.br("update")?
                    .label("update")?
                    .ldc_i4(3)?
                    .ldloc(0)?
                    .conv_r_un()?
                    .conv_r8()?
                    .conv_u4()?
                    .add()?
                    .ret()?;
                Ok(())
            });

        assert!(matches!(
            locate(&method, LocateStrategies::all()),
            Err(Error::LoopNotFound)
        ));
    }

    #[test]
    fn single_phase_start_after_end_is_skipped() {
        // the first round trip is reached only through a branch past it, so its guard must
        // not leak into the dialect of the loop that is finally accepted
        let method = MethodBuilder::new("Rescan")
            .locals(3)
            .build(|asm| {
                asm.br("late")?
                    .ldloc(0)?
                    .ldloc(2)?
                    .ldc_i4(0)?
                    .bne_un("after")?
                    .label("after")?
                    .ldloc(0)?
                    .conv_r_un()?
                    .conv_r8()?
                    .conv_u4()?
                    .add()?
                    .stloc(0)?
                    .label("late")?
                    .br("start")?
                    .nop()?
                    .label("start")?
                    .ldloc(1)?
                    .ldloc(1)?
                    .conv_r_un()?
                    .conv_r8()?
                    .conv_u4()?
                    .add()?
                    .stloc(1)?
                    .ret()?;
                Ok(())
            });

        let window = locate(&method, LocateStrategies::SINGLE_PHASE).unwrap();
        assert_eq!(window.strategy, LocateStrategy::SinglePhase);
        assert_eq!((window.start, window.end), (13, 18));
        assert_eq!(window.accumulator, 1);
        assert_eq!(window.dialect, Dialect::StandardLoop);
        assert_eq!(window.touched_locals, vec![1]);
    }

    #[test]
    fn strategies_can_be_disabled() {
        assert!(locate(&increment_loop_method(), LocateStrategies::SINGLE_PHASE).is_err());
        assert!(locate(&single_phase_method(), LocateStrategies::TWO_PHASE).is_err());
        assert!(locate(&single_phase_method(), LocateStrategies::empty()).is_err());
    }

    #[test]
    fn no_loop() {
        assert!(matches!(
            locate(&no_loop_method(), LocateStrategies::all()),
            Err(Error::LoopNotFound)
        ));
    }

    #[test]
    fn dialect_names() {
        let names: Vec<String> = Dialect::iter().map(|d| d.to_string()).collect();
        assert_eq!(names, vec!["StandardLoop", "GuardedDecrementLoop"]);
        assert_eq!(Dialect::default(), Dialect::StandardLoop);
    }
}
