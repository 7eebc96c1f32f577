//! Mnemonic-driven CIL encoding with label resolution.
//!
//! [`InstructionEncoder`] is the inverse of the decoder: it looks up a mnemonic in the opcode
//! tables, writes the opcode and its operand, and records branch fixups against named labels
//! that are patched when the encoder is finalized. It does not shorten branches; short forms
//! are emitted only when asked for explicitly (`br.s`, `bne.un.s`, ...).
//!
//! The fluent [`crate::assembly::InstructionAssembler`] wraps this type for hand-written code.

use std::{collections::HashMap, sync::OnceLock};

use crate::{
    assembly::{
        instruction::{FlowType, Immediate, Operand, OperandType},
        instructions::{CilInstruction, INSTRUCTIONS, INSTRUCTIONS_FE},
    },
    Error, Result,
};

type MnemonicEntry = (u8, u8, &'static CilInstruction<'static>);

static MNEMONIC_TO_OPCODE: OnceLock<HashMap<&'static str, MnemonicEntry>> = OnceLock::new();

fn get_mnemonic_lookup() -> &'static HashMap<&'static str, MnemonicEntry> {
    MNEMONIC_TO_OPCODE.get_or_init(|| {
        let mut map = HashMap::new();

        for (opcode, instr) in (0_u8..).zip(INSTRUCTIONS.iter()) {
            if !instr.is_reserved() {
                map.insert(instr.instr, (opcode, 0, instr));
            }
        }

        for (opcode, instr) in (0_u8..).zip(INSTRUCTIONS_FE.iter()) {
            if !instr.is_reserved() {
                map.insert(instr.instr, (opcode, 0xFE, instr));
            }
        }

        map
    })
}

/// A branch displacement that is patched once all labels are known.
#[derive(Debug, Clone)]
struct LabelFixup {
    label: String,
    fixup_position: usize,
    offset_size: u8,
}

/// Encodes CIL instructions into bytecode.
///
/// # Examples
///
/// ```rust
/// use keyscope::assembly::InstructionEncoder;
///
/// let mut encoder = InstructionEncoder::new();
/// encoder.emit_ldloc(0)?;
/// encoder.emit_ldc_i4(1)?;
/// encoder.emit_instruction("add", None)?;
/// encoder.emit_stloc(0)?;
/// encoder.emit_branch("br.s", "top")?;
/// encoder.define_label("top")?;
/// encoder.emit_instruction("ret", None)?;
///
/// let (bytecode, max_stack, labels) = encoder.finalize()?;
/// assert_eq!(bytecode, vec![0x06, 0x17, 0x58, 0x0A, 0x2B, 0x00, 0x2A]);
/// assert_eq!(max_stack, 2);
/// assert_eq!(labels["top"], 6);
/// # Ok::<(), keyscope::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct InstructionEncoder {
    bytecode: Vec<u8>,
    labels: HashMap<String, u32>,
    fixups: Vec<LabelFixup>,
    current_stack_depth: u16,
    max_stack_depth: u16,
}

impl InstructionEncoder {
    /// Create an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a non-branch instruction.
    ///
    /// # Arguments
    ///
    /// * `mnemonic` - ECMA-335 mnemonic (`"add"`, `"ldc.i4.s"`, `"conv.r.un"`, ...)
    /// * `operand` - The operand, which must match the opcode's operand type exactly
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidMnemonic`] for unknown mnemonics and
    /// [`crate::Error::WrongOperandType`] / [`crate::Error::UnexpectedOperand`] when the
    /// operand does not fit the opcode. Branches must go through [`InstructionEncoder::emit_branch`].
    pub fn emit_instruction(&mut self, mnemonic: &str, operand: Option<Operand>) -> Result<()> {
        let (opcode, prefix, metadata) = Self::lookup(mnemonic)?;

        if matches!(
            metadata.flow,
            FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Leave
        ) {
            return Err(Error::InvalidBranch(format!(
                "branch '{mnemonic}' needs a label"
            )));
        }

        if prefix != 0 {
            self.bytecode.push(prefix);
        }
        self.bytecode.push(opcode);
        self.emit_operand(operand, metadata.op_type)?;
        self.update_stack_depth(metadata.stack_pops, metadata.stack_pushes);

        Ok(())
    }

    /// Emit a branch to a named label, defined before or after this call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidBranch`] if `mnemonic` is not a branch.
    pub fn emit_branch(&mut self, mnemonic: &str, label: &str) -> Result<()> {
        let (opcode, prefix, metadata) = Self::lookup(mnemonic)?;

        if !matches!(
            metadata.flow,
            FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Leave
        ) {
            return Err(Error::InvalidBranch(format!(
                "instruction '{mnemonic}' is not a branch instruction"
            )));
        }

        let offset_size = match metadata.op_type {
            OperandType::Int8 => 1,
            OperandType::Int32 => 4,
            _ => {
                return Err(Error::InvalidBranch(
                    "operand type must be Int8 or Int32".to_string(),
                ))
            }
        };

        if prefix != 0 {
            self.bytecode.push(prefix);
        }
        self.bytecode.push(opcode);

        self.fixups.push(LabelFixup {
            label: label.to_string(),
            fixup_position: self.bytecode.len(),
            offset_size,
        });
        self.bytecode
            .extend(std::iter::repeat(0).take(usize::from(offset_size)));

        self.update_stack_depth(metadata.stack_pops, metadata.stack_pushes);
        Ok(())
    }

    /// Emit the shortest `ldloc` form for `index`.
    ///
    /// # Errors
    ///
    /// Never fails for valid indices; the `Result` mirrors [`InstructionEncoder::emit_instruction`].
    pub fn emit_ldloc(&mut self, index: u16) -> Result<()> {
        match index {
            0 => self.emit_instruction("ldloc.0", None),
            1 => self.emit_instruction("ldloc.1", None),
            2 => self.emit_instruction("ldloc.2", None),
            3 => self.emit_instruction("ldloc.3", None),
            x => match u8::try_from(x) {
                Ok(short) => self.emit_instruction(
                    "ldloc.s",
                    Some(Operand::Immediate(Immediate::UInt8(short))),
                ),
                Err(_) => {
                    self.emit_instruction("ldloc", Some(Operand::Immediate(Immediate::UInt16(x))))
                }
            },
        }
    }

    /// Emit the shortest `stloc` form for `index`.
    ///
    /// # Errors
    ///
    /// Never fails for valid indices; the `Result` mirrors [`InstructionEncoder::emit_instruction`].
    pub fn emit_stloc(&mut self, index: u16) -> Result<()> {
        match index {
            0 => self.emit_instruction("stloc.0", None),
            1 => self.emit_instruction("stloc.1", None),
            2 => self.emit_instruction("stloc.2", None),
            3 => self.emit_instruction("stloc.3", None),
            x => match u8::try_from(x) {
                Ok(short) => self.emit_instruction(
                    "stloc.s",
                    Some(Operand::Immediate(Immediate::UInt8(short))),
                ),
                Err(_) => {
                    self.emit_instruction("stloc", Some(Operand::Immediate(Immediate::UInt16(x))))
                }
            },
        }
    }

    /// Emit the shortest `ldarg` form for `index`.
    ///
    /// # Errors
    ///
    /// Never fails for valid indices; the `Result` mirrors [`InstructionEncoder::emit_instruction`].
    pub fn emit_ldarg(&mut self, index: u16) -> Result<()> {
        match index {
            0 => self.emit_instruction("ldarg.0", None),
            1 => self.emit_instruction("ldarg.1", None),
            2 => self.emit_instruction("ldarg.2", None),
            3 => self.emit_instruction("ldarg.3", None),
            x => match u8::try_from(x) {
                Ok(short) => self.emit_instruction(
                    "ldarg.s",
                    Some(Operand::Immediate(Immediate::UInt8(short))),
                ),
                Err(_) => {
                    self.emit_instruction("ldarg", Some(Operand::Immediate(Immediate::UInt16(x))))
                }
            },
        }
    }

    /// Emit the shortest `ldc.i4` form for `value`.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` mirrors [`InstructionEncoder::emit_instruction`].
    pub fn emit_ldc_i4(&mut self, value: i32) -> Result<()> {
        match value {
            -1 => self.emit_instruction("ldc.i4.m1", None),
            0 => self.emit_instruction("ldc.i4.0", None),
            1 => self.emit_instruction("ldc.i4.1", None),
            2 => self.emit_instruction("ldc.i4.2", None),
            3 => self.emit_instruction("ldc.i4.3", None),
            4 => self.emit_instruction("ldc.i4.4", None),
            5 => self.emit_instruction("ldc.i4.5", None),
            6 => self.emit_instruction("ldc.i4.6", None),
            7 => self.emit_instruction("ldc.i4.7", None),
            8 => self.emit_instruction("ldc.i4.8", None),
            x => match i8::try_from(x) {
                Ok(short) => self.emit_instruction(
                    "ldc.i4.s",
                    Some(Operand::Immediate(Immediate::Int8(short))),
                ),
                Err(_) => {
                    self.emit_instruction("ldc.i4", Some(Operand::Immediate(Immediate::Int32(x))))
                }
            },
        }
    }

    /// Bind `name` to the current position.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DuplicateLabel`] if the label is already defined.
    pub fn define_label(&mut self, name: &str) -> Result<()> {
        if self.labels.contains_key(name) {
            return Err(Error::DuplicateLabel(name.to_string()));
        }

        let position = u32::try_from(self.bytecode.len())
            .map_err(|_| malformed_error!("Bytecode length exceeds u32 range"))?;
        self.labels.insert(name.to_string(), position);
        Ok(())
    }

    /// Resolve all branch fixups and return `(bytecode, max_stack, labels)`.
    ///
    /// `max_stack` is a straight-line estimate: depth is tracked in emission order and never
    /// goes below zero, so it is exact only for code without merging control flow.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UndefinedLabel`] for branches to unknown labels and
    /// [`crate::Error::InvalidBranch`] when a short branch cannot reach its label.
    pub fn finalize(mut self) -> Result<(Vec<u8>, u16, HashMap<String, u32>)> {
        let fixups = std::mem::take(&mut self.fixups);
        for fixup in &fixups {
            let label_position = self
                .labels
                .get(&fixup.label)
                .ok_or_else(|| Error::UndefinedLabel(fixup.label.clone()))?;

            let next_instruction_pos = fixup.fixup_position + usize::from(fixup.offset_size);
            let label_pos_i64 = i64::from(*label_position);
            let next_pos_i64 = i64::try_from(next_instruction_pos)
                .map_err(|_| malformed_error!("Instruction position exceeds i64 range"))?;

            self.write_branch_offset(label_pos_i64 - next_pos_i64, fixup)?;
        }

        Ok((self.bytecode, self.max_stack_depth, self.labels))
    }

    fn lookup(mnemonic: &str) -> Result<MnemonicEntry> {
        get_mnemonic_lookup()
            .get(mnemonic)
            .copied()
            .ok_or_else(|| Error::InvalidMnemonic(mnemonic.to_string()))
    }

    fn write_branch_offset(&mut self, offset: i64, fixup: &LabelFixup) -> Result<()> {
        let position = fixup.fixup_position;
        match fixup.offset_size {
            1 => {
                let offset_i8 = i8::try_from(offset).map_err(|_| {
                    Error::InvalidBranch(format!(
                        "offset {offset} to '{}' out of range for 1-byte instruction",
                        fixup.label
                    ))
                })?;
                self.bytecode[position] = offset_i8.to_le_bytes()[0];
            }
            _ => {
                let offset_i32 = i32::try_from(offset)
                    .map_err(|_| malformed_error!("Branch offset exceeds i32 range"))?;
                self.bytecode[position..position + 4].copy_from_slice(&offset_i32.to_le_bytes());
            }
        }
        Ok(())
    }

    fn emit_operand(&mut self, operand: Option<Operand>, expected: OperandType) -> Result<()> {
        let wrong = || Error::WrongOperandType {
            expected: format!("{expected:?}"),
        };

        match (expected, operand) {
            (OperandType::None, None) => {}
            (OperandType::None, Some(_)) => return Err(Error::UnexpectedOperand),
            (_, None) => return Err(wrong()),
            (OperandType::Token, Some(Operand::Token(token))) => {
                self.bytecode.extend_from_slice(&token.value().to_le_bytes());
            }
            (OperandType::Switch, Some(Operand::Switch(targets))) => {
                let count = u32::try_from(targets.len())
                    .map_err(|_| malformed_error!("Too many switch targets"))?;
                self.bytecode.extend_from_slice(&count.to_le_bytes());
                for target in targets {
                    self.bytecode.extend_from_slice(&target.to_le_bytes());
                }
            }
            (OperandType::UInt8, Some(Operand::Local(idx) | Operand::Argument(idx))) => {
                self.bytecode.push(u8::try_from(idx).map_err(|_| wrong())?);
            }
            (OperandType::UInt16, Some(Operand::Local(idx) | Operand::Argument(idx))) => {
                self.bytecode.extend_from_slice(&idx.to_le_bytes());
            }
            (expected, Some(Operand::Immediate(imm))) => match (expected, imm) {
                (OperandType::Int8, Immediate::Int8(v)) => self.bytecode.extend(v.to_le_bytes()),
                (OperandType::UInt8, Immediate::UInt8(v)) => self.bytecode.push(v),
                (OperandType::Int16, Immediate::Int16(v)) => self.bytecode.extend(v.to_le_bytes()),
                (OperandType::UInt16, Immediate::UInt16(v)) => {
                    self.bytecode.extend(v.to_le_bytes());
                }
                (OperandType::Int32, Immediate::Int32(v)) => self.bytecode.extend(v.to_le_bytes()),
                (OperandType::UInt32, Immediate::UInt32(v)) => {
                    self.bytecode.extend(v.to_le_bytes());
                }
                (OperandType::Int64, Immediate::Int64(v)) => self.bytecode.extend(v.to_le_bytes()),
                (OperandType::UInt64, Immediate::UInt64(v)) => {
                    self.bytecode.extend(v.to_le_bytes());
                }
                (OperandType::Float32, Immediate::Float32(v)) => {
                    self.bytecode.extend(v.to_le_bytes());
                }
                (OperandType::Float64, Immediate::Float64(v)) => {
                    self.bytecode.extend(v.to_le_bytes());
                }
                _ => return Err(wrong()),
            },
            _ => return Err(wrong()),
        }

        Ok(())
    }

    fn update_stack_depth(&mut self, pops: u8, pushes: u8) {
        self.current_stack_depth = self
            .current_stack_depth
            .saturating_sub(u16::from(pops))
            .saturating_add(u16::from(pushes));
        self.max_stack_depth = self.max_stack_depth.max(self.current_stack_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assembly::decode_stream, Parser};

    #[test]
    fn short_forms() {
        let mut encoder = InstructionEncoder::new();
        encoder.emit_ldloc(3).unwrap();
        encoder.emit_ldloc(200).unwrap();
        encoder.emit_ldloc(300).unwrap();
        encoder.emit_stloc(5).unwrap();
        encoder.emit_ldc_i4(-1).unwrap();
        encoder.emit_ldc_i4(100).unwrap();
        encoder.emit_ldc_i4(1000).unwrap();

        let (bytecode, _, _) = encoder.finalize().unwrap();
        assert_eq!(
            bytecode,
            vec![
                0x09, // ldloc.3
                0x11, 0xC8, // ldloc.s 200
                0xFE, 0x0C, 0x2C, 0x01, // ldloc 300
                0x13, 0x05, // stloc.s 5
                0x15, // ldc.i4.m1
                0x1F, 0x64, // ldc.i4.s 100
                0x20, 0xE8, 0x03, 0x00, 0x00, // ldc.i4 1000
            ]
        );
    }

    #[test]
    fn backward_and_forward_branches() {
        let mut encoder = InstructionEncoder::new();
        encoder.define_label("top").unwrap();
        encoder.emit_instruction("nop", None).unwrap();
        encoder.emit_branch("br", "end").unwrap();
        encoder.emit_branch("br.s", "top").unwrap();
        encoder.define_label("end").unwrap();
        encoder.emit_instruction("ret", None).unwrap();

        let (bytecode, _, labels) = encoder.finalize().unwrap();
        assert_eq!(
            bytecode,
            vec![0x00, 0x38, 0x02, 0x00, 0x00, 0x00, 0x2B, 0xF8, 0x2A]
        );
        assert_eq!(labels["end"], 8);

        let instructions = decode_stream(&mut Parser::new(&bytecode), 0).unwrap();
        assert_eq!(instructions[1].branch_target(), Some(8));
        assert_eq!(instructions[2].branch_target(), Some(0));
    }

    #[test]
    fn errors() {
        let mut encoder = InstructionEncoder::new();
        assert!(matches!(
            encoder.emit_instruction("frobnicate", None),
            Err(Error::InvalidMnemonic(_))
        ));
        assert!(matches!(
            encoder.emit_instruction("ldc.i4", None),
            Err(Error::WrongOperandType { .. })
        ));
        assert!(matches!(
            encoder.emit_instruction("add", Some(Operand::Local(1))),
            Err(Error::UnexpectedOperand)
        ));
        assert!(matches!(
            encoder.emit_instruction("br", None),
            Err(Error::InvalidBranch(_))
        ));
        assert!(matches!(
            encoder.emit_branch("add", "x"),
            Err(Error::InvalidBranch(_))
        ));

        encoder.define_label("a").unwrap();
        assert!(matches!(
            encoder.define_label("a"),
            Err(Error::DuplicateLabel(_))
        ));

        encoder.emit_branch("br.s", "missing").unwrap();
        assert!(matches!(encoder.finalize(), Err(Error::UndefinedLabel(_))));
    }

    #[test]
    fn short_branch_out_of_range() {
        let mut encoder = InstructionEncoder::new();
        encoder.emit_branch("br.s", "far").unwrap();
        for _ in 0..200 {
            encoder.emit_instruction("nop", None).unwrap();
        }
        encoder.define_label("far").unwrap();

        assert!(matches!(encoder.finalize(), Err(Error::InvalidBranch(_))));
    }
}
