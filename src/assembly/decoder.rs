//! Linear CIL decoding.
//!
//! Turns raw method code into [`Instruction`]s, one at a time ([`decode_instruction`]) or for a
//! whole buffer ([`decode_stream`]). The locator works on the flat instruction list of a method,
//! so no basic-block construction happens here; branch targets are resolved to absolute RVAs
//! and looked up by the caller.

use crate::{
    assembly::{
        FlowType, Immediate, Instruction, Operand, OperandType, StackBehavior, INSTRUCTIONS,
        INSTRUCTIONS_FE,
    },
    file::parser::Parser,
    metadata::token::Token,
    Result,
};

/// Decodes every instruction from the current parser position to the end of its data.
///
/// # Arguments
///
/// * `parser` - Parser positioned at the first instruction
/// * `rva` - RVA of that first instruction
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the code ends in the middle of an instruction and
/// [`crate::Error::Malformed`] for reserved opcodes.
///
/// # Examples
///
/// ```rust
/// use keyscope::{assembly::decode_stream, Parser};
///
/// let code = [0x06, 0x17, 0x58, 0x0A]; // ldloc.0; ldc.i4.1; add; stloc.0
/// let mut parser = Parser::new(&code);
/// let instructions = decode_stream(&mut parser, 0x1000)?;
///
/// assert_eq!(instructions.len(), 4);
/// assert_eq!(instructions[2].mnemonic, "add");
/// assert_eq!(instructions[3].rva, 0x1003);
/// # Ok::<(), keyscope::Error>(())
/// ```
pub fn decode_stream(parser: &mut Parser, rva: u64) -> Result<Vec<Instruction>> {
    let mut current_rva = rva;
    let mut instructions = Vec::new();

    while parser.has_more_data() {
        let instruction = decode_instruction(parser, current_rva)?;
        current_rva += instruction.size;
        instructions.push(instruction);
    }

    Ok(instructions)
}

/// Decodes a single CIL instruction from the current parser position.
///
/// The parser is advanced past the opcode and its operand. Branch displacements are resolved
/// against the end of the instruction (`rva + size + displacement`) and stored in
/// [`Instruction::branch_targets`].
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] for truncated input and [`crate::Error::Malformed`]
/// for reserved or unassigned opcodes.
pub fn decode_instruction(parser: &mut Parser, rva: u64) -> Result<Instruction> {
    let offset = parser.pos() as u64;
    let first_byte = parser.read_le::<u8>()?;

    let (cil_instruction, prefix, opcode) = match first_byte {
        0xFE => {
            let second_byte = parser.read_le::<u8>()?;

            match INSTRUCTIONS_FE.get(second_byte as usize) {
                Some(instr) => (instr, 0xFE, second_byte),
                None => return Err(malformed_error!("Invalid opcode: FE {:02X}", second_byte)),
            }
        }
        _ => match INSTRUCTIONS.get(first_byte as usize) {
            Some(instr) => (instr, 0, first_byte),
            None => return Err(malformed_error!("Invalid opcode: {:02X}", first_byte)),
        },
    };

    if cil_instruction.is_reserved() {
        return Err(malformed_error!(
            "Reserved opcode: {:02X}{:02X} at RVA 0x{:X}",
            prefix,
            opcode,
            rva
        ));
    }

    let operand = match cil_instruction.op_type {
        OperandType::None => Operand::None,
        OperandType::Int8 => Operand::Immediate(Immediate::Int8(parser.read_le::<i8>()?)),
        OperandType::UInt8 => Operand::Immediate(Immediate::UInt8(parser.read_le::<u8>()?)),
        OperandType::Int16 => Operand::Immediate(Immediate::Int16(parser.read_le::<i16>()?)),
        OperandType::UInt16 => Operand::Immediate(Immediate::UInt16(parser.read_le::<u16>()?)),
        OperandType::Int32 => Operand::Immediate(Immediate::Int32(parser.read_le::<i32>()?)),
        OperandType::UInt32 => Operand::Immediate(Immediate::UInt32(parser.read_le::<u32>()?)),
        OperandType::Int64 => Operand::Immediate(Immediate::Int64(parser.read_le::<i64>()?)),
        OperandType::UInt64 => Operand::Immediate(Immediate::UInt64(parser.read_le::<u64>()?)),
        OperandType::Float32 => Operand::Immediate(Immediate::Float32(parser.read_le::<f32>()?)),
        OperandType::Float64 => Operand::Immediate(Immediate::Float64(parser.read_le::<f64>()?)),
        OperandType::Token => Operand::Token(Token::new(parser.read_le::<u32>()?)),
        OperandType::Switch => {
            let case_count = parser.read_le::<u32>()? as usize;
            // each case needs four bytes; refuse counts the buffer cannot hold
            if case_count > parser.remaining() / 4 {
                return Err(crate::Error::OutOfBounds);
            }

            let mut targets = Vec::with_capacity(case_count);
            for _ in 0..case_count {
                targets.push(parser.read_le::<i32>()?);
            }

            Operand::Switch(targets)
        }
    };
    let size = parser.pos() as u64 - offset;

    let mut instruction = Instruction {
        rva,
        offset,
        size,
        opcode,
        prefix,
        mnemonic: cil_instruction.instr,
        category: cil_instruction.category,
        flow_type: cil_instruction.flow,
        stack_behavior: StackBehavior {
            pops: cil_instruction.stack_pops,
            pushes: cil_instruction.stack_pushes,
            #[allow(clippy::cast_possible_wrap)]
            net_effect: cil_instruction.stack_pushes as i8 - cil_instruction.stack_pops as i8,
        },
        branch_targets: Vec::new(),
        operand,
    };

    let next_instruction_rva = rva + instruction.size;
    match (&instruction.flow_type, &instruction.operand) {
        (
            FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Leave,
            Operand::Immediate(value),
        ) => {
            let branch_offset = u64::from(*value);
            instruction
                .branch_targets
                .push(next_instruction_rva.wrapping_add(branch_offset));
        }
        (FlowType::Switch, Operand::Switch(targets)) => {
            #[allow(clippy::cast_sign_loss)]
            let resolved: Vec<u64> = targets
                .iter()
                .map(|&target| next_instruction_rva.wrapping_add(i64::from(target) as u64))
                .collect();
            instruction.branch_targets = resolved;
        }
        _ => {}
    }

    Ok(instruction)
}

#[cfg(test)]
mod tests {
    use crate::{
        assembly::{decode_instruction, decode_stream, FlowType, Immediate, InstructionCategory, Operand},
        Error, Parser,
    };

    #[test]
    fn decode_instruction_basic() {
        // ldloc.s 10
        let mut parser = Parser::new(&[0x11, 0x0A]);
        let rva = 0x1000;

        let result = decode_instruction(&mut parser, rva).unwrap();

        assert_eq!(result.rva, rva);
        assert_eq!(result.offset, 0);
        assert_eq!(result.size, 2);
        assert_eq!(result.opcode, 0x11);
        assert_eq!(result.prefix, 0);
        assert_eq!(result.mnemonic, "ldloc.s");
        assert_eq!(result.category, InstructionCategory::LoadStore);
        assert_eq!(result.flow_type, FlowType::Sequential);
        assert_eq!(result.operand, Operand::Immediate(Immediate::UInt8(10)));
    }

    #[test]
    fn decode_instruction_two_byte() {
        // ceq
        let mut parser = Parser::new(&[0xFE, 0x01]);
        let result = decode_instruction(&mut parser, 0x1000).unwrap();

        assert_eq!(result.opcode, 0x01);
        assert_eq!(result.prefix, 0xFE);
        assert_eq!(result.mnemonic, "ceq");
        assert_eq!(result.category, InstructionCategory::Comparison);
        assert_eq!(result.stack_behavior.net_effect, -1);
    }

    #[test]
    fn decode_instruction_branch() {
        // br.s +10
        let mut parser = Parser::new(&[0x2B, 0x0A]);
        let result = decode_instruction(&mut parser, 0x1000).unwrap();

        assert_eq!(result.mnemonic, "br.s");
        assert_eq!(result.flow_type, FlowType::UnconditionalBranch);
        assert_eq!(result.branch_targets, vec![0x100C]);

        // br.s -2 loops onto itself
        let mut parser = Parser::new(&[0x2B, 0xFE]);
        let result = decode_instruction(&mut parser, 0x1000).unwrap();
        assert_eq!(result.branch_targets, vec![0x1000]);
    }

    #[test]
    fn decode_instruction_switch() {
        // switch (2 cases: +0, -7)
        let mut parser = Parser::new(&[
            0x45, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF9, 0xFF, 0xFF, 0xFF,
        ]);
        let result = decode_instruction(&mut parser, 0x2000).unwrap();

        assert_eq!(result.size, 13);
        assert_eq!(result.flow_type, FlowType::Switch);
        assert_eq!(result.branch_targets, vec![0x200D, 0x2006]);
    }

    #[test]
    fn decode_instruction_errors() {
        // reserved opcode
        let mut parser = Parser::new(&[0x24]);
        assert!(matches!(
            decode_instruction(&mut parser, 0),
            Err(Error::Malformed { .. })
        ));

        // unassigned FE opcode
        let mut parser = Parser::new(&[0xFE, 0x40]);
        assert!(matches!(
            decode_instruction(&mut parser, 0),
            Err(Error::Malformed { .. })
        ));

        // truncated ldc.i4
        let mut parser = Parser::new(&[0x20, 0x01, 0x02]);
        assert!(matches!(
            decode_instruction(&mut parser, 0),
            Err(Error::OutOfBounds)
        ));

        // switch with an impossible case count
        let mut parser = Parser::new(&[0x45, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            decode_instruction(&mut parser, 0),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn decode_stream_rvas() {
        // ldarg.0; ldc.i4.s 5; add; ret
        let mut parser = Parser::new(&[0x02, 0x1F, 0x05, 0x58, 0x2A]);
        let result = decode_stream(&mut parser, 0x3000).unwrap();

        let rvas: Vec<u64> = result.iter().map(|i| i.rva).collect();
        assert_eq!(rvas, vec![0x3000, 0x3001, 0x3003, 0x3004]);
        assert_eq!(result[1].ldc_i4_value(), Some(5));
        assert_eq!(result[3].flow_type, FlowType::Return);
    }
}
