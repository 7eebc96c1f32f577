//! Unit tests for the CIL interpreter.
//!
//! Instructions are decoded from raw bytecode so operands and stack effects come from the
//! same tables the decrypter sees. Covered:
//! - Constants, arithmetic and conversions
//! - Local and argument access, with flavor coercion
//! - Branches consuming operands without transferring control
//! - Unmodelled and unsupported opcodes
//! - Execution limits and re-initialisation

use crate::{
    assembly::{decode_stream, Instruction, InstructionAssembler},
    emulation::{EmulationLimits, Int32Value},
    metadata::typesystem::CilFlavor,
    Error, Parser,
};

use super::*;

fn decode(code: &[u8]) -> Vec<Instruction> {
    decode_stream(&mut Parser::new(code), 0).unwrap()
}

fn run(interpreter: &mut Interpreter, code: &[u8]) -> Result<()> {
    for instruction in decode(code) {
        interpreter.step(&instruction)?;
    }
    Ok(())
}

fn create_test_interpreter(local_types: &[CilFlavor], init_locals: bool) -> Interpreter {
    let locals: Vec<Local> = local_types
        .iter()
        .zip(0u16..)
        .map(|(flavor, index)| Local::new(index, *flavor))
        .collect();

    let mut interpreter = Interpreter::default();
    interpreter.initialize(&[Local::new(0, CilFlavor::Object)], &locals, init_locals);
    interpreter
}

#[test]
fn test_constants_and_arithmetic() {
    let mut interpreter = create_test_interpreter(&[], true);

    // ldc.i4.s 10; ldc.i4.3; sub
    run(&mut interpreter, &[0x1F, 0x0A, 0x19, 0x59]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::i32(7));

    // ldc.i8 -1; ldc.i4.1; add
    run(
        &mut interpreter,
        &[0x21, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x17, 0x58],
    )
    .unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::I64(0));

    // ldc.r4 1.5; ldc.r8 2.0; mul
    let mut code = vec![0x22];
    code.extend_from_slice(&1.5f32.to_le_bytes());
    code.push(0x23);
    code.extend_from_slice(&2.0f64.to_le_bytes());
    code.push(0x5A);
    run(&mut interpreter, &code).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::F64(3.0));
}

#[test]
fn test_float_round_trip_conversions() {
    let mut interpreter = create_test_interpreter(&[], true);

    // ldc.i4.m1; conv.r.un; conv.r8; conv.u4
    run(&mut interpreter, &[0x15, 0x76, 0x6C, 0x6D]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::u32(0xFFFF_FFFF));

    // ldc.i4.m1; conv.u1
    run(&mut interpreter, &[0x15, 0xD2]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::u32(0xFF));
}

#[test]
fn test_wide_constants_from_assembler() {
    let mut asm = InstructionAssembler::new();
    asm.ldc_r8(3.75)
        .unwrap()
        .conv_u4()
        .unwrap()
        .ldc_i8(0x1_0000_0005)
        .unwrap()
        .conv_u4()
        .unwrap()
        .add()
        .unwrap()
        .ldc_r4(2.5)
        .unwrap()
        .ldc_r8(1.5)
        .unwrap()
        .add()
        .unwrap();
    let (code, _, _) = asm.finish().unwrap();

    let instructions = decode(&code);
    assert_eq!(instructions[0].get_f64_operand(), Some(3.75));
    assert_eq!(instructions[2].get_i64_operand(), Some(0x1_0000_0005));
    assert_eq!(instructions[5].get_f64_operand(), Some(2.5));

    let mut interpreter = create_test_interpreter(&[], true);
    for instruction in &instructions {
        interpreter.step(instruction).unwrap();
    }
    assert_eq!(interpreter.pop().unwrap(), EmValue::F64(4.0));
    assert_eq!(interpreter.pop().unwrap(), EmValue::u32(8));
}

#[test]
fn test_local_store_is_coerced() {
    let mut interpreter = create_test_interpreter(&[CilFlavor::U1, CilFlavor::U4], true);

    // ldc.i4 0x1FF; stloc.0; ldloc.0
    run(&mut interpreter, &[0x20, 0xFF, 0x01, 0x00, 0x00, 0x0A, 0x06]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::u32(0xFF));

    // ldc.i4.5; stloc.s 1; ldloc (FE 0C) 1
    run(&mut interpreter, &[0x1B, 0x13, 0x01, 0xFE, 0x0C, 0x01, 0x00]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::i32(5));
    assert_eq!(interpreter.get_local(1).unwrap(), &EmValue::i32(5));
}

#[test]
fn test_uninitialised_locals_are_unknown() {
    let mut interpreter = create_test_interpreter(&[CilFlavor::I4], false);

    // ldloc.0; ldc.i4.0; and
    run(&mut interpreter, &[0x06, 0x16, 0x5F]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::i32(0));

    // ldloc.0; ldc.i4.1; add
    run(&mut interpreter, &[0x06, 0x17, 0x58]).unwrap();
    let sum = interpreter.pop().unwrap();
    assert!(!sum.is_concrete());
}

#[test]
fn test_undeclared_local() {
    let mut interpreter = create_test_interpreter(&[CilFlavor::I4], true);

    // ldloc.2
    let result = run(&mut interpreter, &[0x08]);
    assert!(matches!(
        result,
        Err(Error::Emulation(EmulationError::LocalIndexOutOfBounds {
            index: 2,
            count: 1
        }))
    ));
}

#[test]
fn test_arguments() {
    let mut interpreter = create_test_interpreter(&[], true);

    // ldarg.0
    run(&mut interpreter, &[0x02]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::Unknown);
    assert_eq!(interpreter.get_argument(0).unwrap(), &EmValue::Unknown);

    // ldarg.1
    assert!(matches!(
        run(&mut interpreter, &[0x03]),
        Err(Error::Emulation(EmulationError::ArgumentIndexOutOfBounds {
            index: 1,
            ..
        }))
    ));
}

#[test]
fn test_branches_only_pop() {
    let mut interpreter = create_test_interpreter(&[], true);

    // ldc.i4.1; ldc.i4.2; bne.un.s +0; br.s +0
    run(&mut interpreter, &[0x17, 0x18, 0x33, 0x00, 0x2B, 0x00]).unwrap();
    assert!(interpreter.stack().is_empty());

    // brtrue.s +0 on an empty stack
    assert!(matches!(
        run(&mut interpreter, &[0x2D, 0x00]),
        Err(Error::Emulation(EmulationError::StackUnderflow))
    ));
}

#[test]
fn test_comparisons() {
    let mut interpreter = create_test_interpreter(&[], true);

    // ldc.i4.1; ldc.i4.1; ceq
    run(&mut interpreter, &[0x17, 0x17, 0xFE, 0x01]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::i32(1));

    // ldc.i4.m1; ldc.i4.1; cgt.un
    run(&mut interpreter, &[0x15, 0x17, 0xFE, 0x03]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::i32(1));

    // ldnull; ldc.i4.0; clt
    run(&mut interpreter, &[0x14, 0x16, 0xFE, 0x04]).unwrap();
    assert_eq!(
        interpreter.pop().unwrap(),
        EmValue::I32(Int32Value::new(0, 0xFFFF_FFFE))
    );
}

#[test]
fn test_opaque_opcodes_push_unknown() {
    let mut interpreter = create_test_interpreter(&[], true);

    // ldsfld 0x04000001
    run(&mut interpreter, &[0x7E, 0x01, 0x00, 0x00, 0x04]).unwrap();
    assert_eq!(interpreter.pop().unwrap(), EmValue::Unknown);

    // ldnull; ldc.i4.0; ldelem.u1
    run(&mut interpreter, &[0x14, 0x16, 0x91]).unwrap();
    let byte = interpreter.pop().unwrap();
    assert!(matches!(byte, EmValue::I32(v) if v.valid_mask() == 0xFFFF_FF00));
    assert!(interpreter.stack().is_empty());

    // ldloca.s 0; dup
    run(&mut interpreter, &[0x12, 0x00, 0x25]).unwrap();
    assert_eq!(interpreter.stack().depth(), 2);
}

#[test]
fn test_unsupported_opcodes() {
    let mut interpreter = create_test_interpreter(&[], true);

    // call 0x0A000001
    let result = run(&mut interpreter, &[0x28, 0x01, 0x00, 0x00, 0x0A]);
    assert!(matches!(
        result,
        Err(Error::Emulation(EmulationError::UnsupportedOpcode {
            opcode: 0x28,
            prefix: None,
            mnemonic: Some("call"),
        }))
    ));

    // ret
    assert!(run(&mut interpreter, &[0x2A]).is_err());

    // rethrow
    let result = run(&mut interpreter, &[0xFE, 0x1A]);
    assert!(matches!(
        result,
        Err(Error::Emulation(EmulationError::UnsupportedOpcode {
            prefix: Some(0xFE),
            ..
        }))
    ));
}

#[test]
fn test_instruction_limit() {
    let mut interpreter = Interpreter::new(EmulationLimits::new().with_max_instructions(2));
    interpreter.initialize(&[], &[], true);

    // nop; nop; nop
    let result = run(&mut interpreter, &[0x00, 0x00, 0x00]);
    assert!(matches!(
        result,
        Err(Error::Emulation(EmulationError::InstructionLimitExceeded {
            executed: 2,
            limit: 2
        }))
    ));

    interpreter.initialize(&[], &[], true);
    assert_eq!(interpreter.executed(), 0);
    run(&mut interpreter, &[0x00, 0x00]).unwrap();
}

#[test]
fn test_stack_limit() {
    let mut interpreter = Interpreter::new(EmulationLimits::new().with_max_stack_depth(1));
    interpreter.initialize(&[], &[], true);

    // ldc.i4.0; ldc.i4.1
    let result = run(&mut interpreter, &[0x16, 0x17]);
    assert!(matches!(
        result,
        Err(Error::Emulation(EmulationError::StackOverflow { limit: 1 }))
    ));
}

#[test]
fn test_initialize_clears_state() {
    let mut interpreter = create_test_interpreter(&[CilFlavor::U4], true);

    // ldc.i4.7; stloc.0; ldc.i4.1
    run(&mut interpreter, &[0x1D, 0x0A, 0x17]).unwrap();
    assert_eq!(interpreter.stack().depth(), 1);

    interpreter.initialize(&[], &[Local::new(0, CilFlavor::U4)], true);
    assert!(interpreter.stack().is_empty());
    assert_eq!(interpreter.get_local(0).unwrap(), &EmValue::u32(0));
    assert!(interpreter.get_argument(0).is_err());
}
