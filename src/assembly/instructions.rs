//! Static opcode tables for the ECMA-335 instruction set.
//!
//! [`INSTRUCTIONS`] is indexed by the single-byte opcode (`0x00`-`0xE0`) and [`INSTRUCTIONS_FE`]
//! by the second byte of `0xFE`-prefixed opcodes (`0x00`-`0x1E`). Reserved slots have an empty
//! mnemonic; the decoder rejects them.

use crate::assembly::instruction::{
    FlowType as Flow, InstructionCategory as Cat, OperandType as Op,
};

/// Static description of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CilInstruction<'a> {
    /// The encoded operand kind
    pub op_type: Op,
    /// The mnemonic, empty for reserved opcodes
    pub instr: &'a str,
    /// Functional category
    pub category: Cat,
    /// Items popped from the evaluation stack (0 for signature-dependent opcodes)
    pub stack_pops: u8,
    /// Items pushed onto the evaluation stack (0 for signature-dependent opcodes)
    pub stack_pushes: u8,
    /// Control flow behavior
    pub flow: Flow,
}

impl CilInstruction<'_> {
    /// Check if this table slot is unassigned.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.instr.is_empty()
    }
}

const fn op(
    instr: &'static str,
    op_type: Op,
    category: Cat,
    stack_pops: u8,
    stack_pushes: u8,
    flow: Flow,
) -> CilInstruction<'static> {
    CilInstruction {
        op_type,
        instr,
        category,
        stack_pops,
        stack_pushes,
        flow,
    }
}

const RESERVED: CilInstruction<'static> = op("", Op::None, Cat::Misc, 0, 0, Flow::Sequential);

/// Single-byte opcodes, indexed by opcode.
pub static INSTRUCTIONS: [CilInstruction<'static>; 0xE1] = [
    op("nop", Op::None, Cat::Misc, 0, 0, Flow::Sequential), // 0x00
    op("break", Op::None, Cat::Misc, 0, 0, Flow::Sequential),
    op("ldarg.0", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldarg.1", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldarg.2", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldarg.3", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldloc.0", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldloc.1", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldloc.2", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldloc.3", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("stloc.0", Op::None, Cat::LoadStore, 1, 0, Flow::Sequential),
    op("stloc.1", Op::None, Cat::LoadStore, 1, 0, Flow::Sequential),
    op("stloc.2", Op::None, Cat::LoadStore, 1, 0, Flow::Sequential),
    op("stloc.3", Op::None, Cat::LoadStore, 1, 0, Flow::Sequential),
    op("ldarg.s", Op::UInt8, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldarga.s", Op::UInt8, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("starg.s", Op::UInt8, Cat::LoadStore, 1, 0, Flow::Sequential), // 0x10
    op("ldloc.s", Op::UInt8, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldloca.s", Op::UInt8, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("stloc.s", Op::UInt8, Cat::LoadStore, 1, 0, Flow::Sequential),
    op("ldnull", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.m1", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.0", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.1", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.2", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.3", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.4", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.5", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.6", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.7", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.8", Op::None, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4.s", Op::Int8, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.i4", Op::Int32, Cat::LoadStore, 0, 1, Flow::Sequential), // 0x20
    op("ldc.i8", Op::Int64, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.r4", Op::Float32, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldc.r8", Op::Float64, Cat::LoadStore, 0, 1, Flow::Sequential),
    RESERVED,
    op("dup", Op::None, Cat::Misc, 1, 2, Flow::Sequential),
    op("pop", Op::None, Cat::Misc, 1, 0, Flow::Sequential),
    op("jmp", Op::Token, Cat::ControlFlow, 0, 0, Flow::Call),
    op("call", Op::Token, Cat::ControlFlow, 0, 0, Flow::Call),
    op("calli", Op::Token, Cat::ControlFlow, 0, 0, Flow::Call),
    op("ret", Op::None, Cat::ControlFlow, 0, 0, Flow::Return),
    op("br.s", Op::Int8, Cat::ControlFlow, 0, 0, Flow::UnconditionalBranch),
    op("brfalse.s", Op::Int8, Cat::ControlFlow, 1, 0, Flow::ConditionalBranch),
    op("brtrue.s", Op::Int8, Cat::ControlFlow, 1, 0, Flow::ConditionalBranch),
    op("beq.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bge.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bgt.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch), // 0x30
    op("ble.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("blt.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bne.un.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bge.un.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bgt.un.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("ble.un.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("blt.un.s", Op::Int8, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("br", Op::Int32, Cat::ControlFlow, 0, 0, Flow::UnconditionalBranch),
    op("brfalse", Op::Int32, Cat::ControlFlow, 1, 0, Flow::ConditionalBranch),
    op("brtrue", Op::Int32, Cat::ControlFlow, 1, 0, Flow::ConditionalBranch),
    op("beq", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bge", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bgt", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("ble", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("blt", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bne.un", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch), // 0x40
    op("bge.un", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("bgt.un", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("ble.un", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("blt.un", Op::Int32, Cat::ControlFlow, 2, 0, Flow::ConditionalBranch),
    op("switch", Op::Switch, Cat::ControlFlow, 1, 0, Flow::Switch),
    op("ldind.i1", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.u1", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.i2", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.u2", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.i4", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.u4", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.i8", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.i", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.r4", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.r8", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential),
    op("ldind.ref", Op::None, Cat::LoadStore, 1, 1, Flow::Sequential), // 0x50
    op("stind.ref", Op::None, Cat::LoadStore, 2, 0, Flow::Sequential),
    op("stind.i1", Op::None, Cat::LoadStore, 2, 0, Flow::Sequential),
    op("stind.i2", Op::None, Cat::LoadStore, 2, 0, Flow::Sequential),
    op("stind.i4", Op::None, Cat::LoadStore, 2, 0, Flow::Sequential),
    op("stind.i8", Op::None, Cat::LoadStore, 2, 0, Flow::Sequential),
    op("stind.r4", Op::None, Cat::LoadStore, 2, 0, Flow::Sequential),
    op("stind.r8", Op::None, Cat::LoadStore, 2, 0, Flow::Sequential),
    op("add", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("sub", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("mul", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("div", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("div.un", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("rem", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("rem.un", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("and", Op::None, Cat::BitwiseLogical, 2, 1, Flow::Sequential),
    op("or", Op::None, Cat::BitwiseLogical, 2, 1, Flow::Sequential), // 0x60
    op("xor", Op::None, Cat::BitwiseLogical, 2, 1, Flow::Sequential),
    op("shl", Op::None, Cat::BitwiseLogical, 2, 1, Flow::Sequential),
    op("shr", Op::None, Cat::BitwiseLogical, 2, 1, Flow::Sequential),
    op("shr.un", Op::None, Cat::BitwiseLogical, 2, 1, Flow::Sequential),
    op("neg", Op::None, Cat::Arithmetic, 1, 1, Flow::Sequential),
    op("not", Op::None, Cat::BitwiseLogical, 1, 1, Flow::Sequential),
    op("conv.i1", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.i2", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.i4", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.i8", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.r4", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.r8", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.u4", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.u8", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("callvirt", Op::Token, Cat::ControlFlow, 0, 0, Flow::Call),
    op("cpobj", Op::Token, Cat::ObjectModel, 2, 0, Flow::Sequential), // 0x70
    op("ldobj", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("ldstr", Op::Token, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("newobj", Op::Token, Cat::ObjectModel, 0, 0, Flow::Call),
    op("castclass", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("isinst", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("conv.r.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    RESERVED,
    RESERVED,
    op("unbox", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("throw", Op::None, Cat::ControlFlow, 1, 0, Flow::Throw),
    op("ldfld", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("ldflda", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("stfld", Op::Token, Cat::ObjectModel, 2, 0, Flow::Sequential),
    op("ldsfld", Op::Token, Cat::ObjectModel, 0, 1, Flow::Sequential),
    op("ldsflda", Op::Token, Cat::ObjectModel, 0, 1, Flow::Sequential),
    op("stsfld", Op::Token, Cat::ObjectModel, 1, 0, Flow::Sequential), // 0x80
    op("stobj", Op::Token, Cat::ObjectModel, 2, 0, Flow::Sequential),
    op("conv.ovf.i1.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.i2.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.i4.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.i8.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u1.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u2.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u4.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u8.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.i.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u.un", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("box", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("newarr", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("ldlen", Op::None, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("ldelema", Op::Token, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.i1", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential), // 0x90
    op("ldelem.u1", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.i2", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.u2", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.i4", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.u4", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.i8", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.i", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.r4", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.r8", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("ldelem.ref", Op::None, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("stelem.i", Op::None, Cat::ObjectModel, 3, 0, Flow::Sequential),
    op("stelem.i1", Op::None, Cat::ObjectModel, 3, 0, Flow::Sequential),
    op("stelem.i2", Op::None, Cat::ObjectModel, 3, 0, Flow::Sequential),
    op("stelem.i4", Op::None, Cat::ObjectModel, 3, 0, Flow::Sequential),
    op("stelem.i8", Op::None, Cat::ObjectModel, 3, 0, Flow::Sequential),
    op("stelem.r4", Op::None, Cat::ObjectModel, 3, 0, Flow::Sequential), // 0xA0
    op("stelem.r8", Op::None, Cat::ObjectModel, 3, 0, Flow::Sequential),
    op("stelem.ref", Op::None, Cat::ObjectModel, 3, 0, Flow::Sequential),
    op("ldelem", Op::Token, Cat::ObjectModel, 2, 1, Flow::Sequential),
    op("stelem", Op::Token, Cat::ObjectModel, 3, 0, Flow::Sequential),
    op("unbox.any", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED, // 0xB0
    RESERVED,
    RESERVED,
    op("conv.ovf.i1", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u1", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.i2", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u2", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.i4", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u4", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.i8", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u8", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED, // 0xC0
    RESERVED,
    op("refanyval", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("ckfinite", Op::None, Cat::Arithmetic, 1, 1, Flow::Sequential),
    RESERVED,
    RESERVED,
    op("mkrefany", Op::Token, Cat::ObjectModel, 1, 1, Flow::Sequential),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    op("ldtoken", Op::Token, Cat::LoadStore, 0, 1, Flow::Sequential), // 0xD0
    op("conv.u2", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.u1", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.i", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.i", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("conv.ovf.u", Op::None, Cat::Conversion, 1, 1, Flow::Sequential),
    op("add.ovf", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("add.ovf.un", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("mul.ovf", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("mul.ovf.un", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("sub.ovf", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("sub.ovf.un", Op::None, Cat::Arithmetic, 2, 1, Flow::Sequential),
    op("endfinally", Op::None, Cat::ControlFlow, 0, 0, Flow::EndFinally),
    op("leave", Op::Int32, Cat::ControlFlow, 0, 0, Flow::Leave),
    op("leave.s", Op::Int8, Cat::ControlFlow, 0, 0, Flow::Leave),
    op("stind.i", Op::None, Cat::LoadStore, 2, 0, Flow::Sequential),
    op("conv.u", Op::None, Cat::Conversion, 1, 1, Flow::Sequential), // 0xE0
];

/// Two-byte opcodes, indexed by the byte following the `0xFE` prefix.
pub static INSTRUCTIONS_FE: [CilInstruction<'static>; 0x1F] = [
    op("arglist", Op::None, Cat::Misc, 0, 1, Flow::Sequential),
    op("ceq", Op::None, Cat::Comparison, 2, 1, Flow::Sequential),
    op("cgt", Op::None, Cat::Comparison, 2, 1, Flow::Sequential),
    op("cgt.un", Op::None, Cat::Comparison, 2, 1, Flow::Sequential),
    op("clt", Op::None, Cat::Comparison, 2, 1, Flow::Sequential),
    op("clt.un", Op::None, Cat::Comparison, 2, 1, Flow::Sequential),
    op("ldftn", Op::Token, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldvirtftn", Op::Token, Cat::LoadStore, 1, 1, Flow::Sequential),
    RESERVED,
    op("ldarg", Op::UInt16, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldarga", Op::UInt16, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("starg", Op::UInt16, Cat::LoadStore, 1, 0, Flow::Sequential),
    op("ldloc", Op::UInt16, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("ldloca", Op::UInt16, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("stloc", Op::UInt16, Cat::LoadStore, 1, 0, Flow::Sequential),
    op("localloc", Op::None, Cat::Misc, 1, 1, Flow::Sequential),
    RESERVED,
    op("endfilter", Op::None, Cat::ControlFlow, 1, 0, Flow::EndFinally),
    op("unaligned.", Op::UInt8, Cat::Prefix, 0, 0, Flow::Sequential),
    op("volatile.", Op::None, Cat::Prefix, 0, 0, Flow::Sequential),
    op("tail.", Op::None, Cat::Prefix, 0, 0, Flow::Sequential),
    op("initobj", Op::Token, Cat::ObjectModel, 1, 0, Flow::Sequential),
    op("constrained.", Op::Token, Cat::Prefix, 0, 0, Flow::Sequential),
    op("cpblk", Op::None, Cat::Misc, 3, 0, Flow::Sequential),
    op("initblk", Op::None, Cat::Misc, 3, 0, Flow::Sequential),
    op("no.", Op::UInt8, Cat::Prefix, 0, 0, Flow::Sequential),
    op("rethrow", Op::None, Cat::ControlFlow, 0, 0, Flow::Throw),
    RESERVED,
    op("sizeof", Op::Token, Cat::LoadStore, 0, 1, Flow::Sequential),
    op("refanytype", Op::None, Cat::ObjectModel, 1, 1, Flow::Sequential),
    op("readonly.", Op::None, Cat::Prefix, 0, 0, Flow::Sequential),
];
