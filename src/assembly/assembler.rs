//! Fluent construction of CIL bytecode.
//!
//! [`InstructionAssembler`] chains one method per opcode on top of
//! [`crate::assembly::InstructionEncoder`]; every call returns `Result<&mut Self>` so sequences
//! read like a listing:
//!
//! ```rust
//! use keyscope::assembly::InstructionAssembler;
//!
//! let mut asm = InstructionAssembler::new();
//! asm.br("start")?
//!     .nop()?
//!     .label("start")?
//!     .ldloc(0)?
//!     .ldc_i4(1)?
//!     .add()?
//!     .stloc(0)?;
//! let (bytecode, max_stack, _labels) = asm.finish()?;
//!
//! assert_eq!(bytecode, vec![0x38, 0x01, 0x00, 0x00, 0x00, 0x00, 0x06, 0x17, 0x58, 0x0A]);
//! assert_eq!(max_stack, 2);
//! # Ok::<(), keyscope::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    assembly::{Immediate, InstructionEncoder, Operand},
    metadata::token::Token,
    Result,
};

macro_rules! simple_ops {
    ($($name:ident => $mnemonic:literal),* $(,)?) => {
        $(
            #[doc = concat!("Emit `", $mnemonic, "`.")]
            ///
            /// # Errors
            /// Propagates encoder failures.
            pub fn $name(&mut self) -> Result<&mut Self> {
                self.encoder.emit_instruction($mnemonic, None)?;
                Ok(self)
            }
        )*
    };
}

macro_rules! branch_ops {
    ($($name:ident => $mnemonic:literal),* $(,)?) => {
        $(
            #[doc = concat!("Emit `", $mnemonic, "` to `label`.")]
            ///
            /// # Errors
            /// Propagates encoder failures.
            pub fn $name(&mut self, label: &str) -> Result<&mut Self> {
                self.encoder.emit_branch($mnemonic, label)?;
                Ok(self)
            }
        )*
    };
}

macro_rules! token_ops {
    ($($name:ident => $mnemonic:literal),* $(,)?) => {
        $(
            #[doc = concat!("Emit `", $mnemonic, "` with a metadata token.")]
            ///
            /// # Errors
            /// Propagates encoder failures.
            pub fn $name(&mut self, token: Token) -> Result<&mut Self> {
                self.encoder
                    .emit_instruction($mnemonic, Some(Operand::Token(token)))?;
                Ok(self)
            }
        )*
    };
}

/// Fluent CIL assembler.
#[derive(Debug, Default)]
pub struct InstructionAssembler {
    encoder: InstructionEncoder,
}

impl InstructionAssembler {
    /// Create an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to the current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateLabel`] if the label already exists.
    pub fn label(&mut self, name: &str) -> Result<&mut Self> {
        self.encoder.define_label(name)?;
        Ok(self)
    }

    /// Emit the shortest `ldloc` form for `index`.
    ///
    /// # Errors
    /// Propagates encoder failures.
    pub fn ldloc(&mut self, index: u16) -> Result<&mut Self> {
        self.encoder.emit_ldloc(index)?;
        Ok(self)
    }

    /// Emit the shortest `stloc` form for `index`.
    ///
    /// # Errors
    /// Propagates encoder failures.
    pub fn stloc(&mut self, index: u16) -> Result<&mut Self> {
        self.encoder.emit_stloc(index)?;
        Ok(self)
    }

    /// Emit the shortest `ldarg` form for `index`.
    ///
    /// # Errors
    /// Propagates encoder failures.
    pub fn ldarg(&mut self, index: u16) -> Result<&mut Self> {
        self.encoder.emit_ldarg(index)?;
        Ok(self)
    }

    /// Emit `ldloca.s` (or `ldloca` for indices above 255).
    ///
    /// # Errors
    /// Propagates encoder failures.
    pub fn ldloca(&mut self, index: u16) -> Result<&mut Self> {
        match u8::try_from(index) {
            Ok(short) => self
                .encoder
                .emit_instruction("ldloca.s", Some(Operand::Immediate(Immediate::UInt8(short))))?,
            Err(_) => self
                .encoder
                .emit_instruction("ldloca", Some(Operand::Immediate(Immediate::UInt16(index))))?,
        }
        Ok(self)
    }

    /// Emit the shortest `ldc.i4` form for `value`.
    ///
    /// # Errors
    /// Propagates encoder failures.
    pub fn ldc_i4(&mut self, value: i32) -> Result<&mut Self> {
        self.encoder.emit_ldc_i4(value)?;
        Ok(self)
    }

    /// Emit `ldc.i8`.
    ///
    /// # Errors
    /// Propagates encoder failures.
    pub fn ldc_i8(&mut self, value: i64) -> Result<&mut Self> {
        self.encoder
            .emit_instruction("ldc.i8", Some(Operand::Immediate(Immediate::Int64(value))))?;
        Ok(self)
    }

    /// Emit `ldc.r4`.
    ///
    /// # Errors
    /// Propagates encoder failures.
    pub fn ldc_r4(&mut self, value: f32) -> Result<&mut Self> {
        self.encoder
            .emit_instruction("ldc.r4", Some(Operand::Immediate(Immediate::Float32(value))))?;
        Ok(self)
    }

    /// Emit `ldc.r8`.
    ///
    /// # Errors
    /// Propagates encoder failures.
    pub fn ldc_r8(&mut self, value: f64) -> Result<&mut Self> {
        self.encoder
            .emit_instruction("ldc.r8", Some(Operand::Immediate(Immediate::Float64(value))))?;
        Ok(self)
    }

    simple_ops! {
        nop => "nop",
        dup => "dup",
        pop => "pop",
        ret => "ret",
        throw => "throw",
        ldnull => "ldnull",
        ldloc_0 => "ldloc.0",
        ldloc_1 => "ldloc.1",
        ldloc_2 => "ldloc.2",
        ldloc_3 => "ldloc.3",
        stloc_0 => "stloc.0",
        stloc_1 => "stloc.1",
        stloc_2 => "stloc.2",
        stloc_3 => "stloc.3",
        ldarg_0 => "ldarg.0",
        ldarg_1 => "ldarg.1",
        ldc_i4_m1 => "ldc.i4.m1",
        ldc_i4_0 => "ldc.i4.0",
        ldc_i4_1 => "ldc.i4.1",
        add => "add",
        sub => "sub",
        mul => "mul",
        div => "div",
        div_un => "div.un",
        rem => "rem",
        rem_un => "rem.un",
        neg => "neg",
        and => "and",
        or => "or",
        xor => "xor",
        not => "not",
        shl => "shl",
        shr => "shr",
        shr_un => "shr.un",
        add_ovf => "add.ovf",
        add_ovf_un => "add.ovf.un",
        mul_ovf_un => "mul.ovf.un",
        ceq => "ceq",
        cgt => "cgt",
        cgt_un => "cgt.un",
        clt => "clt",
        clt_un => "clt.un",
        conv_i1 => "conv.i1",
        conv_i2 => "conv.i2",
        conv_i4 => "conv.i4",
        conv_i8 => "conv.i8",
        conv_u1 => "conv.u1",
        conv_u2 => "conv.u2",
        conv_u4 => "conv.u4",
        conv_u8 => "conv.u8",
        conv_i => "conv.i",
        conv_u => "conv.u",
        conv_r4 => "conv.r4",
        conv_r8 => "conv.r8",
        conv_r_un => "conv.r.un",
        conv_ovf_u1 => "conv.ovf.u1",
        conv_ovf_i4_un => "conv.ovf.i4.un",
        ldlen => "ldlen",
        ldelem_u1 => "ldelem.u1",
        ldelem_i4 => "ldelem.i4",
        ldelem_u4 => "ldelem.u4",
        stelem_i1 => "stelem.i1",
        ldind_u1 => "ldind.u1",
    }

    branch_ops! {
        br => "br",
        br_s => "br.s",
        brtrue => "brtrue",
        brtrue_s => "brtrue.s",
        brfalse => "brfalse",
        brfalse_s => "brfalse.s",
        beq => "beq",
        beq_s => "beq.s",
        bne_un => "bne.un",
        bne_un_s => "bne.un.s",
        blt => "blt",
        blt_un => "blt.un",
        bge_un => "bge.un",
    }

    token_ops! {
        call => "call",
        callvirt => "callvirt",
        newobj => "newobj",
        ldsfld => "ldsfld",
        stsfld => "stsfld",
        ldstr => "ldstr",
        newarr => "newarr",
    }

    /// Resolve labels and return `(bytecode, max_stack, labels)`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UndefinedLabel`] or [`crate::Error::InvalidBranch`] when a
    /// branch cannot be resolved.
    pub fn finish(self) -> Result<(Vec<u8>, u16, HashMap<String, u32>)> {
        self.encoder.finalize()
    }
}
