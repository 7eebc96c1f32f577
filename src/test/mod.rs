//! Synthetic decrypter methods shared by the unit tests.

use crate::{
    assembly::{decode_stream, InstructionAssembler},
    metadata::{
        method::{Local, Method},
        token::Token,
        typesystem::CilFlavor,
    },
    Parser, Result,
};

/// Builds a [`Method`] from an assembler listing.
pub struct MethodBuilder {
    name: String,
    locals: Vec<Local>,
    params: Vec<Local>,
    init_locals: bool,
}

impl MethodBuilder {
    pub fn new(name: &str) -> Self {
        MethodBuilder {
            name: name.to_string(),
            locals: Vec::new(),
            params: Vec::new(),
            init_locals: true,
        }
    }

    /// Declares locals `0..count` as `uint32`.
    pub fn locals(mut self, count: u16) -> Self {
        self.locals = (0..count).map(|i| Local::new(i, CilFlavor::U4)).collect();
        self
    }

    pub fn local(mut self, index: u16, flavor: CilFlavor) -> Self {
        self.locals.push(Local::new(index, flavor));
        self
    }

    /// Declares parameters `0..count` as objects.
    pub fn params(mut self, count: u16) -> Self {
        self.params = (0..count).map(|i| Local::new(i, CilFlavor::Object)).collect();
        self
    }

    pub fn init_locals(mut self, init_locals: bool) -> Self {
        self.init_locals = init_locals;
        self
    }

    pub fn build<F>(self, listing: F) -> Method
    where
        F: FnOnce(&mut InstructionAssembler) -> Result<()>,
    {
        let mut asm = InstructionAssembler::new();
        listing(&mut asm).unwrap();
        let (code, _, _) = asm.finish().unwrap();
        let instructions = decode_stream(&mut Parser::new(&code), 0).unwrap();

        Method::new(
            Token::new(0x0600_0001),
            &self.name,
            instructions,
            self.locals,
            self.params,
            self.init_locals,
        )
    }
}

// Byte fold followed by `sum = sum + 1`; window [8..=10], accumulator V_0
pub fn increment_loop_method() -> Method {
    MethodBuilder::new("Increment").locals(4).build(|asm| {
        asm.conv_u()?
            .ldelem_u1()?
            .or()?
            .stloc(2)?
            .ldloc(0)?
            .ldloc(3)?
            .add()?
            .stloc(0)?
            .ldloc(0)?
            .ldc_i4(1)?
            .add()?
            .stloc(0)?;
        Ok(())
    })
}

// `sum = sum + (uint)(double)sum`; window [2..=7], accumulator V_0
pub fn single_phase_method() -> Method {
    MethodBuilder::new("SinglePhase").locals(1).build(|asm| {
        asm.br("start")?
            .nop()?
            .label("start")?
            .ldloc(0)?
            .ldloc(0)?
            .conv_r_un()?
            .conv_r8()?
            .conv_u4()?
            .add()?
            .stloc(0)?
            .ret()?;
        Ok(())
    })
}

// Single-phase update with a dead `if (V_2 == 0) V_2--;` guard at window offset 3.
// Skipping the guard yields 2 * sum + 5, emulating it 2 * sum + 4.
pub fn guarded_decrement_method() -> Method {
    MethodBuilder::new("Guarded")
        .locals(2)
        .local(2, CilFlavor::I4)
        .build(|asm| {
            asm.br("start")?
                .nop()?
                .label("start")?
                .ldloc(0)?
                .ldc_i4(5)?
                .stloc(2)?
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
        })
}

// Straight-line code without either loop shape
pub fn no_loop_method() -> Method {
    MethodBuilder::new("Plain").locals(2).build(|asm| {
        asm.ldloc(0)?
            .ldloc(1)?
            .add()?
            .conv_u4()?
            .stloc(0)?
            .ldloc(0)?
            .ldc_i4(3)?
            .mul()?
            .stloc(1)?
            .ret()?;
        Ok(())
    })
}
