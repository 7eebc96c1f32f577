//! Methods as the decrypter sees them: a flat instruction list plus declared storage.
//!
//! A [`Method`] is either decoded from a raw method body with [`Method::from_il`] or assembled
//! from already decoded instructions with [`Method::new`]. Locals are kept unique by index and
//! in declaration order; branch targets are resolved back to instruction indices with
//! [`Method::index_of_rva`].

mod body;
mod types;

pub use body::MethodBody;
pub use types::{Local, MethodBodyFlags};

use crate::{
    assembly::{decode_stream, Instruction},
    file::parser::Parser,
    metadata::token::Token,
    Result,
};

/// A decoded method body and its declared locals and parameters.
///
/// # Examples
///
/// ```rust
/// use keyscope::metadata::{method::{Local, Method}, token::Token, typesystem::CilFlavor};
///
/// // tiny header, 4 bytes of code: ldloc.0; ldc.i4.1; add; stloc.0
/// let il = [0x12, 0x06, 0x17, 0x58, 0x0A];
/// let method = Method::from_il(
///     Token::new(0x0600_0001),
///     "Next",
///     &il,
///     vec![],
///     vec![Local::new(0, CilFlavor::U4)],
/// )?;
///
/// assert_eq!(method.instructions.len(), 4);
/// assert_eq!(method.index_of_rva(3), Some(3));
/// # Ok::<(), keyscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Method {
    /// Metadata token of the method
    pub token: Token,
    /// Name, used for diagnostics only
    pub name: String,
    /// Declared parameters, `this` included for instance methods
    pub params: Vec<Local>,
    /// Declared locals, unique by index, in declaration order
    pub locals: Vec<Local>,
    /// Whether locals are zero-initialised on entry
    pub init_locals: bool,
    /// Decoded instructions in code order; RVAs are relative to the start of the code
    pub instructions: Vec<Instruction>,
}

impl Method {
    /// Build a method from already decoded instructions.
    ///
    /// Locals and parameters are sorted by index; duplicates keep their first declaration.
    #[must_use]
    pub fn new(
        token: Token,
        name: &str,
        instructions: Vec<Instruction>,
        locals: Vec<Local>,
        params: Vec<Local>,
        init_locals: bool,
    ) -> Self {
        Method {
            token,
            name: name.to_string(),
            params: Self::normalize_slots(params),
            locals: Self::normalize_slots(locals),
            init_locals,
            instructions,
        }
    }

    /// Parse a method body (header and code) and decode its instructions at RVA 0.
    ///
    /// The init-locals flag is taken from the header; tiny headers never initialise locals.
    ///
    /// # Errors
    ///
    /// Returns the header parsing errors of [`MethodBody::from`] and the decoding errors of
    /// [`crate::assembly::decode_stream`].
    pub fn from_il(
        token: Token,
        name: &str,
        il: &[u8],
        params: Vec<Local>,
        locals: Vec<Local>,
    ) -> Result<Self> {
        let body = MethodBody::from(il)?;
        let code = body.code(il)?;

        let mut parser = Parser::new(code);
        let instructions = decode_stream(&mut parser, 0)?;

        Ok(Self::new(
            token,
            name,
            instructions,
            locals,
            params,
            body.is_init_local,
        ))
    }

    /// Index of the instruction starting at `rva`, if there is one.
    #[must_use]
    pub fn index_of_rva(&self, rva: u64) -> Option<usize> {
        self.instructions
            .binary_search_by_key(&rva, |instruction| instruction.rva)
            .ok()
    }

    /// Index of the instruction a branch at `index` transfers control to.
    #[must_use]
    pub fn branch_target_index(&self, index: usize) -> Option<usize> {
        let target = self.instructions.get(index)?.branch_target()?;
        self.index_of_rva(target)
    }

    /// Declared local with slot `index`.
    #[must_use]
    pub fn local(&self, index: u16) -> Option<&Local> {
        self.locals.iter().find(|local| local.index == index)
    }

    fn normalize_slots(mut slots: Vec<Local>) -> Vec<Local> {
        // stable sort keeps the first declaration of a duplicated index in front
        slots.sort_by_key(|slot| slot.index);
        slots.dedup_by_key(|slot| slot.index);
        slots
    }
}
