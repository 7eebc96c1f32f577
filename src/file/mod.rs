//! Low-level binary input handling.
//!
//! The decrypter never touches PE files directly; method bodies and encrypted
//! resources arrive as byte slices from the surrounding pipeline. This module
//! holds the primitives used to read those slices safely:
//!
//! - [`crate::file::parser::Parser`] - Cursor-based reader used by the CIL decoder
//! - [`crate::file::io`] - Bounds-checked little-endian helpers built on [`crate::file::io::CilIO`]

pub mod io;
pub mod parser;
