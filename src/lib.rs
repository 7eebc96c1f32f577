// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(dead_code)]

//! # keyscope
//!
//! Recovers the keystream generator that .NET Reactor hides inside generated CIL and uses it to
//! decrypt the embedded resources it protects. The generator is never reimplemented: its loop
//! body is located in the decrypter method and executed by an abstract CIL interpreter, one
//! 32-bit key word at a time.
//!
//! ## Features
//!
//! - **Loop recovery** - Two locating strategies covering the known generator shapes
//! - **Dialect detection** - Dead guarded decrements are recognised and stepped over
//! - **Abstract interpretation** - Partially known integers, `int64` and `float` values
//! - **Self-contained CIL tooling** - Decoder, encoder and a fluent assembler
//! - **Parallel batches** - Independent resources decrypted with `rayon`
//!
//! ## Quick Start
//!
//! ### Using the Prelude
//!
//! ```rust,no_run
//! use keyscope::prelude::*;
//! # fn candidate() -> Method { unimplemented!() }
//! # let encrypted: Vec<u8> = Vec::new();
//!
//! let mut decrypter = ResourceDecrypter::new(&candidate())?;
//! let plain = decrypter.decrypt(&encrypted)?;
//! # Ok::<(), keyscope::Error>(())
//! ```
//!
//! ### From a Raw Method Body
//!
//! ```rust,no_run
//! use keyscope::{
//!     deobfuscation::{DecrypterConfig, ResourceDecrypter},
//!     metadata::{method::{Local, Method}, token::Token, typesystem::CilFlavor},
//! };
//! # let il: Vec<u8> = Vec::new();
//! # let encrypted: Vec<u8> = Vec::new();
//!
//! let method = Method::from_il(
//!     Token::new(0x0600_0042),
//!     "Decrypt",
//!     &il,
//!     vec![],
//!     vec![Local::new(0, CilFlavor::U4), Local::new(1, CilFlavor::I4)],
//! )?;
//!
//! let mut decrypter = ResourceDecrypter::with_config(&method, DecrypterConfig::default())?;
//! println!(
//!     "{} loop at {:?}, accumulator V_{}",
//!     decrypter.strategy(),
//!     decrypter.window(),
//!     decrypter.accumulator()
//! );
//! let plain = decrypter.decrypt(&encrypted)?;
//! # Ok::<(), keyscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`assembly`] - CIL instruction model, decoder, encoder and assembler
//! - [`metadata`] - Tokens, type flavors and method bodies
//! - [`emulation`] - Abstract values and the instruction interpreter
//! - [`deobfuscation`] - Loop location and resource decryption
//!
//! Reading assemblies, extracting resources and choosing candidate methods are left to the
//! caller; this crate starts from a method body and an encrypted buffer.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with the crate-wide [`Error`]:
//!
//! ```rust
//! use keyscope::{deobfuscation::ResourceDecrypter, metadata::method::Method, Error};
//!
//! let method = Method::new(Default::default(), "Empty", vec![], vec![], vec![], false);
//! assert!(matches!(ResourceDecrypter::new(&method), Err(Error::LoopNotFound)));
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// ```rust
/// use keyscope::prelude::*;
///
/// let config = DecrypterConfig::default();
/// assert_eq!(config.strategies, LocateStrategies::all());
/// ```
pub mod prelude;

/// CIL instruction processing: decoding, encoding and assembling.
///
/// # Key Components
///
/// - [`assembly::Instruction`] - A decoded instruction with operand, flow type and stack effect
/// - [`assembly::decode_stream`] - Decodes a code buffer into instructions
/// - [`assembly::InstructionAssembler`] - Fluent builder with label resolution
pub mod assembly;

/// Abstract interpretation of CIL instructions.
pub mod emulation;

/// Loop location and keystream decryption.
pub mod deobfuscation;

/// Method bodies, metadata tokens and type flavors.
pub mod metadata;

/// `keyscope` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `keyscope` Error type.
///
/// The main error type for all operations in this crate. See [`Error`] for the list of
/// variants.
pub use error::Error;

/// Bounds-checked little-endian reader over a byte slice.
///
/// ```rust
/// use keyscope::Parser;
///
/// let mut parser = Parser::new(&[0x01, 0x00, 0x02]);
/// assert_eq!(parser.read_le::<u16>()?, 1);
/// assert_eq!(parser.read_le::<u8>()?, 2);
/// assert!(parser.read_le::<u8>().is_err());
/// # Ok::<(), keyscope::Error>(())
/// ```
pub use file::parser::Parser;
