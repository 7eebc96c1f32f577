//! Method-level metadata the decrypter consumes.
//!
//! The surrounding pipeline is responsible for reading assemblies; this module only models
//! what a single candidate method contributes:
//!
//! - [`method`] - Method bodies, header parsing and declared locals/parameters
//! - [`token`] - Metadata table row references
//! - [`typesystem`] - Declared kinds of storage slots
//!
//! # Examples
//!
//! ```rust
//! use keyscope::metadata::{method::MethodBody, token::Token};
//!
//! let body = MethodBody::from(&[0x06, 0x00])?; // tiny header, one byte of code
//! assert_eq!(body.size_code, 1);
//! assert_eq!(Token::new(0x0600_0001).table(), 0x06);
//! # Ok::<(), keyscope::Error>(())
//! ```

/// Implementation of method bodies, locals and the decoded instruction list
pub mod method;
/// Implementation of metadata tokens
pub mod token;
/// Implementation of the declared kinds of locals and parameters
pub mod typesystem;
