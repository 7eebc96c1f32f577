//! Obfuscator-specific decryption support.
//!
//! Each submodule handles the protections of one obfuscator family. The public types are
//! re-exported from [`crate::deobfuscation`].
//!
//! # Built-in Obfuscators
//!
//! - [`reactor`] - .NET Reactor encrypted resources

pub mod reactor;
