//! Recovery of obfuscator-protected data.
//!
//! Protection schemes often hide their key material in generated code rather than in data.
//! This module recovers such keys by locating the generating code inside a decrypter method
//! and running it through the abstract interpreter of [`crate::emulation`].
//!
//! # Architecture
//!
//! ```text
//! Method (instructions, locals) ──► locate ──► LoopWindow + Dialect
//!                                                   │
//!                          sum ──► MagicCalculator ─┴─► word ──► XOR ──► plaintext
//!                           ▲                            │
//!                           └────────────────────────────┘
//! ```
//!
//! # Key Components
//!
//! - [`ResourceDecrypter`] - Entry point: locates the keystream loop once, then decrypts
//! - [`DecrypterConfig`] / [`LocateStrategies`] - Which loop shapes to accept and interpreter limits
//! - [`LoopWindow`] / [`Dialect`] / [`LocateStrategy`] - What was located and how
//! - [`decrypt_all`] - Parallel decryption of independent resources
//!
//! # Usage
//!
//! ```rust,no_run
//! use keyscope::deobfuscation::{decrypt_all, DecrypterConfig, ResourceDecrypter};
//! # fn candidate() -> keyscope::metadata::method::Method { unimplemented!() }
//! # let resources: Vec<Vec<u8>> = Vec::new();
//!
//! let decrypter = ResourceDecrypter::with_config(&candidate(), DecrypterConfig::default())?;
//! let slices: Vec<&[u8]> = resources.iter().map(Vec::as_slice).collect();
//! let plain = decrypt_all(&decrypter, &slices)?;
//! # Ok::<(), keyscope::Error>(())
//! ```

mod config;
pub mod obfuscators;

pub use config::{DecrypterConfig, LocateStrategies};
pub use obfuscators::reactor::{
    decrypt_all, read_u32_tail, write_u32_tail, Dialect, Keystream, LocateStrategy, LoopWindow,
    MagicCalculator, ResourceDecrypter,
};
