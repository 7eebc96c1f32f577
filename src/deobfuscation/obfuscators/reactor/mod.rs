//! .NET Reactor resource decryption.
//!
//! .NET Reactor encrypts embedded resources with a XOR keystream. The keystream generator is
//! emitted per protected assembly as a loop inside the decrypter method: every iteration
//! updates a running sum held in one local, and that sum is the next 32-bit key word. Instead
//! of reimplementing each generated variant, the loop is located and run through the abstract
//! interpreter:
//!
//! 1. [`locate`] finds the instruction window of the update and the accumulator local
//!    ([`LocateStrategy::TwoPhase`] first, then [`LocateStrategy::SinglePhase`]) and classifies
//!    its [`Dialect`]
//! 2. [`MagicCalculator`] emulates the window once per key word, seeded with the previous word
//! 3. [`ResourceDecrypter`] XORs the resulting keystream over the resource
//!
//! # Example
//!
//! ```rust
//! use keyscope::{
//!     assembly::{decode_stream, InstructionAssembler},
//!     deobfuscation::{Dialect, ResourceDecrypter},
//!     metadata::{method::{Local, Method}, token::Token, typesystem::CilFlavor},
//!     Parser,
//! };
//!
//! // sum = (uint)(double)sum + sum
//! let mut asm = InstructionAssembler::new();
//! asm.br_s("update")?
//!     .nop()?
//!     .label("update")?
//!     .ldloc(0)?
//!     .ldloc(0)?
//!     .conv_r_un()?
//!     .conv_r8()?
//!     .conv_u4()?
//!     .add()?
//!     .stloc(0)?;
//! let (code, _, _) = asm.finish()?;
//!
//! let method = Method::new(
//!     Token::new(0x0600_0001),
//!     "Decrypt",
//!     decode_stream(&mut Parser::new(&code), 0)?,
//!     vec![Local::new(0, CilFlavor::U4)],
//!     vec![],
//!     true,
//! );
//!
//! let mut decrypter = ResourceDecrypter::new(&method)?;
//! assert_eq!(decrypter.dialect(), Dialect::StandardLoop);
//! assert_eq!(decrypter.calculate(21)?, 42);
//! # Ok::<(), keyscope::Error>(())
//! ```

mod calculator;
mod decrypter;
mod locator;

pub use calculator::MagicCalculator;
pub use decrypter::{decrypt_all, read_u32_tail, write_u32_tail, Keystream, ResourceDecrypter};
pub use locator::{locate, Dialect, LocateStrategy, LoopWindow};
