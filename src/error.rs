use thiserror::Error;

use crate::emulation::EmulationError;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid method body / bytecode
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the input
/// - [`Error::NotSupported`] - Unsupported input or feature
/// - [`Error::Empty`] - Empty input provided
///
/// ## Encoding Errors
/// - [`Error::InvalidMnemonic`], [`Error::WrongOperandType`], [`Error::UnexpectedOperand`] - Bad instruction input
/// - [`Error::InvalidBranch`], [`Error::DuplicateLabel`], [`Error::UndefinedLabel`] - Label resolution failures
///
/// ## Decrypter Errors
/// - [`Error::LoopNotFound`] - No keystream loop could be located in the candidate method
/// - [`Error::MagicCalculation`] - The recovered loop did not produce a concrete 32-bit word
/// - [`Error::BufferUnderrun`] - A tail read found no bytes left in the encrypted buffer
///
/// ## Emulation Errors
/// - [`Error::Emulation`] - The abstract interpreter failed on an instruction
///
/// # Examples
///
/// ```rust
/// use keyscope::{Error, metadata::method::Method};
/// use keyscope::deobfuscation::ResourceDecrypter;
///
/// let method = Method::new(Default::default(), "Empty", vec![], vec![], vec![], false);
/// match ResourceDecrypter::new(&method) {
///     Err(Error::LoopNotFound) => println!("not a resource decrypter"),
///     Err(e) => eprintln!("unexpected: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the input.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This input is not supported.
    #[error("This input is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// The encoder does not know this mnemonic.
    #[error("Invalid instruction mnemonic: {0}")]
    InvalidMnemonic(String),

    /// The operand passed to the encoder does not match the opcode's operand type.
    #[error("Wrong operand type - expected {expected}")]
    WrongOperandType {
        /// The operand type the opcode requires
        expected: String,
    },

    /// The encoder received an operand for an opcode that takes none.
    #[error("Unexpected operand for instruction without operands")]
    UnexpectedOperand,

    /// A branch could not be encoded.
    #[error("Invalid branch - {0}")]
    InvalidBranch(String),

    /// A label was defined twice.
    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),

    /// A branch refers to a label that was never defined.
    #[error("Undefined label: {0}")]
    UndefinedLabel(String),

    /// The abstract interpreter rejected an instruction.
    #[error("Emulation - {0}")]
    Emulation(#[from] EmulationError),

    /// Neither locating strategy recognised a keystream loop in the method.
    ///
    /// The decrypter cannot be constructed for this method; callers should try
    /// another candidate method or decrypter variant.
    #[error("No recognizable keystream loop found in decrypter method")]
    LoopNotFound,

    /// The instruction window did not leave a fully concrete 32-bit integer
    /// on the evaluation stack.
    ///
    /// This indicates a misclassified dialect or an unsupported obfuscator
    /// version and is never retried.
    #[error("Could not calculate magic value - {reason}")]
    MagicCalculation {
        /// Why the final stack value was rejected
        reason: String,
    },

    /// A read of the encrypted buffer found no bytes at the requested offset.
    #[error("Buffer underrun at offset {offset} ({available} bytes available)")]
    BufferUnderrun {
        /// Offset of the failed read
        offset: usize,
        /// Bytes that remained at that offset
        available: usize,
    },
}
