//! Metadata tokens as they appear in CIL operands.
//!
//! A token is a 32-bit value whose high byte selects a metadata table and whose
//! low 24 bits are a 1-based row index. The decrypter only carries tokens around
//! (field loads, calls, `ldelem` element types) without resolving them.

use std::fmt;

/// A metadata token (`table << 24 | row`).
///
/// # Examples
///
/// ```rust
/// use keyscope::metadata::token::Token;
///
/// let token = Token::new(0x0600_0012);
/// assert_eq!(token.table(), 0x06);
/// assert_eq!(token.row(), 0x12);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Creates a token from its raw value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Token(value)
    }

    /// Raw 32-bit token value.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Metadata table index (the high byte).
    #[must_use]
    pub const fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Row index inside the table (the low 24 bits).
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns `true` for the nil token.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(0x{:08x})", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_and_row() {
        let token = Token::new(0x0A00_0003);
        assert_eq!(token.table(), 0x0A);
        assert_eq!(token.row(), 3);
        assert!(!token.is_null());
        assert!(Token::default().is_null());
    }

    #[test]
    fn formatting() {
        let token = Token::from(0x0400_00FFu32);
        assert_eq!(token.to_string(), "0x040000ff");
        assert_eq!(format!("{token:?}"), "Token(0x040000ff)");
    }
}
