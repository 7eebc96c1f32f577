//! Cursor-based binary parser over a byte slice.
//!
//! [`Parser`] is the low-level reader the CIL decoder works with: it tracks a
//! position, reads little-endian primitives through [`crate::file::io::CilIO`] and
//! reports [`crate::Error::OutOfBounds`] rather than panicking on truncated input.

use crate::{
    file::io::{read_le_at, CilIO},
    Error, Result,
};

/// A generic binary data parser for reading CIL bytecode.
///
/// # Examples
///
/// ```rust
/// use keyscope::Parser;
///
/// let data = [0x20, 0x2A, 0x00, 0x00, 0x00]; // ldc.i4 42
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_le::<u8>()?, 0x20);
/// assert_eq!(parser.read_le::<i32>()?, 42);
/// assert!(!parser.has_more_data());
/// # Ok::<(), keyscope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(Error::OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Get the current position of the parser.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if at the end of data.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(Error::OutOfBounds);
        }
        Ok(self.data[self.position])
    }

    /// Read a value of type `T` in little-endian and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there is insufficient data.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Returns the number of bytes left after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_le::<u8>().unwrap(), 0x01);
        assert_eq!(parser.read_le::<u32>().unwrap(), 0x0504_0302);
        assert!(!parser.has_more_data());
        assert_eq!(parser.remaining(), 0);
    }

    #[test]
    fn seek_and_peek() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut parser = Parser::new(&data);

        parser.seek(2).unwrap();
        assert_eq!(parser.peek_byte().unwrap(), 0xCC);
        assert_eq!(parser.pos(), 2);
        assert!(matches!(parser.seek(3), Err(Error::OutOfBounds)));
    }

    #[test]
    fn read_past_end() {
        let data = [0x01, 0x02];
        let mut parser = Parser::new(&data);

        assert!(matches!(parser.read_le::<u32>(), Err(Error::OutOfBounds)));
        assert_eq!(parser.pos(), 0);

        parser.seek(1).unwrap();
        parser.read_le::<u8>().unwrap();
        assert!(matches!(parser.peek_byte(), Err(Error::OutOfBounds)));
    }
}
