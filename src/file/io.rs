//! Endian-aware, bounds-checked reading and writing of primitive values.
//!
//! The [`CilIO`] trait gives every fixed-width integer and float a uniform way of
//! being decoded from (and encoded to) little-endian byte slices. All helpers
//! report [`crate::Error::OutOfBounds`] instead of panicking when the buffer is
//! too short, which is what bytecode and method-header parsing rely on.
//!
//! # Examples
//!
//! ```rust,ignore
//! use keyscope::file::io::{read_le, read_le_at};
//!
//! let data = [0x01, 0x00, 0x02, 0x00];
//! let first: u16 = read_le(&data)?;
//!
//! let mut offset = 2;
//! let second: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!((first, second, offset), (1, 2, 4));
//! ```

use crate::Result;

/// Trait for primitive types that can be read from and written to byte buffers.
pub trait CilIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]> + AsRef<[u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cilio {
    ($($ty:ty => $n:expr),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; $n];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_cilio! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
    f32 => 4,
    f64 => 8,
}

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`,
/// advancing `offset` past the value.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let end = offset
        .checked_add(type_len)
        .ok_or(crate::Error::OutOfBounds)?;
    if end > data.len() {
        return Err(crate::Error::OutOfBounds);
    }

    let Ok(read) = T::Bytes::try_from(&data[*offset..end]) else {
        return Err(crate::Error::OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Writes `value` in little-endian byte order at `offset`, advancing `offset`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit in `data`.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_le_bytes();
    let bytes = bytes.as_ref();
    let end = offset
        .checked_add(bytes.len())
        .ok_or(crate::Error::OutOfBounds)?;
    if end > data.len() {
        return Err(crate::Error::OutOfBounds);
    }

    data[*offset..end].copy_from_slice(bytes);
    *offset = end;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_u32() {
        let result = read_le::<u32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_at_advances() {
        let mut offset = 2;
        let result = read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(result, 0x0403);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_le_f64_bits() {
        let bytes = 1.5f64.to_le_bytes();
        assert_eq!(read_le::<f64>(&bytes).unwrap(), 1.5);
    }

    #[test]
    fn read_le_too_short() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(result, Err(Error::OutOfBounds)));
        assert_eq!(offset, 6);
    }

    #[test]
    fn write_le_at_roundtrip() {
        let mut buffer = [0u8; 6];
        let mut offset = 1;
        write_le_at(&mut buffer, &mut offset, 0xAABB_CCDDu32).unwrap();
        assert_eq!(buffer, [0x00, 0xDD, 0xCC, 0xBB, 0xAA, 0x00]);
        assert_eq!(offset, 5);

        let mut offset = 4;
        assert!(matches!(
            write_le_at(&mut buffer, &mut offset, 0u32),
            Err(Error::OutOfBounds)
        ));
    }
}
