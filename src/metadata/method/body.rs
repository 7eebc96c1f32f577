//! Parsing of ECMA-335 method body headers.
//!
//! Only the header is interpreted here; exception-handling sections that may
//! follow the code are ignored because the keystream loop never spans a
//! protected region.
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Method Header Format

use crate::{
    file::io::read_le,
    metadata::method::MethodBodyFlags,
    Error::OutOfBounds,
    Result,
};

/// Describes the header of a method body and where its CIL code is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Size of the CIL code in bytes
    pub size_code: usize,
    /// Size of the method header in bytes
    pub size_header: usize,
    /// Metadata token of the local variable signature, 0 if there are no locals
    pub local_var_sig_token: u32,
    /// Maximum number of items on the evaluation stack
    pub max_stack: usize,
    /// Whether the header is in fat format
    pub is_fat: bool,
    /// Whether locals are zero-initialised on entry
    pub is_init_local: bool,
    /// Whether extra data sections follow the code
    pub has_more_sections: bool,
}

impl MethodBody {
    /// Parse a method header from the start of `data`.
    ///
    /// # Arguments
    /// * `data` - The method body bytes, starting at the header
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the header claims more code than `data`
    /// holds, and [`crate::Error::Malformed`] for an empty slice or an unknown header kind.
    pub fn from(data: &[u8]) -> Result<MethodBody> {
        if data.is_empty() {
            return Err(malformed_error!("Provided data for body parsing is empty"));
        }

        let first_byte = read_le::<u8>(data)?;
        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0b_00000011_u8)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = (first_byte >> 2) as usize;
                if size_code + 1 > data.len() {
                    return Err(OutOfBounds);
                }

                Ok(MethodBody {
                    size_code,
                    size_header: 1,
                    local_var_sig_token: 0,
                    max_stack: 8,
                    is_fat: false,
                    is_init_local: false,
                    has_more_sections: false,
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                if data.len() < 12 {
                    return Err(OutOfBounds);
                }

                let first_duo = read_le::<u16>(data)?;
                let size_header = usize::from(first_duo >> 12) * 4;
                if size_header < 12 {
                    return Err(malformed_error!(
                        "Fat method header declares {} bytes",
                        size_header
                    ));
                }

                let size_code = read_le::<u32>(&data[4..])? as usize;
                if data.len() < size_code.saturating_add(size_header) {
                    return Err(OutOfBounds);
                }

                let flags_header =
                    MethodBodyFlags::from_bits_truncate(first_duo & 0b_0000111111111111_u16);

                Ok(MethodBody {
                    size_code,
                    size_header,
                    local_var_sig_token: read_le::<u32>(&data[8..])?,
                    max_stack: read_le::<u16>(&data[2..])? as usize,
                    is_fat: true,
                    is_init_local: flags_header.contains(MethodBodyFlags::INIT_LOCALS),
                    has_more_sections: flags_header.contains(MethodBodyFlags::MORE_SECTS),
                })
            }
            _ => Err(malformed_error!(
                "MethodHeader is neither FAT nor TINY - {}",
                first_byte
            )),
        }
    }

    /// Total size of header and code.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_code + self.size_header
    }

    /// The CIL code bytes of this body within `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than [`MethodBody::size`].
    pub fn code<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        data.get(self.size_header..self.size()).ok_or(OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn tiny() {
        // ldc.i4.1; ret
        let data = [0x0A, 0x17, 0x2A];

        let method_header = MethodBody::from(&data).unwrap();

        assert!(!method_header.is_fat);
        assert!(!method_header.is_init_local);
        assert_eq!(method_header.max_stack, 8);
        assert_eq!(method_header.size_code, 2);
        assert_eq!(method_header.size_header, 1);
        assert_eq!(method_header.size(), 3);
        assert_eq!(method_header.code(&data).unwrap(), &[0x17, 0x2A]);
    }

    #[test]
    fn fat() {
        let data = [
            0x13, 0x30, // flags 0x013 (fat | init locals), header size 3 dwords
            0x05, 0x00, // max stack
            0x02, 0x00, 0x00, 0x00, // code size
            0x59, 0x00, 0x00, 0x11, // local var sig token
            0x17, 0x2A,
        ];

        let method_header = MethodBody::from(&data).unwrap();

        assert!(method_header.is_fat);
        assert!(method_header.is_init_local);
        assert!(!method_header.has_more_sections);
        assert_eq!(method_header.max_stack, 5);
        assert_eq!(method_header.size_code, 2);
        assert_eq!(method_header.size_header, 12);
        assert_eq!(method_header.local_var_sig_token, 0x1100_0059);
        assert_eq!(method_header.code(&data).unwrap(), &[0x17, 0x2A]);
    }

    #[test]
    fn truncated() {
        assert!(matches!(MethodBody::from(&[]), Err(Error::Malformed { .. })));
        // tiny header claiming 4 bytes of code, only 1 present
        assert!(matches!(MethodBody::from(&[0x12, 0x00]), Err(Error::OutOfBounds)));
        // fat header shorter than 12 bytes
        assert!(matches!(
            MethodBody::from(&[0x03, 0x30, 0x00, 0x00]),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn invalid_kind() {
        assert!(matches!(
            MethodBody::from(&[0x01, 0x00]),
            Err(Error::Malformed { .. })
        ));
    }
}
