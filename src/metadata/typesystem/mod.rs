//! Declared kinds of locals and parameters.
//!
//! The decrypter does not need the full .NET type system: the abstract
//! interpreter only has to know how wide a slot is and whether it holds an
//! integer, a float or a reference, so it can zero-initialise it and coerce
//! stored values the way the runtime would.

use strum::{Display, EnumIter};

/// The flavor of a CIL storage slot (local variable or parameter).
///
/// # Examples
///
/// ```rust
/// use keyscope::metadata::typesystem::CilFlavor;
///
/// assert!(CilFlavor::U1.is_stack_i4());
/// assert!(CilFlavor::R4.is_float());
/// assert!(!CilFlavor::Object.is_primitive());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CilFlavor {
    /// `bool`
    Boolean,
    /// `char`
    Char,
    /// `sbyte`
    I1,
    /// `byte`
    U1,
    /// `short`
    I2,
    /// `ushort`
    U2,
    /// `int`
    I4,
    /// `uint`
    U4,
    /// `long`
    I8,
    /// `ulong`
    U8,
    /// `float`
    R4,
    /// `double`
    R8,
    /// `nint`
    I,
    /// `nuint`
    U,
    /// Any reference type (class, string, array, boxed value)
    Object,
    /// A user-defined value type
    ValueType,
}

impl CilFlavor {
    /// Check if this is a primitive numeric or boolean type.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        !matches!(self, CilFlavor::Object | CilFlavor::ValueType)
    }

    /// Check if values of this flavor live on the evaluation stack as `int32`.
    #[must_use]
    pub fn is_stack_i4(&self) -> bool {
        matches!(
            self,
            CilFlavor::Boolean
                | CilFlavor::Char
                | CilFlavor::I1
                | CilFlavor::U1
                | CilFlavor::I2
                | CilFlavor::U2
                | CilFlavor::I4
                | CilFlavor::U4
        )
    }

    /// Check if values of this flavor live on the evaluation stack as `int64`.
    ///
    /// Native integers are modelled as 64-bit.
    #[must_use]
    pub fn is_stack_i8(&self) -> bool {
        matches!(
            self,
            CilFlavor::I8 | CilFlavor::U8 | CilFlavor::I | CilFlavor::U
        )
    }

    /// Check if this is a floating point flavor.
    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, CilFlavor::R4 | CilFlavor::R8)
    }

    /// Width in bits of the integer stored in a slot of this flavor, if it is an integer.
    #[must_use]
    pub fn int_bits(&self) -> Option<u32> {
        match self {
            CilFlavor::Boolean | CilFlavor::I1 | CilFlavor::U1 => Some(8),
            CilFlavor::Char | CilFlavor::I2 | CilFlavor::U2 => Some(16),
            CilFlavor::I4 | CilFlavor::U4 => Some(32),
            CilFlavor::I8 | CilFlavor::U8 | CilFlavor::I | CilFlavor::U => Some(64),
            _ => None,
        }
    }

    /// Check if a narrowed value of this flavor is sign-extended back to 32 bits.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            CilFlavor::I1 | CilFlavor::I2 | CilFlavor::I4 | CilFlavor::I8 | CilFlavor::I
        )
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn stack_classes_are_disjoint() {
        for flavor in CilFlavor::iter() {
            let classes = [flavor.is_stack_i4(), flavor.is_stack_i8(), flavor.is_float()];
            assert!(
                classes.iter().filter(|c| **c).count() <= 1,
                "{flavor} belongs to more than one stack class"
            );
            if !flavor.is_primitive() {
                assert!(classes.iter().all(|c| !c));
            }
        }
    }

    #[test]
    fn int_widths() {
        assert_eq!(CilFlavor::U1.int_bits(), Some(8));
        assert_eq!(CilFlavor::Char.int_bits(), Some(16));
        assert_eq!(CilFlavor::U4.int_bits(), Some(32));
        assert_eq!(CilFlavor::I.int_bits(), Some(64));
        assert_eq!(CilFlavor::R8.int_bits(), None);
        assert!(CilFlavor::I2.is_signed());
        assert!(!CilFlavor::Char.is_signed());
    }
}
