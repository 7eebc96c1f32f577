//! Abstract values for the resource-key interpreter.
//!
//! The interpreter only needs the four evaluation stack shapes that keystream loops produce:
//!
//! - [`EmValue::I32`] - a 32-bit integer that may be partially known ([`Int32Value`])
//! - [`EmValue::I64`] - a fully known 64-bit integer (also used for native ints)
//! - [`EmValue::F64`] - a fully known float (`float32` values are widened)
//! - [`EmValue::Unknown`] - anything else, including object references and addresses
//!
//! Arithmetic, comparisons and conversions ([`BinaryOp`], [`UnaryOp`], [`CompareOp`],
//! [`ConversionType`]) follow ECMA-335 stack semantics. Operations never fail: an operation the domain cannot express yields
//! [`EmValue::Unknown`] and the caller decides whether that matters.

mod int32;
mod ops;

pub use int32::Int32Value;
pub use ops::{BinaryOp, CompareOp, ConversionType, UnaryOp};

use std::fmt;

use crate::metadata::typesystem::CilFlavor;

/// A value on the evaluation stack or in a local slot.
///
/// # Examples
///
/// ```rust
/// use keyscope::emulation::{EmValue, Int32Value};
///
/// assert!(EmValue::i32(7).is_concrete());
/// assert!(!EmValue::I32(Int32Value::new(0, 0xFF)).is_concrete());
/// assert_eq!(EmValue::u32(0xDEAD_BEEF).as_concrete_u32(), Some(0xDEAD_BEEF));
/// assert!(EmValue::F64(-0.5).is_nonzero_concrete());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EmValue {
    /// 32-bit integer, possibly with unknown bits
    I32(Int32Value),
    /// 64-bit integer
    I64(i64),
    /// Floating point value
    F64(f64),
    /// Nothing is known about the value
    #[default]
    Unknown,
}

impl EmValue {
    /// A fully known `int32`.
    #[must_use]
    pub const fn i32(value: i32) -> Self {
        EmValue::I32(Int32Value::from_i32(value))
    }

    /// A fully known `int32` given as its unsigned bit pattern.
    #[must_use]
    pub const fn u32(value: u32) -> Self {
        EmValue::I32(Int32Value::concrete(value))
    }

    /// The zero value a slot of `flavor` holds when locals are initialised.
    ///
    /// Reference and struct slots have no modelled zero and start out unknown.
    #[must_use]
    pub fn zero_of(flavor: CilFlavor) -> Self {
        if flavor.is_stack_i4() {
            EmValue::u32(0)
        } else if flavor.is_stack_i8() {
            EmValue::I64(0)
        } else if flavor.is_float() {
            EmValue::F64(0.0)
        } else {
            EmValue::Unknown
        }
    }

    /// Check if the value is fully determined.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        match self {
            EmValue::I32(value) => value.is_concrete(),
            EmValue::I64(_) | EmValue::F64(_) => true,
            EmValue::Unknown => false,
        }
    }

    /// The unsigned bit pattern of a fully known `int32`.
    #[must_use]
    pub fn as_concrete_u32(&self) -> Option<u32> {
        match self {
            EmValue::I32(value) => value.as_u32(),
            _ => None,
        }
    }

    /// Check if the value is fully known and not zero.
    ///
    /// `NaN` counts as non-zero.
    #[must_use]
    pub fn is_nonzero_concrete(&self) -> bool {
        match self {
            EmValue::I32(value) => value.as_u32().is_some_and(|v| v != 0),
            EmValue::I64(value) => *value != 0,
            EmValue::F64(value) => *value != 0.0,
            EmValue::Unknown => false,
        }
    }

    /// Name of the stack shape, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            EmValue::I32(_) => "int32",
            EmValue::I64(_) => "int64",
            EmValue::F64(_) => "float",
            EmValue::Unknown => "unknown",
        }
    }

    /// Truncate or widen the value the way a store into a slot of `flavor` does.
    ///
    /// Small integer slots keep only their width, 64-bit slots widen `int32` values and
    /// `float32` slots round. Slots without a numeric flavor keep the value unchanged.
    #[must_use]
    pub fn coerce_to(self, flavor: CilFlavor) -> Self {
        match flavor {
            CilFlavor::Boolean | CilFlavor::U1 => self.convert(ConversionType::U1),
            CilFlavor::I1 => self.convert(ConversionType::I1),
            CilFlavor::Char | CilFlavor::U2 => self.convert(ConversionType::U2),
            CilFlavor::I2 => self.convert(ConversionType::I2),
            CilFlavor::I4 | CilFlavor::U4 => match self {
                EmValue::I64(_) => self.convert(ConversionType::I4),
                _ => self,
            },
            CilFlavor::I8 | CilFlavor::I => match self {
                EmValue::I32(_) => self.convert(ConversionType::I8),
                _ => self,
            },
            CilFlavor::U8 | CilFlavor::U => match self {
                EmValue::I32(_) => self.convert(ConversionType::U8),
                _ => self,
            },
            CilFlavor::R4 => match self {
                EmValue::F64(_) => self.convert(ConversionType::R4),
                _ => self,
            },
            CilFlavor::R8 | CilFlavor::Object | CilFlavor::ValueType => self,
        }
    }
}

impl From<Int32Value> for EmValue {
    fn from(value: Int32Value) -> Self {
        EmValue::I32(value)
    }
}

impl fmt::Display for EmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmValue::I32(value) => write!(f, "int32({value})"),
            EmValue::I64(value) => write!(f, "int64({value})"),
            EmValue::F64(value) => write!(f, "float({value})"),
            EmValue::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_of_flavors() {
        assert_eq!(EmValue::zero_of(CilFlavor::U4), EmValue::u32(0));
        assert_eq!(EmValue::zero_of(CilFlavor::Boolean), EmValue::u32(0));
        assert_eq!(EmValue::zero_of(CilFlavor::U8), EmValue::I64(0));
        assert_eq!(EmValue::zero_of(CilFlavor::R4), EmValue::F64(0.0));
        assert_eq!(EmValue::zero_of(CilFlavor::Object), EmValue::Unknown);
    }

    #[test]
    fn nonzero_concrete() {
        assert!(EmValue::i32(-1).is_nonzero_concrete());
        assert!(!EmValue::i32(0).is_nonzero_concrete());
        assert!(EmValue::I64(5).is_nonzero_concrete());
        assert!(!EmValue::F64(0.0).is_nonzero_concrete());
        assert!(EmValue::F64(f64::NAN).is_nonzero_concrete());
        assert!(!EmValue::I32(Int32Value::new(1, 1)).is_nonzero_concrete());
        assert!(!EmValue::Unknown.is_nonzero_concrete());
    }

    #[test]
    fn coerce_small_slots() {
        assert_eq!(EmValue::u32(0x1FF).coerce_to(CilFlavor::U1), EmValue::u32(0xFF));
        assert_eq!(EmValue::u32(0xFF).coerce_to(CilFlavor::I1), EmValue::i32(-1));
        assert_eq!(EmValue::u32(0x1_0041).coerce_to(CilFlavor::Char), EmValue::u32(0x41));
        assert_eq!(EmValue::u32(7).coerce_to(CilFlavor::U4), EmValue::u32(7));
    }

    #[test]
    fn coerce_wide_slots() {
        assert_eq!(EmValue::i32(-1).coerce_to(CilFlavor::I8), EmValue::I64(-1));
        assert_eq!(
            EmValue::i32(-1).coerce_to(CilFlavor::U8),
            EmValue::I64(0xFFFF_FFFF)
        );
        assert_eq!(
            EmValue::I64(0x1_0000_0002).coerce_to(CilFlavor::I4),
            EmValue::u32(2)
        );
        assert_eq!(EmValue::F64(0.1).coerce_to(CilFlavor::R4), EmValue::F64(f64::from(0.1f32)));
        assert_eq!(EmValue::Unknown.coerce_to(CilFlavor::I8), EmValue::Unknown);
    }

    #[test]
    fn display() {
        assert_eq!(EmValue::u32(1).to_string(), "int32(0x00000001)");
        assert_eq!(EmValue::Unknown.to_string(), "unknown");
    }
}
