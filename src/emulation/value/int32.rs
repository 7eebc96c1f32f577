//! 32-bit integers with partially known bit patterns.
//!
//! An [`Int32Value`] pairs a bit pattern with a mask of the bits that are actually known.
//! Bits outside the mask are always stored as zero, so two values with the same knowledge
//! compare equal.

use std::fmt;

/// A 32-bit integer whose individual bits may be unknown.
///
/// # Examples
///
/// ```rust
/// use keyscope::emulation::Int32Value;
///
/// // low byte known, rest unknown
/// let low = Int32Value::new(0x0000_00AB, 0x0000_00FF);
/// let masked = low.and(Int32Value::concrete(0x0F));
///
/// assert!(masked.is_concrete());
/// assert_eq!(masked.as_u32(), Some(0x0B));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Int32Value {
    value: u32,
    valid_mask: u32,
}

impl Int32Value {
    /// Mask of a fully known value.
    pub const ALL_VALID: u32 = u32::MAX;

    /// Create a value from a bit pattern and the mask of known bits.
    #[must_use]
    pub const fn new(value: u32, valid_mask: u32) -> Self {
        Int32Value {
            value: value & valid_mask,
            valid_mask,
        }
    }

    /// A fully known value.
    #[must_use]
    pub const fn concrete(value: u32) -> Self {
        Self::new(value, Self::ALL_VALID)
    }

    /// A fully known signed value.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self::concrete(u32::from_ne_bytes(value.to_ne_bytes()))
    }

    /// A value with no known bits.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::new(0, 0)
    }

    /// The known bits; unknown bits read as zero.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.value
    }

    /// Mask of the known bits.
    #[must_use]
    pub const fn valid_mask(self) -> u32 {
        self.valid_mask
    }

    /// Check if every bit is known.
    #[must_use]
    pub const fn is_concrete(self) -> bool {
        self.valid_mask == Self::ALL_VALID
    }

    /// The value as `u32`, if fully known.
    #[must_use]
    pub const fn as_u32(self) -> Option<u32> {
        if self.is_concrete() {
            Some(self.value)
        } else {
            None
        }
    }

    /// The value as `i32`, if fully known.
    #[must_use]
    pub const fn as_i32(self) -> Option<i32> {
        match self.as_u32() {
            Some(value) => Some(i32::from_ne_bytes(value.to_ne_bytes())),
            None => None,
        }
    }

    /// Bitwise AND; a known zero on either side gives a known zero.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        let known_zero = (self.valid_mask & !self.value) | (other.valid_mask & !other.value);
        let mask = (self.valid_mask & other.valid_mask) | known_zero;
        Self::new(self.value & other.value, mask)
    }

    /// Bitwise OR; a known one on either side gives a known one.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        let known_one = self.value | other.value;
        let mask = (self.valid_mask & other.valid_mask) | known_one;
        Self::new(self.value | other.value, mask)
    }

    /// Bitwise XOR.
    #[must_use]
    pub const fn xor(self, other: Self) -> Self {
        Self::new(
            self.value ^ other.value,
            self.valid_mask & other.valid_mask,
        )
    }

    /// Bitwise NOT.
    #[must_use]
    pub const fn not(self) -> Self {
        Self::new(!self.value, self.valid_mask)
    }

    /// Wrapping addition; bits above the lowest unknown bit of either operand are lost.
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self::new(
            self.value.wrapping_add(other.value),
            self.carry_mask(other),
        )
    }

    /// Wrapping subtraction, same knowledge rule as [`Int32Value::add`].
    #[must_use]
    pub const fn sub(self, other: Self) -> Self {
        Self::new(
            self.value.wrapping_sub(other.value),
            self.carry_mask(other),
        )
    }

    /// Wrapping multiplication, same knowledge rule as [`Int32Value::add`].
    #[must_use]
    pub const fn mul(self, other: Self) -> Self {
        Self::new(
            self.value.wrapping_mul(other.value),
            self.carry_mask(other),
        )
    }

    /// Two's complement negation.
    #[must_use]
    pub const fn neg(self) -> Self {
        self.not().add(Self::concrete(1))
    }

    /// Left shift by `amount & 31`; vacated low bits are known zero.
    #[must_use]
    pub const fn shl(self, amount: u32) -> Self {
        let shift = amount & 31;
        let filled = (1u32 << shift).wrapping_sub(1);
        Self::new(self.value << shift, (self.valid_mask << shift) | filled)
    }

    /// Logical right shift by `amount & 31`; vacated high bits are known zero.
    #[must_use]
    pub const fn shr_un(self, amount: u32) -> Self {
        let shift = amount & 31;
        let filled = !(u32::MAX >> shift);
        Self::new(self.value >> shift, (self.valid_mask >> shift) | filled)
    }

    /// Arithmetic right shift by `amount & 31`; vacated high bits are known only if the sign is.
    #[must_use]
    pub const fn shr(self, amount: u32) -> Self {
        let shift = amount & 31;
        let value = (i32::from_ne_bytes(self.value.to_ne_bytes()) >> shift).to_ne_bytes();
        let mask = (i32::from_ne_bytes(self.valid_mask.to_ne_bytes()) >> shift).to_ne_bytes();
        Self::new(u32::from_ne_bytes(value), u32::from_ne_bytes(mask))
    }

    /// Keep the low `bits` bits and replicate bit `bits - 1` upwards.
    #[must_use]
    pub const fn sign_extend(self, bits: u32) -> Self {
        if bits >= 32 {
            return self;
        }

        let low = (1u32 << bits) - 1;
        let sign = 1u32 << (bits - 1);
        let value = self.value & low;
        let mask = self.valid_mask & low;

        if mask & sign == 0 {
            return Self::new(value, mask);
        }

        let extension = if value & sign != 0 { !low } else { 0 };
        Self::new(value | extension, mask | !low)
    }

    /// Keep the low `bits` bits; the high bits become known zero.
    #[must_use]
    pub const fn zero_extend(self, bits: u32) -> Self {
        if bits >= 32 {
            return self;
        }

        let low = (1u32 << bits) - 1;
        Self::new(self.value & low, (self.valid_mask & low) | !low)
    }

    const fn carry_mask(self, other: Self) -> u32 {
        let known = (self.valid_mask & other.valid_mask).trailing_ones();
        if known >= 32 {
            u32::MAX
        } else {
            (1u32 << known) - 1
        }
    }
}

impl From<u32> for Int32Value {
    fn from(value: u32) -> Self {
        Self::concrete(value)
    }
}

impl From<i32> for Int32Value {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl fmt::Display for Int32Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_concrete() {
            write!(f, "0x{:08X}", self.value)
        } else {
            write!(f, "0x{:08X}/0x{:08X}", self.value, self.valid_mask)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_are_cleared() {
        let value = Int32Value::new(0xFFFF_FFFF, 0x0000_FFFF);
        assert_eq!(value.value(), 0x0000_FFFF);
        assert!(!value.is_concrete());
        assert_eq!(value.as_u32(), None);
    }

    #[test]
    fn bitwise_knowledge() {
        let unknown = Int32Value::unknown();

        let anded = unknown.and(Int32Value::concrete(0x0000_00FF));
        assert_eq!(anded.valid_mask(), 0xFFFF_FF00);

        let ored = unknown.or(Int32Value::concrete(0xFFFF_0000));
        assert_eq!(ored.valid_mask(), 0xFFFF_0000);
        assert_eq!(ored.value(), 0xFFFF_0000);

        let xored = Int32Value::new(0x0F, 0x0F).xor(Int32Value::concrete(0xFF));
        assert_eq!(xored, Int32Value::new(0xF0, 0x0F));

        assert_eq!(Int32Value::concrete(0).not().as_u32(), Some(u32::MAX));
    }

    #[test]
    fn arithmetic_keeps_low_bits() {
        // bits 0..8 known on both sides
        let a = Int32Value::new(0x0000_0012, 0xFFFF_00FF);
        let b = Int32Value::concrete(0x0000_0001);

        let sum = a.add(b);
        assert_eq!(sum.valid_mask(), 0x0000_00FF);
        assert_eq!(sum.value(), 0x13);

        let product = a.mul(Int32Value::concrete(2));
        assert_eq!(product.value(), 0x24);

        assert_eq!(
            Int32Value::concrete(5).sub(Int32Value::concrete(7)).as_i32(),
            Some(-2)
        );
        assert_eq!(Int32Value::from_i32(5).neg().as_i32(), Some(-5));
    }

    #[test]
    fn shifts() {
        let unknown = Int32Value::unknown();
        assert_eq!(unknown.shl(4).valid_mask(), 0x0000_000F);
        assert_eq!(unknown.shr_un(8).valid_mask(), 0xFF00_0000);
        assert_eq!(unknown.shr(8).valid_mask(), 0);

        let negative = Int32Value::new(0x8000_0000, 0x8000_0000);
        let shifted = negative.shr(4);
        assert_eq!(shifted.valid_mask(), 0xF800_0000);
        assert_eq!(shifted.value(), 0xF800_0000);

        // shift counts wrap at 32
        assert_eq!(Int32Value::concrete(1).shl(33).as_u32(), Some(2));
    }

    #[test]
    fn extensions() {
        assert_eq!(
            Int32Value::concrete(0x0000_0180).sign_extend(8).as_u32(),
            Some(0xFFFF_FF80)
        );
        assert_eq!(
            Int32Value::concrete(0x0001_7FFF).sign_extend(16).as_u32(),
            Some(0x0000_7FFF)
        );

        let unknown_sign = Int32Value::new(0x7F, 0x7F).sign_extend(8);
        assert_eq!(unknown_sign.valid_mask(), 0x7F);

        let widened = Int32Value::unknown().zero_extend(8);
        assert_eq!(widened.valid_mask(), 0xFFFF_FF00);
    }

    #[test]
    fn display() {
        assert_eq!(Int32Value::concrete(0xAB).to_string(), "0x000000AB");
        assert_eq!(
            Int32Value::new(0x1, 0xF).to_string(),
            "0x00000001/0x0000000F"
        );
    }
}
