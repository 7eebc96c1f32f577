//! Operations on abstract values.
//!
//! - [`BinaryOp`] - arithmetic and bitwise instructions (`add`, `xor`, `shr.un`, ...)
//! - [`UnaryOp`] - `neg` and `not`
//! - [`CompareOp`] - `ceq`, `cgt`, `cgt.un`, `clt`, `clt.un`
//! - [`ConversionType`] - the `conv.*` family, checked and unchecked
//!
//! `int32` operands may be partially known; see [`Int32Value`] for how knowledge flows through
//! each operation. An [`EmValue::Unknown`] paired with an `int32` is treated as an `int32` with
//! no known bits, so `x & 0` stays concrete even when `x` is not. Checked operations that would
//! throw at runtime, and integer division by zero, produce [`EmValue::Unknown`].

// Conversions reinterpret, truncate and widen on purpose; that is what the conv.* opcodes do.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless
)]

use strum::Display;

use crate::emulation::value::{EmValue, Int32Value};

/// Binary arithmetic and bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinaryOp {
    /// `add`
    #[strum(to_string = "add")]
    Add,
    /// `add.ovf`
    #[strum(to_string = "add.ovf")]
    AddOvf,
    /// `add.ovf.un`
    #[strum(to_string = "add.ovf.un")]
    AddOvfUn,
    /// `sub`
    #[strum(to_string = "sub")]
    Sub,
    /// `sub.ovf`
    #[strum(to_string = "sub.ovf")]
    SubOvf,
    /// `sub.ovf.un`
    #[strum(to_string = "sub.ovf.un")]
    SubOvfUn,
    /// `mul`
    #[strum(to_string = "mul")]
    Mul,
    /// `mul.ovf`
    #[strum(to_string = "mul.ovf")]
    MulOvf,
    /// `mul.ovf.un`
    #[strum(to_string = "mul.ovf.un")]
    MulOvfUn,
    /// `div`
    #[strum(to_string = "div")]
    Div,
    /// `div.un`
    #[strum(to_string = "div.un")]
    DivUn,
    /// `rem`
    #[strum(to_string = "rem")]
    Rem,
    /// `rem.un`
    #[strum(to_string = "rem.un")]
    RemUn,
    /// `and`
    #[strum(to_string = "and")]
    And,
    /// `or`
    #[strum(to_string = "or")]
    Or,
    /// `xor`
    #[strum(to_string = "xor")]
    Xor,
    /// `shl`
    #[strum(to_string = "shl")]
    Shl,
    /// `shr`
    #[strum(to_string = "shr")]
    Shr,
    /// `shr.un`
    #[strum(to_string = "shr.un")]
    ShrUn,
}

impl BinaryOp {
    /// Returns `true` for the three shift operations.
    #[must_use]
    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::ShrUn)
    }
}

/// Unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryOp {
    /// `neg`
    #[strum(to_string = "neg")]
    Neg,
    /// `not`
    #[strum(to_string = "not")]
    Not,
}

/// Comparisons that push a 0/1 result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CompareOp {
    /// `ceq`
    #[strum(to_string = "ceq")]
    Eq,
    /// `cgt`
    #[strum(to_string = "cgt")]
    Gt,
    /// `cgt.un`; true for unordered floats
    #[strum(to_string = "cgt.un")]
    GtUn,
    /// `clt`
    #[strum(to_string = "clt")]
    Lt,
    /// `clt.un`; true for unordered floats
    #[strum(to_string = "clt.un")]
    LtUn,
}

/// Numeric conversions.
///
/// Float to integer conversions that are out of range follow the x86 behaviour of the
/// runtime: `int32`/`int64` targets saturate to their minimum, unsigned targets go through
/// a signed 64-bit truncation first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ConversionType {
    /// `conv.i1`
    #[strum(to_string = "conv.i1")]
    I1,
    /// `conv.i2`
    #[strum(to_string = "conv.i2")]
    I2,
    /// `conv.i4`
    #[strum(to_string = "conv.i4")]
    I4,
    /// `conv.i8`
    #[strum(to_string = "conv.i8")]
    I8,
    /// `conv.u1`
    #[strum(to_string = "conv.u1")]
    U1,
    /// `conv.u2`
    #[strum(to_string = "conv.u2")]
    U2,
    /// `conv.u4`
    #[strum(to_string = "conv.u4")]
    U4,
    /// `conv.u8`
    #[strum(to_string = "conv.u8")]
    U8,
    /// `conv.r4`
    #[strum(to_string = "conv.r4")]
    R4,
    /// `conv.r8`
    #[strum(to_string = "conv.r8")]
    R8,
    /// `conv.i`
    #[strum(to_string = "conv.i")]
    I,
    /// `conv.u`
    #[strum(to_string = "conv.u")]
    U,
    /// `conv.r.un`, the source integer is read as unsigned
    #[strum(to_string = "conv.r.un")]
    RUn,
    /// `conv.ovf.i1`
    #[strum(to_string = "conv.ovf.i1")]
    I1Ovf,
    /// `conv.ovf.i2`
    #[strum(to_string = "conv.ovf.i2")]
    I2Ovf,
    /// `conv.ovf.i4`
    #[strum(to_string = "conv.ovf.i4")]
    I4Ovf,
    /// `conv.ovf.i8`
    #[strum(to_string = "conv.ovf.i8")]
    I8Ovf,
    /// `conv.ovf.u1`
    #[strum(to_string = "conv.ovf.u1")]
    U1Ovf,
    /// `conv.ovf.u2`
    #[strum(to_string = "conv.ovf.u2")]
    U2Ovf,
    /// `conv.ovf.u4`
    #[strum(to_string = "conv.ovf.u4")]
    U4Ovf,
    /// `conv.ovf.u8`
    #[strum(to_string = "conv.ovf.u8")]
    U8Ovf,
    /// `conv.ovf.i`
    #[strum(to_string = "conv.ovf.i")]
    IOvf,
    /// `conv.ovf.u`
    #[strum(to_string = "conv.ovf.u")]
    UOvf,
    /// `conv.ovf.i1.un`
    #[strum(to_string = "conv.ovf.i1.un")]
    I1OvfUn,
    /// `conv.ovf.i2.un`
    #[strum(to_string = "conv.ovf.i2.un")]
    I2OvfUn,
    /// `conv.ovf.i4.un`
    #[strum(to_string = "conv.ovf.i4.un")]
    I4OvfUn,
    /// `conv.ovf.i8.un`
    #[strum(to_string = "conv.ovf.i8.un")]
    I8OvfUn,
    /// `conv.ovf.u1.un`
    #[strum(to_string = "conv.ovf.u1.un")]
    U1OvfUn,
    /// `conv.ovf.u2.un`
    #[strum(to_string = "conv.ovf.u2.un")]
    U2OvfUn,
    /// `conv.ovf.u4.un`
    #[strum(to_string = "conv.ovf.u4.un")]
    U4OvfUn,
    /// `conv.ovf.u8.un`
    #[strum(to_string = "conv.ovf.u8.un")]
    U8OvfUn,
    /// `conv.ovf.i.un`
    #[strum(to_string = "conv.ovf.i.un")]
    IOvfUn,
    /// `conv.ovf.u.un`
    #[strum(to_string = "conv.ovf.u.un")]
    UOvfUn,
}

impl ConversionType {
    /// Returns `true` if this is a checked (overflow-detecting) conversion.
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.checked_bounds().is_some()
    }

    /// Returns `true` if the source should be treated as unsigned.
    #[must_use]
    pub fn is_unsigned_source(&self) -> bool {
        matches!(
            self,
            ConversionType::RUn
                | ConversionType::I1OvfUn
                | ConversionType::I2OvfUn
                | ConversionType::I4OvfUn
                | ConversionType::I8OvfUn
                | ConversionType::U1OvfUn
                | ConversionType::U2OvfUn
                | ConversionType::U4OvfUn
                | ConversionType::U8OvfUn
                | ConversionType::IOvfUn
                | ConversionType::UOvfUn
        )
    }

    /// The unchecked conversion and the inclusive range a checked conversion accepts.
    fn checked_bounds(&self) -> Option<(ConversionType, i128, i128)> {
        let bounds = match self {
            ConversionType::I1Ovf | ConversionType::I1OvfUn => {
                (ConversionType::I1, i8::MIN.into(), i8::MAX.into())
            }
            ConversionType::I2Ovf | ConversionType::I2OvfUn => {
                (ConversionType::I2, i16::MIN.into(), i16::MAX.into())
            }
            ConversionType::I4Ovf | ConversionType::I4OvfUn => {
                (ConversionType::I4, i32::MIN.into(), i32::MAX.into())
            }
            ConversionType::I8Ovf
            | ConversionType::I8OvfUn
            | ConversionType::IOvf
            | ConversionType::IOvfUn => (ConversionType::I8, i64::MIN.into(), i64::MAX.into()),
            ConversionType::U1Ovf | ConversionType::U1OvfUn => {
                (ConversionType::U1, 0, u8::MAX.into())
            }
            ConversionType::U2Ovf | ConversionType::U2OvfUn => {
                (ConversionType::U2, 0, u16::MAX.into())
            }
            ConversionType::U4Ovf | ConversionType::U4OvfUn => {
                (ConversionType::U4, 0, u32::MAX.into())
            }
            ConversionType::U8Ovf
            | ConversionType::U8OvfUn
            | ConversionType::UOvf
            | ConversionType::UOvfUn => (ConversionType::U8, 0, u64::MAX.into()),
            _ => return None,
        };
        Some(bounds)
    }
}

impl EmValue {
    /// Apply a binary operation, `self` being the left (deeper) operand.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keyscope::emulation::{BinaryOp, EmValue};
    ///
    /// let sum = EmValue::u32(u32::MAX).binary_op(EmValue::u32(2), BinaryOp::Add);
    /// assert_eq!(sum, EmValue::u32(1));
    ///
    /// // anything AND 0 is 0
    /// assert_eq!(EmValue::Unknown.binary_op(EmValue::u32(0), BinaryOp::And), EmValue::u32(0));
    /// ```
    #[must_use]
    pub fn binary_op(self, right: EmValue, op: BinaryOp) -> EmValue {
        if op.is_shift() {
            return self.shift(right, op);
        }

        match (self, right) {
            (EmValue::I32(left), EmValue::I32(right)) => binary_i32(left, right, op),
            (EmValue::I32(left), EmValue::Unknown) => binary_i32(left, Int32Value::unknown(), op),
            (EmValue::Unknown, EmValue::I32(right)) => binary_i32(Int32Value::unknown(), right, op),
            (EmValue::I32(_) | EmValue::I64(_), EmValue::I32(_) | EmValue::I64(_)) => {
                match (self.widened(), right.widened()) {
                    (Some(left), Some(right)) => binary_i64(left, right, op),
                    _ => EmValue::Unknown,
                }
            }
            (EmValue::F64(left), EmValue::F64(right)) => binary_f64(left, right, op),
            _ => EmValue::Unknown,
        }
    }

    /// Apply `neg` or `not`.
    #[must_use]
    pub fn unary_op(self, op: UnaryOp) -> EmValue {
        match (self, op) {
            (EmValue::I32(value), UnaryOp::Neg) => EmValue::I32(value.neg()),
            (EmValue::I32(value), UnaryOp::Not) => EmValue::I32(value.not()),
            (EmValue::I64(value), UnaryOp::Neg) => EmValue::I64(value.wrapping_neg()),
            (EmValue::I64(value), UnaryOp::Not) => EmValue::I64(!value),
            (EmValue::F64(value), UnaryOp::Neg) => EmValue::F64(-value),
            _ => EmValue::Unknown,
        }
    }

    /// Compare `self` (left) with `right`, producing an `int32` 0 or 1.
    ///
    /// When the operands are not fully known the result is still an `int32` whose upper 31
    /// bits are known to be zero.
    #[must_use]
    pub fn compare(self, right: EmValue, op: CompareOp) -> EmValue {
        let outcome = match (self, right) {
            (EmValue::I32(left), EmValue::I32(right)) => match (left.as_i32(), right.as_i32()) {
                (Some(l), Some(r)) => Some(compare_i64(l.into(), r.into(), op)),
                // two known bits that differ settle equality
                _ if op == CompareOp::Eq
                    && (left.value() ^ right.value()) & left.valid_mask() & right.valid_mask()
                        != 0 =>
                {
                    Some(false)
                }
                _ => None,
            },
            (EmValue::I32(_) | EmValue::I64(_), EmValue::I32(_) | EmValue::I64(_)) => {
                match (self.widened(), right.widened()) {
                    (Some(l), Some(r)) => Some(compare_i64(l, r, op)),
                    _ => None,
                }
            }
            (EmValue::F64(left), EmValue::F64(right)) => Some(compare_f64(left, right, op)),
            _ => None,
        };

        match outcome {
            Some(result) => EmValue::u32(u32::from(result)),
            None => EmValue::I32(Int32Value::new(0, 0xFFFF_FFFE)),
        }
    }

    /// Convert the value as the matching `conv.*` instruction does.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keyscope::emulation::{ConversionType, EmValue};
    ///
    /// let float = EmValue::u32(0xFFFF_FFFF).convert(ConversionType::RUn);
    /// assert_eq!(float, EmValue::F64(4_294_967_295.0));
    /// assert_eq!(float.convert(ConversionType::U4), EmValue::u32(0xFFFF_FFFF));
    ///
    /// assert_eq!(EmValue::i32(200).convert(ConversionType::I1Ovf), EmValue::Unknown);
    /// ```
    #[must_use]
    pub fn convert(self, conv: ConversionType) -> EmValue {
        if let Some((target, min, max)) = conv.checked_bounds() {
            return self.convert_checked(conv.is_unsigned_source(), target, min, max);
        }

        match self {
            EmValue::I32(value) => convert_i32(value, conv),
            EmValue::I64(value) => convert_i64(value, conv),
            EmValue::F64(value) => convert_f64(value, conv),
            EmValue::Unknown => match conv {
                ConversionType::I1
                | ConversionType::I2
                | ConversionType::I4
                | ConversionType::U1
                | ConversionType::U2
                | ConversionType::U4 => convert_i32(Int32Value::unknown(), conv),
                _ => EmValue::Unknown,
            },
        }
    }

    fn shift(self, amount: EmValue, op: BinaryOp) -> EmValue {
        let amount = match amount {
            EmValue::I32(value) => value.as_u32(),
            EmValue::I64(value) => Some(value as u32),
            _ => None,
        };

        let value = match self {
            EmValue::I32(value) => value,
            EmValue::Unknown => Int32Value::unknown(),
            EmValue::I64(value) => {
                return match amount {
                    Some(amount) => EmValue::I64(shift_i64(value, amount & 63, op)),
                    None => EmValue::Unknown,
                };
            }
            EmValue::F64(_) => return EmValue::Unknown,
        };

        let Some(amount) = amount else {
            return EmValue::I32(Int32Value::unknown());
        };

        EmValue::I32(match op {
            BinaryOp::Shl => value.shl(amount),
            BinaryOp::Shr => value.shr(amount),
            _ => value.shr_un(amount),
        })
    }

    fn convert_checked(
        self,
        unsigned: bool,
        target: ConversionType,
        min: i128,
        max: i128,
    ) -> EmValue {
        let source = match self {
            EmValue::I32(value) => value.as_u32().map(|bits| {
                if unsigned {
                    i128::from(bits)
                } else {
                    i128::from(bits as i32)
                }
            }),
            EmValue::I64(value) if unsigned => Some(i128::from(value as u64)),
            EmValue::I64(value) => Some(i128::from(value)),
            EmValue::F64(value) if value.is_finite() => Some(value.trunc() as i128),
            _ => None,
        };

        match source {
            Some(source) if (min..=max).contains(&source) => match target {
                ConversionType::I8 | ConversionType::U8 => EmValue::I64(source as i64),
                _ => EmValue::u32(source as u32),
            },
            _ => EmValue::Unknown,
        }
    }

    /// Sign-extended 64-bit view of a fully known integer.
    fn widened(self) -> Option<i64> {
        match self {
            EmValue::I32(value) => value.as_i32().map(i64::from),
            EmValue::I64(value) => Some(value),
            _ => None,
        }
    }
}

fn binary_i32(left: Int32Value, right: Int32Value, op: BinaryOp) -> EmValue {
    match op {
        BinaryOp::Add => return EmValue::I32(left.add(right)),
        BinaryOp::Sub => return EmValue::I32(left.sub(right)),
        BinaryOp::Mul => return EmValue::I32(left.mul(right)),
        BinaryOp::And => return EmValue::I32(left.and(right)),
        BinaryOp::Or => return EmValue::I32(left.or(right)),
        BinaryOp::Xor => return EmValue::I32(left.xor(right)),
        _ => {}
    }

    let (Some(l), Some(r)) = (left.as_u32(), right.as_u32()) else {
        return EmValue::I32(Int32Value::unknown());
    };
    let (ls, rs) = (l as i32, r as i32);

    let result = match op {
        BinaryOp::Div => ls.checked_div(rs).map(|v| v as u32),
        BinaryOp::DivUn => l.checked_div(r),
        BinaryOp::Rem => ls.checked_rem(rs).map(|v| v as u32),
        BinaryOp::RemUn => l.checked_rem(r),
        BinaryOp::AddOvf => ls.checked_add(rs).map(|v| v as u32),
        BinaryOp::AddOvfUn => l.checked_add(r),
        BinaryOp::SubOvf => ls.checked_sub(rs).map(|v| v as u32),
        BinaryOp::SubOvfUn => l.checked_sub(r),
        BinaryOp::MulOvf => ls.checked_mul(rs).map(|v| v as u32),
        BinaryOp::MulOvfUn => l.checked_mul(r),
        _ => None,
    };

    result.map_or(EmValue::Unknown, EmValue::u32)
}

fn binary_i64(left: i64, right: i64, op: BinaryOp) -> EmValue {
    let (lu, ru) = (left as u64, right as u64);

    let result = match op {
        BinaryOp::Add => Some(left.wrapping_add(right)),
        BinaryOp::Sub => Some(left.wrapping_sub(right)),
        BinaryOp::Mul => Some(left.wrapping_mul(right)),
        BinaryOp::And => Some(left & right),
        BinaryOp::Or => Some(left | right),
        BinaryOp::Xor => Some(left ^ right),
        BinaryOp::Div => left.checked_div(right),
        BinaryOp::DivUn => lu.checked_div(ru).map(|v| v as i64),
        BinaryOp::Rem => left.checked_rem(right),
        BinaryOp::RemUn => lu.checked_rem(ru).map(|v| v as i64),
        BinaryOp::AddOvf => left.checked_add(right),
        BinaryOp::AddOvfUn => lu.checked_add(ru).map(|v| v as i64),
        BinaryOp::SubOvf => left.checked_sub(right),
        BinaryOp::SubOvfUn => lu.checked_sub(ru).map(|v| v as i64),
        BinaryOp::MulOvf => left.checked_mul(right),
        BinaryOp::MulOvfUn => lu.checked_mul(ru).map(|v| v as i64),
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::ShrUn => None,
    };

    result.map_or(EmValue::Unknown, EmValue::I64)
}

fn binary_f64(left: f64, right: f64, op: BinaryOp) -> EmValue {
    match op {
        BinaryOp::Add => EmValue::F64(left + right),
        BinaryOp::Sub => EmValue::F64(left - right),
        BinaryOp::Mul => EmValue::F64(left * right),
        BinaryOp::Div => EmValue::F64(left / right),
        BinaryOp::Rem => EmValue::F64(left % right),
        _ => EmValue::Unknown,
    }
}

fn shift_i64(value: i64, amount: u32, op: BinaryOp) -> i64 {
    match op {
        BinaryOp::Shl => value.wrapping_shl(amount),
        BinaryOp::Shr => value.wrapping_shr(amount),
        _ => (value as u64).wrapping_shr(amount) as i64,
    }
}

fn compare_i64(left: i64, right: i64, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq => left == right,
        CompareOp::Gt => left > right,
        CompareOp::GtUn => (left as u64) > (right as u64),
        CompareOp::Lt => left < right,
        CompareOp::LtUn => (left as u64) < (right as u64),
    }
}

#[allow(clippy::neg_cmp_op_on_partial_ord)]
fn compare_f64(left: f64, right: f64, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq => left == right,
        CompareOp::Gt => left > right,
        CompareOp::GtUn => !(left <= right),
        CompareOp::Lt => left < right,
        CompareOp::LtUn => !(left >= right),
    }
}

fn convert_i32(value: Int32Value, conv: ConversionType) -> EmValue {
    match conv {
        ConversionType::I1 => EmValue::I32(value.sign_extend(8)),
        ConversionType::U1 => EmValue::I32(value.zero_extend(8)),
        ConversionType::I2 => EmValue::I32(value.sign_extend(16)),
        ConversionType::U2 => EmValue::I32(value.zero_extend(16)),
        ConversionType::I4 | ConversionType::U4 => EmValue::I32(value),
        ConversionType::I8 | ConversionType::I => {
            value.as_i32().map_or(EmValue::Unknown, |v| EmValue::I64(v.into()))
        }
        ConversionType::U8 | ConversionType::U => {
            value.as_u32().map_or(EmValue::Unknown, |v| EmValue::I64(v.into()))
        }
        ConversionType::R4 => value
            .as_i32()
            .map_or(EmValue::Unknown, |v| EmValue::F64(f64::from(v as f32))),
        ConversionType::R8 => value
            .as_i32()
            .map_or(EmValue::Unknown, |v| EmValue::F64(v.into())),
        ConversionType::RUn => value
            .as_u32()
            .map_or(EmValue::Unknown, |v| EmValue::F64(v.into())),
        _ => EmValue::Unknown,
    }
}

fn convert_i64(value: i64, conv: ConversionType) -> EmValue {
    match conv {
        ConversionType::I8 | ConversionType::U8 | ConversionType::I | ConversionType::U => {
            EmValue::I64(value)
        }
        ConversionType::R4 => EmValue::F64(f64::from(value as f32)),
        ConversionType::R8 => EmValue::F64(value as f64),
        ConversionType::RUn => EmValue::F64(value as u64 as f64),
        _ => convert_i32(Int32Value::concrete(value as u32), conv),
    }
}

fn convert_f64(value: f64, conv: ConversionType) -> EmValue {
    match conv {
        ConversionType::I1 | ConversionType::I2 | ConversionType::I4 => {
            convert_i32(Int32Value::from_i32(f64_to_i32(value)), conv)
        }
        ConversionType::U1 | ConversionType::U2 | ConversionType::U4 => {
            convert_i32(Int32Value::concrete(f64_to_u32(value)), conv)
        }
        ConversionType::I8 | ConversionType::I => EmValue::I64(f64_to_i64(value)),
        ConversionType::U8 | ConversionType::U => EmValue::I64(f64_to_u64(value) as i64),
        ConversionType::R4 => EmValue::F64(f64::from(value as f32)),
        ConversionType::R8 | ConversionType::RUn => EmValue::F64(value),
        _ => EmValue::Unknown,
    }
}

const I64_RANGE_START: f64 = -9_223_372_036_854_775_808.0;
const I64_RANGE_END: f64 = 9_223_372_036_854_775_808.0;

fn f64_to_i32(value: f64) -> i32 {
    if value > -2_147_483_649.0 && value < 2_147_483_648.0 {
        value as i32
    } else {
        i32::MIN
    }
}

fn f64_to_u32(value: f64) -> u32 {
    if value > -1.0 && value < 4_294_967_296.0 {
        value as u32
    } else if (I64_RANGE_START..I64_RANGE_END).contains(&value) {
        value as i64 as u32
    } else {
        0
    }
}

fn f64_to_i64(value: f64) -> i64 {
    if (I64_RANGE_START..I64_RANGE_END).contains(&value) {
        value as i64
    } else {
        i64::MIN
    }
}

fn f64_to_u64(value: f64) -> u64 {
    if value > -1.0 && value < 18_446_744_073_709_551_616.0 {
        value as u64
    } else if (I64_RANGE_START..I64_RANGE_END).contains(&value) {
        value as i64 as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int32_arithmetic_wraps() {
        assert_eq!(
            EmValue::i32(i32::MAX).binary_op(EmValue::i32(1), BinaryOp::Add),
            EmValue::i32(i32::MIN)
        );
        assert_eq!(
            EmValue::i32(-7).binary_op(EmValue::i32(2), BinaryOp::Div),
            EmValue::i32(-3)
        );
        assert_eq!(
            EmValue::u32(0xFFFF_FFF9).binary_op(EmValue::u32(2), BinaryOp::DivUn),
            EmValue::u32(0x7FFF_FFFC)
        );
        assert_eq!(
            EmValue::i32(-7).binary_op(EmValue::i32(2), BinaryOp::Rem),
            EmValue::i32(-1)
        );
    }

    #[test]
    fn int32_faults_are_unknown() {
        assert_eq!(
            EmValue::i32(1).binary_op(EmValue::i32(0), BinaryOp::Div),
            EmValue::Unknown
        );
        assert_eq!(
            EmValue::i32(i32::MIN).binary_op(EmValue::i32(-1), BinaryOp::Div),
            EmValue::Unknown
        );
        assert_eq!(
            EmValue::i32(i32::MAX).binary_op(EmValue::i32(1), BinaryOp::AddOvf),
            EmValue::Unknown
        );
        assert_eq!(
            EmValue::i32(i32::MAX).binary_op(EmValue::i32(1), BinaryOp::AddOvfUn),
            EmValue::u32(0x8000_0000)
        );
    }

    #[test]
    fn unknown_meets_int32() {
        let ored = EmValue::Unknown.binary_op(EmValue::u32(0xFFFF_FFFF), BinaryOp::Or);
        assert_eq!(ored, EmValue::u32(0xFFFF_FFFF));

        let added = EmValue::Unknown.binary_op(EmValue::u32(1), BinaryOp::Add);
        assert!(matches!(added, EmValue::I32(v) if v.valid_mask() == 0));

        assert_eq!(
            EmValue::Unknown.binary_op(EmValue::I64(1), BinaryOp::Add),
            EmValue::Unknown
        );
    }

    #[test]
    fn mixed_widths_widen() {
        assert_eq!(
            EmValue::i32(-1).binary_op(EmValue::I64(2), BinaryOp::Add),
            EmValue::I64(1)
        );
        assert_eq!(
            EmValue::I64(-1).binary_op(EmValue::I64(1), BinaryOp::AddOvfUn),
            EmValue::Unknown
        );
        assert_eq!(
            EmValue::F64(1.5).binary_op(EmValue::i32(1), BinaryOp::Add),
            EmValue::Unknown
        );
        assert_eq!(
            EmValue::F64(7.5).binary_op(EmValue::F64(2.0), BinaryOp::Rem),
            EmValue::F64(1.5)
        );
    }

    #[test]
    fn shifts() {
        assert_eq!(
            EmValue::u32(0x8000_0000).binary_op(EmValue::i32(31), BinaryOp::Shr),
            EmValue::u32(0xFFFF_FFFF)
        );
        assert_eq!(
            EmValue::u32(0x8000_0000).binary_op(EmValue::i32(31), BinaryOp::ShrUn),
            EmValue::u32(1)
        );
        assert_eq!(
            EmValue::I64(1).binary_op(EmValue::i32(65), BinaryOp::Shl),
            EmValue::I64(2)
        );
        assert_eq!(
            EmValue::u32(1).binary_op(EmValue::Unknown, BinaryOp::Shl),
            EmValue::I32(Int32Value::unknown())
        );
    }

    #[test]
    fn unary() {
        assert_eq!(EmValue::i32(5).unary_op(UnaryOp::Neg), EmValue::i32(-5));
        assert_eq!(EmValue::I64(0).unary_op(UnaryOp::Not), EmValue::I64(-1));
        assert_eq!(EmValue::F64(2.0).unary_op(UnaryOp::Neg), EmValue::F64(-2.0));
        assert_eq!(EmValue::F64(2.0).unary_op(UnaryOp::Not), EmValue::Unknown);
    }

    #[test]
    fn comparisons() {
        assert_eq!(EmValue::i32(-1).compare(EmValue::i32(1), CompareOp::Lt), EmValue::u32(1));
        assert_eq!(EmValue::i32(-1).compare(EmValue::i32(1), CompareOp::LtUn), EmValue::u32(0));
        assert_eq!(EmValue::I64(3).compare(EmValue::i32(3), CompareOp::Eq), EmValue::u32(1));
        assert_eq!(
            EmValue::F64(f64::NAN).compare(EmValue::F64(1.0), CompareOp::GtUn),
            EmValue::u32(1)
        );
        assert_eq!(
            EmValue::F64(f64::NAN).compare(EmValue::F64(1.0), CompareOp::Gt),
            EmValue::u32(0)
        );

        let unknown = EmValue::Unknown.compare(EmValue::i32(1), CompareOp::Eq);
        assert_eq!(unknown, EmValue::I32(Int32Value::new(0, 0xFFFF_FFFE)));

        // low bit known to differ
        let odd = EmValue::I32(Int32Value::new(1, 1));
        assert_eq!(odd.compare(EmValue::i32(2), CompareOp::Eq), EmValue::u32(0));
    }

    #[test]
    fn integer_conversions() {
        assert_eq!(EmValue::u32(0x1234_5680).convert(ConversionType::I1), EmValue::i32(-128));
        assert_eq!(EmValue::u32(0x1234_5680).convert(ConversionType::U2), EmValue::u32(0x5680));
        assert_eq!(EmValue::i32(-2).convert(ConversionType::U8), EmValue::I64(0xFFFF_FFFE));
        assert_eq!(EmValue::i32(-2).convert(ConversionType::I), EmValue::I64(-2));
        assert_eq!(
            EmValue::I64(0x1_0000_00FF).convert(ConversionType::U1),
            EmValue::u32(0xFF)
        );

        let byte = EmValue::Unknown.convert(ConversionType::U1);
        assert!(matches!(byte, EmValue::I32(v) if v.valid_mask() == 0xFFFF_FF00));
        assert_eq!(EmValue::Unknown.convert(ConversionType::I8), EmValue::Unknown);
    }

    #[test]
    fn float_conversions() {
        assert_eq!(EmValue::i32(-1).convert(ConversionType::R8), EmValue::F64(-1.0));
        assert_eq!(
            EmValue::i32(-1).convert(ConversionType::RUn),
            EmValue::F64(4_294_967_295.0)
        );
        assert_eq!(EmValue::F64(-1.9).convert(ConversionType::I4), EmValue::i32(-1));
        assert_eq!(EmValue::F64(-0.5).convert(ConversionType::U4), EmValue::u32(0));
        assert_eq!(EmValue::F64(-2.0).convert(ConversionType::U4), EmValue::u32(0xFFFF_FFFE));
        assert_eq!(EmValue::F64(1e20).convert(ConversionType::I4), EmValue::i32(i32::MIN));
        assert_eq!(EmValue::F64(1e20).convert(ConversionType::U4), EmValue::u32(0));
        assert_eq!(EmValue::F64(f64::NAN).convert(ConversionType::I8), EmValue::I64(i64::MIN));
        assert_eq!(
            EmValue::F64(4_294_967_296.5).convert(ConversionType::U8),
            EmValue::I64(4_294_967_296)
        );
    }

    #[test]
    fn checked_conversions() {
        assert_eq!(EmValue::i32(127).convert(ConversionType::I1Ovf), EmValue::i32(127));
        assert_eq!(EmValue::i32(-1).convert(ConversionType::U4Ovf), EmValue::Unknown);
        assert_eq!(
            EmValue::i32(-1).convert(ConversionType::U4OvfUn),
            EmValue::u32(0xFFFF_FFFF)
        );
        assert_eq!(EmValue::i32(-1).convert(ConversionType::I4OvfUn), EmValue::Unknown);
        assert_eq!(EmValue::F64(255.9).convert(ConversionType::U1Ovf), EmValue::u32(255));
        assert_eq!(EmValue::F64(f64::INFINITY).convert(ConversionType::I8Ovf), EmValue::Unknown);
        assert_eq!(
            EmValue::I64(-1).convert(ConversionType::UOvfUn),
            EmValue::I64(-1)
        );
        assert!(ConversionType::U8OvfUn.is_checked());
        assert!(!ConversionType::RUn.is_checked());
    }

    #[test]
    fn mnemonics() {
        assert_eq!(BinaryOp::ShrUn.to_string(), "shr.un");
        assert_eq!(CompareOp::GtUn.to_string(), "cgt.un");
        assert_eq!(ConversionType::U4OvfUn.to_string(), "conv.ovf.u4.un");
    }
}
