//! Normalized-integer conversion.
//!
//! Unsigned components map `[0, MAX]` onto `[0.0, 1.0]`. Signed components
//! map `[MIN, MAX]` onto `[-1.0, 1.0]`; `MIN` has no positive counterpart, so
//! it is pinned to exactly `-1.0` instead of `MIN / MAX`.

use num_traits::{AsPrimitive, Bounded, PrimInt, Signed, Unsigned};

/// An integer component that can be read as a normalized float.
pub trait NormalizedInt: PrimInt + AsPrimitive<f32> {
    fn to_normalized(self) -> f32;
}

/// `v / MAX` for unsigned integers.
pub fn normalize_unsigned<T>(v: T) -> f32
where
    T: PrimInt + Unsigned + Bounded + AsPrimitive<f32>,
{
    let max: f32 = T::max_value().as_();
    v.as_() / max
}

/// `v / MAX` for signed integers, with `MIN` pinned to `-1.0`.
pub fn normalize_signed<T>(v: T) -> f32
where
    T: PrimInt + Signed + Bounded + AsPrimitive<f32>,
{
    if v == T::min_value() {
        return -1.0;
    }
    let max: f32 = T::max_value().as_();
    v.as_() / max
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl NormalizedInt for $t {
            fn to_normalized(self) -> f32 {
                normalize_unsigned(self)
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl NormalizedInt for $t {
            fn to_normalized(self) -> f32 {
                normalize_signed(self)
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32);
impl_signed!(i8, i16);
