#![forbid(unsafe_code)]

//! Loose numeric conversions for pulses that cross type boundaries.
//!
//! Rules, applied in order:
//! 1. Non-finite floats (`NaN`, `±inf`) never convert.
//! 2. Negative values headed for an unsigned type convert by magnitude.
//! 3. Floats headed for an integer type are truncated toward zero.
//! 4. Anything still out of the target's range fails.

use std::fmt::Display;

use num_traits::{Bounded, NumCast, One, ToPrimitive, Zero};

use crate::channel::Channel;
use crate::error::{RelayError, Result};

/// Convert `value` to `U` under the rules above.
pub fn coerce<T, U>(value: T) -> Result<U>
where
    T: ToPrimitive + Copy + Display,
    U: NumCast + Bounded + Zero + PartialOrd,
{
    let failure = || RelayError::NumericCoercion {
        value: value.to_string(),
        target: std::any::type_name::<U>(),
    };

    let approx = value.to_f64().ok_or_else(failure)?;
    if !approx.is_finite() {
        return Err(failure());
    }

    let unsigned_target = U::min_value() >= U::zero();
    let converted = if unsigned_target && approx < 0.0 {
        // Truncation and magnitude commute, so the integer path also covers
        // float sources that fit in i128.
        value.to_i128().map_or_else(
            || <U as NumCast>::from(approx.abs()),
            |int| <U as NumCast>::from(int.unsigned_abs()),
        )
    } else {
        <U as NumCast>::from(value)
    };
    converted.ok_or_else(failure)
}

/// Non-zero is `true`.
pub fn truthy<T: Zero>(value: T) -> bool {
    !value.is_zero()
}

/// `true` is one, `false` is zero.
pub fn from_bool<U: Zero + One>(flag: bool) -> U {
    if flag { U::one() } else { U::zero() }
}

impl<S, P> Channel<S, P>
where
    P: ToPrimitive + Copy + Display + Send + 'static,
{
    /// Convert every numeric pulse with [`coerce`]. Failures travel as `Err`
    /// pulses.
    pub fn coerce<U>(self) -> Channel<S, Result<U>>
    where
        U: NumCast + Bounded + Zero + PartialOrd + Send + 'static,
    {
        self.map(coerce::<P, U>)
    }
}

impl<S, P: Zero + Send + 'static> Channel<S, P> {
    /// Map numeric pulses to booleans with [`truthy`].
    pub fn truthy(self) -> Channel<S, bool> {
        self.map(truthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::tests::collect;
    use proptest::prelude::*;

    #[test]
    fn signed_to_unsigned_takes_magnitude() {
        assert_eq!(coerce::<i32, u8>(-5), Ok(5));
        assert_eq!(coerce::<i64, u64>(i64::MIN), Ok(i64::MIN.unsigned_abs()));
    }

    #[test]
    fn floats_truncate_toward_zero() {
        assert_eq!(coerce::<f64, i32>(2.9), Ok(2));
        assert_eq!(coerce::<f64, i32>(-2.9), Ok(-2));
        assert_eq!(coerce::<f32, u16>(-7.5), Ok(7));
    }

    #[test]
    fn non_finite_floats_fail() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = coerce::<f64, f32>(bad).unwrap_err();
            assert!(matches!(err, RelayError::NumericCoercion { target: "f32", .. }));
        }
    }

    #[test]
    fn out_of_range_fails_with_value_in_message() {
        let err = coerce::<i32, u8>(300).unwrap_err();
        assert_eq!(err.to_string(), "value 300 cannot be represented as u8");
    }

    #[test]
    fn truthiness() {
        assert!(truthy(3));
        assert!(truthy(-0.5));
        assert!(!truthy(0u8));
        assert_eq!(from_bool::<i16>(true), 1);
        assert_eq!(from_bool::<f64>(false), 0.0);
    }

    #[test]
    fn channel_coerce_keeps_stream_alive() {
        let ch = Channel::of([1.5f64, f64::NAN, -3.0]).coerce::<u32>();
        let (_r, log) = collect(&ch.map(|r| r.ok()));
        assert_eq!(*log.lock(), vec![Some(1), None, Some(3)]);
        let (_r, flags) = collect(&Channel::of([0, 2]).truthy());
        assert_eq!(*flags.lock(), vec![false, true]);
    }

    proptest! {
        #[test]
        fn widening_is_lossless(v in any::<i32>()) {
            prop_assert_eq!(coerce::<i32, i64>(v), Ok(<i64 as From<i32>>::from(v)));
        }

        #[test]
        fn unsigned_target_matches_unsigned_abs(v in any::<i16>()) {
            prop_assert_eq!(coerce::<i16, u32>(v), Ok(<u32 as From<u16>>::from(v.unsigned_abs())));
        }
    }
}
