//! Exact arithmetic for the render model.
//!
//! Glyph areas, drawing areas and durations are rationals so a snapshot that
//! sits exactly on a budget compares equal to it. `f64` is only used to print
//! values.

use std::fmt;

use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, Zero};

use crate::error::{HrmError, Result};

pub type Rational = Ratio<i128>;

/// Decimal digits kept after the point. Finer values are truncated.
const MAX_FRACTION_DIGITS: usize = 9;

/// Parse `"6.5"`, `"-1"`, `".25"` or `"3/5"` exactly.
pub fn parse_rational(s: &str) -> Option<Rational> {
    let s = s.trim();

    if let Some((num, den)) = s.split_once('/') {
        let num: i128 = num.trim().parse().ok()?;
        let den: i128 = den.trim().parse().ok()?;
        if den == 0 {
            return None;
        }
        return Some(Rational::new(num, den));
    }

    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let frac = &frac[..frac.len().min(MAX_FRACTION_DIGITS)];

    let scale = 10i128.pow(frac.len() as u32);
    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i128 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
    let numer = whole.checked_mul(scale)?.checked_add(frac)?;

    Some(Rational::new(if negative { -numer } else { numer }, scale))
}

pub fn as_f64(value: Rational) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

fn overflow(what: &'static str) -> HrmError {
    HrmError::ArithmeticOverflow(what)
}

pub fn checked_add(a: Rational, b: Rational, what: &'static str) -> Result<Rational> {
    a.checked_add(&b).ok_or_else(|| overflow(what))
}

pub fn checked_sub(a: Rational, b: Rational, what: &'static str) -> Result<Rational> {
    a.checked_sub(&b).ok_or_else(|| overflow(what))
}

pub fn checked_mul(a: Rational, b: Rational, what: &'static str) -> Result<Rational> {
    a.checked_mul(&b).ok_or_else(|| overflow(what))
}

pub fn checked_div(a: Rational, b: Rational, what: &'static str) -> Result<Rational> {
    if b.is_zero() {
        return Err(overflow(what));
    }
    a.checked_div(&b).ok_or_else(|| overflow(what))
}

/// `serde` helpers for rational fields: JSON numbers or strings such as
/// `"3/5"` in, plain numbers out.
pub mod serde_rational {
    use super::*;
    use serde::de::{Error, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Rational, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_f64(as_f64(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Rational, D::Error> {
        struct RationalVisitor;

        impl Visitor<'_> for RationalVisitor {
            type Value = Rational;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a ratio such as \"3/5\"")
            }

            fn visit_u64<E: Error>(self, v: u64) -> std::result::Result<Rational, E> {
                Ok(Rational::from_integer(i128::from(v)))
            }

            fn visit_i64<E: Error>(self, v: i64) -> std::result::Result<Rational, E> {
                Ok(Rational::from_integer(i128::from(v)))
            }

            fn visit_f64<E: Error>(self, v: f64) -> std::result::Result<Rational, E> {
                // The shortest decimal form, so 0.6 becomes exactly 3/5.
                self.visit_str(&v.to_string())
            }

            fn visit_str<E: Error>(self, v: &str) -> std::result::Result<Rational, E> {
                parse_rational(v).ok_or_else(|| E::custom(format!("invalid number {v:?}")))
            }
        }

        d.deserialize_any(RationalVisitor)
    }
}
