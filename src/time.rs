//! Fixed-point media time.
//!
//! Snapshot times, document intervals and the stitching tolerance are all
//! expressed as [`Time`], a whole number of flicks. Comparisons and sums are
//! exact, so interval stitching over a long stream of documents never drifts.
//! Arithmetic is checked: times near the ends of the range are valid, but
//! distances between them may not be representable.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{HrmError, Result};
use crate::number::Rational;

/// Ticks per second. Divisible by every common frame rate and by 1000.
pub const FLICKS_PER_SECOND: i64 = 705_600_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(i64);

impl Time {
    pub const ZERO: Time = Time(0);

    pub const fn from_flicks(flicks: i64) -> Self {
        Time(flicks)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Time(secs * FLICKS_PER_SECOND)
    }

    /// `num / den` seconds, rounded to the nearest flick.
    ///
    /// Returns `None` when `den` is zero or the result does not fit.
    pub fn from_ratio(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let scaled = i128::from(num) * i128::from(FLICKS_PER_SECOND);
        let den = i128::from(den);
        let half = den.abs() / 2;
        let rounded = if (scaled < 0) == (den < 0) {
            (scaled.abs() + half) / den.abs()
        } else {
            -((scaled.abs() + half) / den.abs())
        };
        i64::try_from(rounded).ok().map(Time)
    }

    pub const fn flicks(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / FLICKS_PER_SECOND as f64
    }

    /// Exact number of seconds.
    pub fn as_secs_rational(self) -> Rational {
        Rational::new(i128::from(self.0), i128::from(FLICKS_PER_SECOND))
    }

    pub fn checked_add(self, rhs: Time) -> Option<Time> {
        self.0.checked_add(rhs.0).map(Time)
    }

    pub fn checked_sub(self, rhs: Time) -> Option<Time> {
        self.0.checked_sub(rhs.0).map(Time)
    }

    /// Signed distance from `earlier` to `self`.
    pub fn since(self, earlier: Time) -> Result<Time> {
        self.checked_sub(earlier)
            .ok_or_else(|| HrmError::TimeOverflow(format!("{self} - {earlier}")))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.as_secs_f64())
    }
}

/// Parse `"1.5"`, `"1.5s"`, `"-2"` or `"1/10"` (seconds).
///
/// Decimal literals are converted digit by digit so `"0.1"` lands on an exact
/// flick count instead of going through binary floating point.
impl FromStr for Time {
    type Err = HrmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || HrmError::InvalidTime(s.to_string());
        let literal = s.trim();
        let literal = literal.strip_suffix('s').unwrap_or(literal).trim_end();

        if let Some((num, den)) = literal.split_once('/') {
            let num: i64 = num.trim().parse().map_err(|_| invalid())?;
            let den: i64 = den.trim().parse().map_err(|_| invalid())?;
            return Time::from_ratio(num, den).ok_or_else(invalid);
        }

        let (negative, digits) = match literal.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, literal),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        // Cap precision at 18 fractional digits; anything finer is far below a flick.
        let frac = &frac[..frac.len().min(18)];
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_num: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| invalid())?
        };
        let frac_den = 10i64.pow(frac.len() as u32);

        let whole = whole.checked_mul(FLICKS_PER_SECOND).ok_or_else(invalid)?;
        let frac = Time::from_ratio(frac_num, frac_den).ok_or_else(invalid)?;
        let total = whole.checked_add(frac.0).ok_or_else(invalid)?;
        Ok(Time(if negative { -total } else { total }))
    }
}

/// Accepts a JSON number of seconds or a string understood by [`Time::from_str`].
impl<'de> Deserialize<'de> for Time {
    fn deserialize<D>(d: D) -> std::result::Result<Time, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};

        struct TimeVisitor;

        impl Visitor<'_> for TimeVisitor {
            type Value = Time;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number of seconds or a time string such as \"1.5s\" or \"1/10\"")
            }

            fn visit_u64<E: Error>(self, v: u64) -> std::result::Result<Time, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(FLICKS_PER_SECOND))
                    .map(Time)
                    .ok_or_else(|| E::custom(format!("time out of range: {v}")))
            }

            fn visit_i64<E: Error>(self, v: i64) -> std::result::Result<Time, E> {
                v.checked_mul(FLICKS_PER_SECOND)
                    .map(Time)
                    .ok_or_else(|| E::custom(format!("time out of range: {v}")))
            }

            fn visit_f64<E: Error>(self, v: f64) -> std::result::Result<Time, E> {
                // Go through the shortest decimal form so 0.1 parses as exactly 0.1 s.
                v.to_string().parse().map_err(E::custom)
            }

            fn visit_str<E: Error>(self, v: &str) -> std::result::Result<Time, E> {
                v.parse().map_err(E::custom)
            }
        }

        d.deserialize_any(TimeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_and_rational_literals_agree() {
        let a: Time = "0.1".parse().unwrap();
        let b: Time = "1/10".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.flicks(), FLICKS_PER_SECOND / 10);
    }

    #[test]
    fn suffix_and_sign_are_accepted() {
        assert_eq!("2s".parse::<Time>().unwrap(), Time::from_secs(2));
        assert_eq!("-1.5".parse::<Time>().unwrap(), Time::from_ratio(-3, 2).unwrap());
        assert_eq!(".5".parse::<Time>().unwrap(), Time::from_ratio(1, 2).unwrap());
    }

    #[test]
    fn malformed_literals_are_rejected() {
        for bad in ["", "abc", "1/0", "1.2.3", "--1", "."] {
            assert!(bad.parse::<Time>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn frame_rates_are_exact() {
        for fps in [24, 25, 30, 48, 50, 60, 90, 100, 120] {
            let frame = Time::from_ratio(1, fps).unwrap();
            assert_eq!(frame.flicks() * fps, FLICKS_PER_SECOND);
        }
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let times: Vec<Time> = serde_json::from_str(r#"[0, 6, 0.5, "1/10", "3s"]"#).unwrap();
        assert_eq!(
            times,
            vec![
                Time::ZERO,
                Time::from_secs(6),
                Time::from_ratio(1, 2).unwrap(),
                Time::from_ratio(1, 10).unwrap(),
                Time::from_secs(3),
            ]
        );
    }

    #[test]
    fn displays_three_decimals() {
        assert_eq!(Time::from_ratio(1, 3).unwrap().to_string(), "0.333");
    }

    #[test]
    fn distances_that_do_not_fit_are_errors() {
        let late: Time = "9000000000".parse().unwrap();
        let early: Time = "-9000000000".parse().unwrap();
        assert!(matches!(late.since(early), Err(HrmError::TimeOverflow(_))));
        assert_eq!(late.since(late).unwrap(), Time::ZERO);
        assert_eq!(early.since(late).ok(), None);
        assert_eq!(Time::from_flicks(i64::MAX).checked_add(Time::from_flicks(1)), None);
    }

    #[test]
    fn rational_seconds_are_exact() {
        assert_eq!(Time::from_ratio(1, 10).unwrap().as_secs_rational(), Rational::new(1, 10));
        assert_eq!(Time::from_secs(-3).as_secs_rational(), Rational::from_integer(-3));
    }
}
