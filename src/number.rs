//! Arbitrary-precision decimals and the IEEE-754 precision policy.
//!
//! Every JSON number emitted by the engine must round-trip exactly through an
//! IEEE-754 double, because the primary JSON consumers (JavaScript runtimes)
//! treat all numbers as doubles. Values that cannot satisfy this are emitted
//! as quoted strings instead of bare literals, and readers accept either form
//! for a numeric target field.
//!
//! The policy:
//!
//! - an integral value is safe iff it lies within ±(2^53 − 1)
//! - a decimal is safe iff the minimal bit-length of its unscaled magnitude
//!   is ≤ 53, the bit-length of its integer part is ≤ 53, and its decimal
//!   scale lies in [-1022, 1023]
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::BigDecimal;
//!
//! let safe: BigDecimal = "0.1000000000000001".parse().unwrap();
//! assert!(safe.is_ieee754());
//!
//! let unsafe_d: BigDecimal = "0.10000000000000001".parse().unwrap();
//! assert!(!unsafe_d.is_ieee754());
//! ```

use crate::{Error, Result};
use num_bigint::BigInt;
use std::fmt;
use std::str::FromStr;

/// Largest integer exactly representable as an IEEE-754 double: 2^53 − 1.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Smallest integer exactly representable as an IEEE-754 double: −(2^53 − 1).
pub const MIN_SAFE_INTEGER: i64 = -9_007_199_254_740_991;

// Max bit length for unscaled values and integer parts.
const MAX_BIT_LENGTH: u64 = 53;

// Double-precision exponent range, see exponent bias.
const MIN_SCALE: i64 = -1022;
const MAX_SCALE: i64 = 1023;

/// Returns `true` if `v` survives conversion to a double without precision loss.
#[inline]
#[must_use]
pub fn is_safe_i64(v: i64) -> bool {
    (MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&v)
}

/// Returns `true` if `v` survives conversion to a double without precision loss.
#[must_use]
pub fn is_safe_big_int(v: &BigInt) -> bool {
    *v >= BigInt::from(MIN_SAFE_INTEGER) && *v <= BigInt::from(MAX_SAFE_INTEGER)
}

/// An arbitrary-precision decimal: `unscaled × 10^(−scale)`.
///
/// The scale counts digits to the right of the decimal point and may be
/// negative. Equality is numeric: `1000` equals `1e3` regardless of how the
/// value was constructed.
///
/// # Examples
///
/// ```rust
/// use jsonbind::BigDecimal;
///
/// let d: BigDecimal = "10.25".parse().unwrap();
/// assert_eq!(d.scale(), 2);
/// assert_eq!(d.to_string(), "10.25");
///
/// let e: BigDecimal = "1.025e1".parse().unwrap();
/// assert_eq!(d, e);
/// ```
#[derive(Debug, Clone)]
pub struct BigDecimal {
    unscaled: BigInt,
    scale: i64,
}

impl BigDecimal {
    /// Creates a decimal from an unscaled value and a scale.
    #[must_use]
    pub fn new(unscaled: BigInt, scale: i64) -> Self {
        BigDecimal { unscaled, scale }
    }

    /// The unscaled magnitude (all significant digits as an integer).
    #[must_use]
    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    /// Number of digits right of the decimal point; may be negative.
    #[must_use]
    pub fn scale(&self) -> i64 {
        self.scale
    }

    /// Returns an equal decimal with trailing zero digits removed from the
    /// unscaled value (the minimal representation).
    #[must_use]
    pub fn strip_trailing_zeros(&self) -> BigDecimal {
        let zero = BigInt::from(0);
        if self.unscaled == zero {
            return BigDecimal::new(zero, 0);
        }
        let ten = BigInt::from(10);
        let mut unscaled = self.unscaled.clone();
        let mut scale = self.scale;
        while (&unscaled % &ten) == zero {
            unscaled = &unscaled / &ten;
            scale -= 1;
        }
        BigDecimal { unscaled, scale }
    }

    /// The non-fractional part of the value, truncated toward zero.
    #[must_use]
    pub fn integer_part(&self) -> BigInt {
        if self.scale <= 0 {
            &self.unscaled * pow10((-self.scale) as u64)
        } else {
            &self.unscaled / pow10(self.scale as u64)
        }
    }

    /// Checks whether this value round-trips exactly through a double
    /// precision IEEE-754 number.
    ///
    /// Safe iff the minimal bit-length of the unscaled magnitude is ≤ 53,
    /// the bit-length of the integer part is ≤ 53, and the scale lies within
    /// the double exponent range [-1022, 1023].
    #[must_use]
    pub fn is_ieee754(&self) -> bool {
        let d = self.strip_trailing_zeros();
        if d.unscaled.magnitude().bits() > MAX_BIT_LENGTH {
            return false;
        }
        if d.integer_part().magnitude().bits() > MAX_BIT_LENGTH {
            return false;
        }
        (MIN_SCALE..=MAX_SCALE).contains(&d.scale)
    }

    /// Lossy conversion to `f64`, used when the caller's target is a double.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        // Round-trips through the canonical decimal text; the standard
        // library parser rounds correctly to nearest.
        self.to_string().parse::<f64>().unwrap_or(f64::NAN)
    }

    /// Returns the value as an `i64` if it is integral and in range.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        let d = self.strip_trailing_zeros();
        if d.scale > 0 {
            return None;
        }
        i64::try_from(d.integer_part()).ok()
    }

    /// Returns the value as a `BigInt` if it is integral.
    #[must_use]
    pub fn to_big_int(&self) -> Option<BigInt> {
        let d = self.strip_trailing_zeros();
        if d.scale > 0 {
            return None;
        }
        Some(d.integer_part())
    }
}

fn pow10(n: u64) -> BigInt {
    let mut result = BigInt::from(1);
    let ten = BigInt::from(10);
    for _ in 0..n {
        result *= &ten;
    }
    result
}

impl From<i64> for BigDecimal {
    fn from(value: i64) -> Self {
        BigDecimal::new(BigInt::from(value), 0)
    }
}

impl From<BigInt> for BigDecimal {
    fn from(value: BigInt) -> Self {
        BigDecimal::new(value, 0)
    }
}

impl PartialEq for BigDecimal {
    fn eq(&self, other: &Self) -> bool {
        let a = self.strip_trailing_zeros();
        let b = other.strip_trailing_zeros();
        a.unscaled == b.unscaled && a.scale == b.scale
    }
}

impl Eq for BigDecimal {}

impl FromStr for BigDecimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidNumber(s.to_string());
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(invalid());
        }
        let negative = match rest.as_bytes()[0] {
            b'-' => {
                rest = &rest[1..];
                true
            }
            b'+' => {
                rest = &rest[1..];
                false
            }
            _ => false,
        };
        let (mantissa, exponent) = match rest.find(|c: char| c == 'e' || c == 'E') {
            Some(pos) => {
                let exp: i64 = rest[pos + 1..].parse().map_err(|_| invalid())?;
                (&rest[..pos], exp)
            }
            None => (rest, 0),
        };
        let (int_digits, frac_digits) = match mantissa.find('.') {
            Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
            None => (mantissa, ""),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }
        if !int_digits.bytes().all(|b| b.is_ascii_digit())
            || !frac_digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let digits = format!("{int_digits}{frac_digits}");
        let mut unscaled: BigInt = digits.parse().map_err(|_| invalid())?;
        if negative {
            unscaled = -unscaled;
        }
        let scale = frac_digits.len() as i64 - exponent;
        Ok(BigDecimal { unscaled, scale })
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.unscaled < BigInt::from(0);
        let digits = self.unscaled.magnitude().to_string();
        if digits == "0" {
            return f.write_str("0");
        }
        let sign = if negative { "-" } else { "" };
        if self.scale <= 0 {
            let zeros = "0".repeat((-self.scale) as usize);
            write!(f, "{sign}{digits}{zeros}")
        } else {
            let scale = self.scale as usize;
            if digits.len() > scale {
                let split = digits.len() - scale;
                write!(f, "{sign}{}.{}", &digits[..split], &digits[split..])
            } else {
                let zeros = "0".repeat(scale - digits.len());
                write!(f, "{sign}0.{zeros}{digits}")
            }
        }
    }
}

/// Parses a decimal numeral into the narrowest exact [`Number`] variant:
/// `Int` when the literal is integral and fits an `i64`, `BigInt` for wider
/// integrals, `Decimal` otherwise. Fidelity is preserved in every case.
///
/// [`Number`]: crate::Number
pub fn parse_literal(s: &str) -> Result<crate::Number> {
    use crate::Number;
    let trimmed = s.trim();
    if !trimmed.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        if let Ok(v) = trimmed.parse::<i64>() {
            return Ok(Number::Int(v));
        }
        let big: BigInt = trimmed
            .parse()
            .map_err(|_| Error::InvalidNumber(s.to_string()))?;
        return Ok(Number::BigInt(big));
    }
    Ok(Number::Decimal(trimmed.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_safe_integer_boundaries() {
        assert!(is_safe_i64(9007199254740991));
        assert!(!is_safe_i64(9007199254740992));
        assert!(is_safe_i64(-9007199254740991));
        assert!(!is_safe_i64(-9007199254740992));
        assert!(is_safe_i64(0));
    }

    #[test]
    fn test_safe_big_int_boundaries() {
        assert!(is_safe_big_int(&BigInt::from(9007199254740991i64)));
        assert!(!is_safe_big_int(&BigInt::from(9007199254740992i64)));
        assert!(is_safe_big_int(&BigInt::from(-9007199254740991i64)));
        assert!(!is_safe_big_int(&BigInt::from(-9007199254740992i64)));
    }

    #[test]
    fn test_decimal_ieee754() {
        assert!(dec("10").is_ieee754());
        // mantissa bit length 53
        assert!(dec("0.1000000000000001").is_ieee754());
        // mantissa bit length 54
        assert!(!dec("0.10000000000000001").is_ieee754());
        // mantissa bit length 1, exponent in range
        assert!(dec("0.0000000000000000000000001").is_ieee754());
        // largest unscaled value allowed by 53 bit mantissa
        assert!(dec("9007199254740991").is_ieee754());
        assert!(!dec("9007199254740992").is_ieee754());
        assert!(dec("-9007199254740991").is_ieee754());
        assert!(!dec("-9007199254740992").is_ieee754());
    }

    #[test]
    fn test_decimal_scale_range() {
        // scale beyond the double exponent range
        assert!(!dec("1e-1030").is_ieee754());
        assert!(dec("1e-1022").is_ieee754());
        // huge integer part caught by the integer-part rule
        assert!(!dec("9e308").is_ieee754());
    }

    #[test]
    fn test_display() {
        assert_eq!(dec("10.25").to_string(), "10.25");
        assert_eq!(dec("-0.5").to_string(), "-0.5");
        assert_eq!(dec("1e3").to_string(), "1000");
        assert_eq!(dec("1.5e-3").to_string(), "0.0015");
        assert_eq!(dec("0").to_string(), "0");
        assert_eq!(dec("0.10000000000000001").to_string(), "0.10000000000000001");
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(dec("1000"), dec("1e3"));
        assert_eq!(dec("0.50"), dec("0.5"));
        assert_ne!(dec("0.5"), dec("0.05"));
    }

    #[test]
    fn test_integer_part() {
        assert_eq!(dec("10.25").integer_part(), BigInt::from(10));
        assert_eq!(dec("-1.5").integer_part(), BigInt::from(-1));
        assert_eq!(dec("1e3").integer_part(), BigInt::from(1000));
        assert_eq!(dec("0.25").integer_part(), BigInt::from(0));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(dec("42").to_i64(), Some(42));
        assert_eq!(dec("42.0").to_i64(), Some(42));
        assert_eq!(dec("42.5").to_i64(), None);
        assert_eq!(dec("0.25").to_f64(), 0.25);
        assert_eq!(dec("1e3").to_big_int(), Some(BigInt::from(1000)));
    }

    #[test]
    fn test_parse_literal() {
        use crate::Number;
        assert_eq!(parse_literal("42").unwrap(), Number::Int(42));
        assert_eq!(
            parse_literal("9223372036854775808").unwrap(),
            Number::BigInt("9223372036854775808".parse().unwrap())
        );
        assert_eq!(parse_literal("0.5").unwrap(), Number::Decimal(dec("0.5")));
        assert!(parse_literal("abc").is_err());
        assert!(parse_literal("").is_err());
    }
}
