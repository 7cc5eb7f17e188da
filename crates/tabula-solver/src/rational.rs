use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use thiserror::Error;

/// Tolerance used when approximating floating point input.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Continued fraction expansion cap used when approximating floating point input.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Largest numerator or denominator a float approximation may produce.
const CONVERSION_BOUND: i64 = i32::MAX as i64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("fraction with a zero denominator")]
    ZeroDenominator,
    #[error("cannot convert {0} to a fraction: not a finite number")]
    NotFinite(f64),
    #[error("overflow converting {value} to a fraction")]
    ConversionOverflow { value: f64 },
    #[error("unable to convert {value} to a fraction within {iterations} iterations")]
    NoConvergence { value: f64, iterations: usize },
    #[error("invalid fraction literal: {0}")]
    Parse(String),
}

/// An exact fraction of arbitrary precision.
///
/// Values are always kept in lowest terms with a strictly positive
/// denominator, so structural equality is numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rational(BigRational);

impl Rational {
    pub fn new(numer: impl Into<BigInt>, denom: impl Into<BigInt>) -> Result<Self, ArithmeticError> {
        let denom = denom.into();
        if denom.is_zero() {
            return Err(ArithmeticError::ZeroDenominator);
        }
        Ok(Self(BigRational::new(numer.into(), denom)))
    }

    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self(BigRational::from_integer(value.into()))
    }

    /// Approximates a float with the default tolerance and iteration cap.
    pub fn from_f64(value: f64) -> Result<Self, ArithmeticError> {
        Self::approximate(value, DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS)
    }

    /// Approximates `value` by its continued fraction convergents.
    ///
    /// Stops at the first convergent within `epsilon` of `value`. Fails when a
    /// convergent term exceeds `i32::MAX` or when `max_iterations` expansions
    /// do not get within `epsilon`.
    pub fn approximate(value: f64, epsilon: f64, max_iterations: usize) -> Result<Self, ArithmeticError> {
        if !value.is_finite() {
            return Err(ArithmeticError::NotFinite(value));
        }
        let bound = CONVERSION_BOUND as f64;
        let overflow = ArithmeticError::ConversionOverflow { value };

        let mut r0 = value;
        let mut a0 = r0.floor();
        if a0.abs() > bound {
            return Err(overflow);
        }
        if (a0 - value).abs() < epsilon {
            return Ok(Self::from_integer(a0 as i64));
        }

        let (mut p0, mut q0) = (1i64, 0i64);
        let (mut p1, mut q1) = (a0 as i64, 1i64);
        let (mut p2, mut q2);
        let mut n = 0;
        loop {
            n += 1;
            let r1 = 1.0 / (r0 - a0);
            let a1 = r1.floor();
            if !a1.is_finite() || a1.abs() > bound {
                return Err(overflow);
            }
            p2 = (a1 as i64) * p1 + p0;
            q2 = (a1 as i64) * q1 + q0;
            if p2.abs() > CONVERSION_BOUND || q2.abs() > CONVERSION_BOUND {
                return Err(overflow);
            }

            let convergent = p2 as f64 / q2 as f64;
            if n < max_iterations && (convergent - value).abs() > epsilon {
                p0 = p1;
                p1 = p2;
                q0 = q1;
                q1 = q2;
                a0 = a1;
                r0 = r1;
            } else {
                if (convergent - value).abs() > epsilon {
                    return Err(ArithmeticError::NoConvergence {
                        value,
                        iterations: max_iterations,
                    });
                }
                break;
            }
        }
        Self::new(p2, q2)
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Largest integer not greater than `self`.
    pub fn floor(&self) -> Self {
        Self(self.0.floor())
    }

    /// Smallest integer not less than `self`.
    pub fn ceil(&self) -> Self {
        Self(self.0.ceil())
    }

    /// `self - floor(self)`, always in `[0, 1)`.
    pub fn fract(&self) -> Self {
        Self(&self.0 - self.0.floor())
    }

    pub fn recip(&self) -> Result<Self, ArithmeticError> {
        if self.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(Self(self.0.recip()))
    }

    pub fn checked_div(&self, rhs: &Rational) -> Result<Self, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(Self(&self.0 / &rhs.0))
    }

    pub fn to_f64(&self) -> f64 {
        match (self.numer().to_f64(), self.denom().to_f64()) {
            (Some(n), Some(d)) => n / d,
            _ => f64::NAN,
        }
    }

    pub fn into_inner(self) -> BigRational {
        self.0
    }
}

impl Zero for Rational {
    fn zero() -> Self {
        Self(BigRational::zero())
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl One for Rational {
    fn one() -> Self {
        Self(BigRational::one())
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i32> for Rational {
    fn from(value: i32) -> Self {
        Self::from_integer(value)
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<BigInt> for Rational {
    fn from(value: BigInt) -> Self {
        Self::from_integer(value)
    }
}

impl From<BigRational> for Rational {
    fn from(value: BigRational) -> Self {
        Self(value)
    }
}

impl Add<&Rational> for &Rational {
    type Output = Rational;

    fn add(self, rhs: &Rational) -> Rational {
        if rhs.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return rhs.clone();
        }
        Rational(&self.0 + &rhs.0)
    }
}

impl Sub<&Rational> for &Rational {
    type Output = Rational;

    fn sub(self, rhs: &Rational) -> Rational {
        if rhs.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return -rhs;
        }
        Rational(&self.0 - &rhs.0)
    }
}

impl Mul<&Rational> for &Rational {
    type Output = Rational;

    fn mul(self, rhs: &Rational) -> Rational {
        if self.is_zero() || rhs.is_zero() {
            return Rational::zero();
        }
        Rational(&self.0 * &rhs.0)
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                (&self).$method(&rhs)
            }
        }

        impl $imp<&Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: &Rational) -> Rational {
                (&self).$method(rhs)
            }
        }

        impl $imp<Rational> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                self.$method(&rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-&self.0)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numer())
        } else {
            write!(f, "{}/{}", self.numer(), self.denom())
        }
    }
}

impl FromStr for Rational {
    type Err = ArithmeticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<BigRational>()
            .map(Self)
            .map_err(|e| ArithmeticError::Parse(format!("{s}: {e}")))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Rational {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Rational {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_integer::Integer;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    fn frac(n: i64, d: i64) -> Rational {
        Rational::new(n, d).unwrap()
    }

    #[test]
    fn test_normalizes_sign_and_gcd() {
        let r = frac(6, -8);
        assert_eq!(r.numer(), &BigInt::from(-3));
        assert_eq!(r.denom(), &BigInt::from(4));
        assert_eq!(frac(0, -5), Rational::zero());
        assert_eq!(frac(0, -5).denom(), &BigInt::from(1));
    }

    #[test]
    fn test_zero_denominator_rejected() {
        assert_eq!(Rational::new(1, 0), Err(ArithmeticError::ZeroDenominator));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            frac(3, 4).checked_div(&Rational::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
        assert_eq!(Rational::zero().recip(), Err(ArithmeticError::DivisionByZero));
        assert_eq!(frac(3, 4).checked_div(&frac(1, 2)).unwrap(), frac(3, 2));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(frac(1, 2) + frac(1, 3), frac(5, 6));
        assert_eq!(frac(1, 2) - frac(1, 3), frac(1, 6));
        assert_eq!(frac(2, 3) * frac(9, 4), frac(3, 2));
        assert_eq!(-frac(2, 3), frac(-2, 3));
        assert_eq!(&frac(1, 4) + &frac(3, 4), Rational::one());
        assert_eq!(Rational::zero() - frac(1, 7), frac(-1, 7));
    }

    #[test]
    fn test_ordering() {
        assert!(frac(1, 3) < frac(1, 2));
        assert!(frac(-1, 2) < frac(-1, 3));
        assert!(frac(7, 3) > Rational::from(2));
        assert_eq!(frac(2, 4).cmp(&frac(1, 2)), Ordering::Equal);
    }

    #[test]
    fn test_floor_ceil_fract() {
        assert_eq!(frac(7, 4).floor(), Rational::from(1));
        assert_eq!(frac(-7, 4).floor(), Rational::from(-2));
        assert_eq!(frac(7, 4).ceil(), Rational::from(2));
        assert_eq!(frac(-7, 4).ceil(), Rational::from(-1));
        assert_eq!(Rational::from(4).ceil(), Rational::from(4));
        assert_eq!(frac(7, 4).fract(), frac(3, 4));
        assert_eq!(frac(-7, 4).fract(), frac(1, 4));
        assert_eq!(Rational::from(4).fract(), Rational::zero());
    }

    #[test]
    fn test_predicates() {
        assert!(frac(1, 3).is_positive());
        assert!(frac(-1, 3).is_negative());
        assert!(!Rational::zero().is_positive());
        assert!(!Rational::zero().is_negative());
        assert!(frac(8, 4).is_integer());
        assert!(!frac(8, 3).is_integer());
        assert_eq!(frac(-5, 3).abs(), frac(5, 3));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Rational::from_f64(0.5).unwrap(), frac(1, 2));
        assert_eq!(Rational::from_f64(2.5).unwrap(), frac(5, 2));
        assert_eq!(Rational::from_f64(-0.75).unwrap(), frac(-3, 4));
        assert_eq!(Rational::from_f64(0.1).unwrap(), frac(1, 10));
        assert_eq!(Rational::from_f64(1.0 / 3.0).unwrap(), frac(1, 3));
        assert_eq!(Rational::from_f64(12.0).unwrap(), Rational::from(12));
        assert_eq!(Rational::from_f64(0.0).unwrap(), Rational::zero());
    }

    #[test]
    fn test_from_f64_failures() {
        assert!(matches!(
            Rational::from_f64(f64::NAN),
            Err(ArithmeticError::NotFinite(_))
        ));
        assert!(matches!(
            Rational::from_f64(f64::INFINITY),
            Err(ArithmeticError::NotFinite(_))
        ));
        assert_eq!(
            Rational::from_f64(1e12),
            Err(ArithmeticError::ConversionOverflow { value: 1e12 })
        );
        assert!(matches!(
            Rational::approximate(std::f64::consts::PI, 1e-15, 2),
            Err(ArithmeticError::NoConvergence { iterations: 2, .. })
        ));
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(frac(-3, 4).to_string(), "-3/4");
        assert_eq!(Rational::from(12).to_string(), "12");
        assert_eq!("765/41".parse::<Rational>().unwrap(), frac(765, 41));
        assert_eq!(" -6/8 ".parse::<Rational>().unwrap(), frac(-3, 4));
        assert_eq!("5".parse::<Rational>().unwrap(), Rational::from(5));
        assert!(matches!("x/2".parse::<Rational>(), Err(ArithmeticError::Parse(_))));
        assert!(matches!("1/0".parse::<Rational>(), Err(ArithmeticError::Parse(_))));
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(frac(3, 8).to_f64(), 0.375);
        assert_eq!(frac(-1, 4).to_f64(), -0.25);
    }

    proptest! {
        #[test]
        fn test_always_lowest_terms(n in -10_000i64..10_000, d in -10_000i64..10_000) {
            prop_assume!(d != 0);
            let r = frac(n, d);
            prop_assert!(r.denom().is_positive());
            prop_assert!(r.numer().gcd(r.denom()).is_one());
        }

        #[test]
        fn test_reciprocal_product_is_one(n in 1i64..10_000, d in 1i64..10_000, negative in any::<bool>()) {
            let r = if negative { frac(-n, d) } else { frac(n, d) };
            prop_assert_eq!(&r * r.recip().unwrap(), Rational::one());
        }

        #[test]
        fn test_additive_inverse(n in -10_000i64..10_000, d in 1i64..10_000) {
            let r = frac(n, d);
            prop_assert!((&r + -&r).is_zero());
            prop_assert_eq!(&r - &r, Rational::zero());
        }

        #[test]
        fn test_fract_in_unit_interval(n in -10_000i64..10_000, d in 1i64..100) {
            let f = frac(n, d).fract();
            prop_assert!(!f.is_negative());
            prop_assert!(f < Rational::one());
            prop_assert_eq!(frac(n, d).floor() + f, frac(n, d));
        }
    }
}
