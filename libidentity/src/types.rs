use crate::keys::KeyError;
use ark_ff::{BigInteger, One, PrimeField, Zero};
use num_bigint::BigUint;
use rwa_jubjub::{reduce_mod_m, Fq, Point, SCALAR_SIZE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display};
use std::str::FromStr;
use thiserror::Error;

/// Width in bytes of a circuit input.
pub const FIELD_ELEMENT_SIZE: usize = SCALAR_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFieldElementError {
    #[error("not a decimal integer")]
    NotDecimal,
    #[error("value needs {0} bytes, more than the 32 a field element holds")]
    TooWide(usize),
}

/// An unsigned 256-bit circuit input, stored as 32 little-endian bytes.
///
/// Credential attributes and the raw outputs of the nonce and challenge primitives are `FieldElement`s. They are
/// reduced modulo [`rwa_jubjub::FIELD_MODULUS`] only when they enter signature arithmetic, via [`Self::to_scalar`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldElement([u8; FIELD_ELEMENT_SIZE]);

impl FieldElement {
    pub const ZERO: Self = Self([0u8; FIELD_ELEMENT_SIZE]);

    pub fn from_le_bytes(bytes: [u8; FIELD_ELEMENT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_le_bytes(&self) -> &[u8; FIELD_ELEMENT_SIZE] {
        &self.0
    }

    pub fn from_biguint(value: &BigUint) -> Result<Self, ParseFieldElementError> {
        let bytes = value.to_bytes_le();
        if bytes.len() > FIELD_ELEMENT_SIZE {
            return Err(ParseFieldElementError::TooWide(bytes.len()));
        }
        let mut out = [0u8; FIELD_ELEMENT_SIZE];
        out[..bytes.len()].copy_from_slice(&bytes);
        Ok(Self(out))
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.0)
    }

    /// The base field element as a circuit input. Base field elements always fit.
    pub fn from_fq(value: &Fq) -> Self {
        Self(rwa_jubjub::fq_to_le_bytes(value))
    }

    /// Reduce modulo M into a signature scalar.
    pub fn to_scalar(&self) -> rwa_jubjub::Fr {
        reduce_mod_m(&self.0)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        let mut out = [0u8; FIELD_ELEMENT_SIZE];
        out[..8].copy_from_slice(&value.to_le_bytes());
        Self(out)
    }
}

impl FromStr for FieldElement {
    type Err = ParseFieldElementError;

    /// Parses a plain decimal string. Signs, whitespace and radix prefixes are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_decimal(s).ok_or(ParseFieldElementError::NotDecimal)?;
        Self::from_biguint(&value)
    }
}

impl Display for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl Debug for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldElement({self})")
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    /// Accepts a decimal string or a non-negative integer literal.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldElementVisitor;

        impl serde::de::Visitor<'_> for FieldElementVisitor {
            type Value = FieldElement;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a decimal string or unsigned integer of at most 256 bits")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(FieldElement::from(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(FieldElementVisitor)
    }
}

/// Parses an unsigned decimal integer made of ASCII digits only.
pub(crate) fn parse_decimal(text: &str) -> Option<BigUint> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(text.as_bytes(), 10)
}

/// Parses a decimal string into a field element, rejecting values that are not already reduced.
pub(crate) fn parse_canonical<F: PrimeField>(text: &str) -> Option<F> {
    let value = parse_decimal(text)?;
    let modulus = BigUint::from_bytes_le(&F::MODULUS.to_bytes_le());
    if value >= modulus {
        return None;
    }
    Some(F::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Decimal representation of a field element.
pub(crate) fn to_decimal<F: PrimeField>(value: &F) -> String {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le()).to_string()
}

/// A point in the prime-order subgroup of Jubjub.
///
/// Construction from untrusted coordinates checks both curve membership and subgroup membership, so every
/// `CurvePoint` in circulation is safe to feed to the verification circuit.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "PointCoordinates", into = "PointCoordinates")]
pub struct CurvePoint(Point);

impl CurvePoint {
    /// Wraps a point produced by trusted arithmetic (e.g. a scalar multiple of the generator).
    pub fn from_affine(point: Point) -> Self {
        Self(point)
    }

    pub fn as_affine(&self) -> &Point {
        &self.0
    }

    pub fn x(&self) -> Fq {
        self.0.x
    }

    pub fn y(&self) -> Fq {
        self.0.y
    }

    pub fn from_decimal(x: &str, y: &str) -> Result<Self, KeyError> {
        let x = parse_canonical::<Fq>(x).ok_or(KeyError::NonCanonicalCoordinate)?;
        let y = parse_canonical::<Fq>(y).ok_or(KeyError::NonCanonicalCoordinate)?;
        let point = Point::new_unchecked(x, y);
        if !point.is_on_curve() {
            return Err(KeyError::NotOnCurve);
        }
        if !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(KeyError::NotInSubgroup);
        }
        Ok(Self(point))
    }

    /// `x ‖ y`, each as 32 little-endian bytes.
    pub fn to_le_bytes(&self) -> [u8; 2 * FIELD_ELEMENT_SIZE] {
        let mut out = [0u8; 2 * FIELD_ELEMENT_SIZE];
        out[..FIELD_ELEMENT_SIZE].copy_from_slice(&rwa_jubjub::fq_to_le_bytes(&self.0.x));
        out[FIELD_ELEMENT_SIZE..].copy_from_slice(&rwa_jubjub::fq_to_le_bytes(&self.0.y));
        out
    }

    pub fn is_identity(&self) -> bool {
        self.0.x.is_zero() && self.0.y.is_one()
    }
}

/// Wire form of a [`CurvePoint`]: decimal coordinate strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct PointCoordinates {
    x: String,
    y: String,
}

impl From<CurvePoint> for PointCoordinates {
    fn from(point: CurvePoint) -> Self {
        Self { x: to_decimal(&point.0.x), y: to_decimal(&point.0.y) }
    }
}

impl TryFrom<PointCoordinates> for CurvePoint {
    type Error = KeyError;

    fn try_from(value: PointCoordinates) -> Result<Self, Self::Error> {
        CurvePoint::from_decimal(&value.x, &value.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rwa_jubjub::{mul_generator, Fr, G_X, G_Y, MODULUS_STR_FQ};

    #[test]
    fn decimal_round_trip() {
        let a = FieldElement::from(15440u64);
        assert_eq!(a.to_string(), "15440");
        assert_eq!(a.as_le_bytes()[..2], [0x50, 0x3C]);
        let b: FieldElement = "15440".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(FieldElement::ZERO.to_string(), "0");
    }

    #[test]
    fn rejects_non_decimal_and_wide_values() {
        assert_eq!("".parse::<FieldElement>(), Err(ParseFieldElementError::NotDecimal));
        assert_eq!("-1".parse::<FieldElement>(), Err(ParseFieldElementError::NotDecimal));
        assert_eq!(" 1".parse::<FieldElement>(), Err(ParseFieldElementError::NotDecimal));
        assert_eq!("0x10".parse::<FieldElement>(), Err(ParseFieldElementError::NotDecimal));
        let two_pow_256 = (BigUint::from(1u8) << 256u32).to_string();
        assert_eq!(two_pow_256.parse::<FieldElement>(), Err(ParseFieldElementError::TooWide(33)));
        let max = ((BigUint::from(1u8) << 256u32) - 1u8).to_string();
        assert_eq!(max.parse::<FieldElement>().unwrap().as_le_bytes(), &[0xFF; 32]);
    }

    #[test]
    fn serde_accepts_strings_and_integers() {
        let a: FieldElement = serde_json::from_str("\"42\"").unwrap();
        let b: FieldElement = serde_json::from_str("42").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"42\"");
        assert!(serde_json::from_str::<FieldElement>("-3").is_err());
        assert!(serde_json::from_str::<FieldElement>("true").is_err());
    }

    #[test]
    fn scalar_reduction_uses_field_modulus() {
        let m: FieldElement = rwa_jubjub::MODULUS_STR_FR.parse().unwrap();
        assert_eq!(m.to_scalar(), Fr::from(0u64));
        assert_eq!(FieldElement::from(7u64).to_scalar(), Fr::from(7u64));
    }

    #[test]
    fn curve_point_validation() {
        let g = CurvePoint::from_decimal(&to_decimal(&G_X), &to_decimal(&G_Y)).unwrap();
        assert_eq!(g.as_affine(), &mul_generator(&Fr::from(1u64)));
        assert!(matches!(CurvePoint::from_decimal("1", "2"), Err(KeyError::NotOnCurve)));
        assert!(matches!(CurvePoint::from_decimal(MODULUS_STR_FQ, "1"), Err(KeyError::NonCanonicalCoordinate)));
        // (0, -1) is on the curve but has order two.
        let minus_one = to_decimal(&(-Fq::from(1u64)));
        assert!(matches!(CurvePoint::from_decimal("0", &minus_one), Err(KeyError::NotInSubgroup)));
    }

    #[test]
    fn curve_point_serializes_as_decimal_coordinates() {
        let p = CurvePoint::from_affine(mul_generator(&Fr::from(3u64)));
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["x"], serde_json::Value::String(to_decimal(&p.x())));
        let back: CurvePoint = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
