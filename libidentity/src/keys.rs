use crate::types::{parse_canonical, to_decimal, CurvePoint};
use ark_ff::Zero;
use rand::{CryptoRng, RngCore};
use rwa_jubjub::{mul_generator, reduce_mod_m, Fr};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("scalar is not a decimal integer below the field modulus")]
    NonCanonicalScalar,
    #[error("secret key must not be zero")]
    ZeroSecret,
    #[error("coordinate is not a decimal integer below the base field modulus")]
    NonCanonicalCoordinate,
    #[error("point is not on the Jubjub curve")]
    NotOnCurve,
    #[error("point is not in the prime-order subgroup")]
    NotInSubgroup,
    #[error("public key does not match the secret key")]
    Mismatch,
}

/// The issuer's secret scalar.
///
/// Cloning is safe because the underlying scalar is zeroized on drop automatically. Neither `Debug` nor `Serialize`
/// reveal it; [`Self::expose_decimal`] is the only way out.
#[derive(Clone)]
pub struct IssuerSecret(Zeroizing<Fr>);

impl IssuerSecret {
    pub fn new(scalar: Fr) -> Result<Self, KeyError> {
        if scalar.is_zero() {
            return Err(KeyError::ZeroSecret);
        }
        Ok(Self(Zeroizing::new(scalar)))
    }

    /// Draws 64 random bytes and reduces them modulo M, so the bias is negligible.
    pub fn random<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        loop {
            let mut wide = Zeroizing::new([0u8; 64]);
            rng.fill_bytes(&mut wide[..]);
            if let Ok(secret) = Self::new(reduce_mod_m(&wide[..])) {
                return secret;
            }
        }
    }

    pub fn from_decimal(text: &str) -> Result<Self, KeyError> {
        let scalar = parse_canonical::<Fr>(text).ok_or(KeyError::NonCanonicalScalar)?;
        Self::new(scalar)
    }

    pub fn expose_decimal(&self) -> Zeroizing<String> {
        Zeroizing::new(to_decimal(&*self.0))
    }

    pub fn as_scalar(&self) -> &Fr {
        &self.0
    }
}

impl Debug for IssuerSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IssuerSecret(***)")
    }
}

/// The issuer's public key, `sk·G` on Jubjub.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuerPublicKey(CurvePoint);

impl IssuerPublicKey {
    pub fn from_secret(secret: &IssuerSecret) -> Self {
        Self(CurvePoint::from_affine(mul_generator(secret.as_scalar())))
    }

    pub fn from_decimal(x: &str, y: &str) -> Result<Self, KeyError> {
        CurvePoint::from_decimal(x, y).map(Self)
    }

    pub fn as_point(&self) -> &CurvePoint {
        &self.0
    }
}

impl From<IssuerPublicKey> for CurvePoint {
    fn from(value: IssuerPublicKey) -> Self {
        value.0
    }
}

/// A secret key together with its public key. The pair is immutable once built.
#[derive(Clone, Debug)]
pub struct IssuerKeyPair {
    secret: IssuerSecret,
    public_key: IssuerPublicKey,
}

impl IssuerKeyPair {
    pub fn from_secret(secret: IssuerSecret) -> Self {
        let public_key = IssuerPublicKey::from_secret(&secret);
        Self { secret, public_key }
    }

    /// Builds a pair from separately stored halves, checking that they belong together.
    pub fn from_parts(secret: IssuerSecret, public_key: IssuerPublicKey) -> Result<Self, KeyError> {
        let pair = Self::from_secret(secret);
        if pair.public_key != public_key {
            return Err(KeyError::Mismatch);
        }
        Ok(pair)
    }

    pub fn random<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Self::from_secret(IssuerSecret::random(rng))
    }

    pub fn secret(&self) -> &IssuerSecret {
        &self.secret
    }

    pub fn public_key(&self) -> &IssuerPublicKey {
        &self.public_key
    }
}
