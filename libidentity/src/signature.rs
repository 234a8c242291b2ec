//! Schnorr-style credential signatures over Jubjub.
//!
//! The issuer signs the circuit view of a credential with a deterministic nonce:
//!
//! ```text
//!   k = nonce(sk, msg) mod M
//!   R = k·G
//!   c = challenge(R, PK, msg) mod M
//!   s = k + c·sk mod M
//! ```
//!
//! where M is [`rwa_jubjub::FIELD_MODULUS`]. A verifier accepts when `s·G == R + c·PK`. The nonce and challenge
//! functions are supplied through [`SignaturePrimitives`], so the circuit runtime's own primitives can be plugged in.
//! [`Blake2bPrimitives`] is the reference implementation.

use crate::credential::{CircuitInput, Credential};
use crate::encoding::decimal_scalar;
use crate::error::{CredentialError, PrimitiveError};
use crate::keys::{IssuerKeyPair, IssuerPublicKey};
use crate::types::{CurvePoint, FieldElement};
use ark_ec::CurveGroup;
use log::*;
use rwa_jubjub::{fr_to_le_bytes, hash_to_fq, Fr, ProjectivePoint};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub const NONCE_DOMAIN: &[u8] = b"RwaIdentity-DeterministicNonce-v1";
pub const CHALLENGE_DOMAIN: &[u8] = b"RwaIdentity-CredentialChallenge-v1";

/// The field arithmetic a signer and a verifier must agree on.
///
/// Both hash functions return unreduced [`FieldElement`]s; callers reduce them modulo M. Implementations must be
/// pure: the same arguments always produce the same output.
pub trait SignaturePrimitives: Send + Sync {
    /// Derives the signing nonce from the secret scalar and the full message.
    fn deterministic_nonce(&self, secret: &Fr, message: &Credential) -> Result<FieldElement, PrimitiveError>;

    /// Hashes the commitment, the signer's key and the message into a challenge.
    fn challenge(&self, r: &CurvePoint, pk: &CurvePoint, message: &Credential)
        -> Result<FieldElement, PrimitiveError>;

    fn mul_generator(&self, scalar: &Fr) -> CurvePoint {
        CurvePoint::from_affine(rwa_jubjub::mul_generator(scalar))
    }
}

/// Domain-separated Blake2b-512 hash-to-field into the Jubjub base field.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake2bPrimitives;

impl SignaturePrimitives for Blake2bPrimitives {
    fn deterministic_nonce(&self, secret: &Fr, message: &Credential) -> Result<FieldElement, PrimitiveError> {
        let mut input = Zeroizing::new(fr_to_le_bytes(secret).to_vec());
        input.extend_from_slice(&message.message_bytes());
        let [nonce] = hash_to_fq::<1>(NONCE_DOMAIN, &input);
        Ok(FieldElement::from_fq(&nonce))
    }

    fn challenge(
        &self,
        r: &CurvePoint,
        pk: &CurvePoint,
        message: &Credential,
    ) -> Result<FieldElement, PrimitiveError> {
        let mut input = Vec::with_capacity(128);
        input.extend_from_slice(&r.to_le_bytes());
        input.extend_from_slice(&pk.to_le_bytes());
        input.extend_from_slice(&message.message_bytes());
        let [c] = hash_to_fq::<1>(CHALLENGE_DOMAIN, &input);
        Ok(FieldElement::from_fq(&c))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSignature {
    pub r: CurvePoint,
    #[serde(with = "decimal_scalar")]
    pub s: Fr,
}

/// A credential together with the issuer's signature and public key, ready to hand to the circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCredential {
    pub credential: Credential,
    pub signature: CredentialSignature,
    pub pk: IssuerPublicKey,
}

/// Signs credentials with a single issuer key.
///
/// The key pair is fixed at construction and never mutated, so one service can be shared across threads.
pub struct CredentialService<P = Blake2bPrimitives> {
    key_pair: IssuerKeyPair,
    primitives: P,
}

impl CredentialService<Blake2bPrimitives> {
    pub fn new(key_pair: IssuerKeyPair) -> Self {
        Self { key_pair, primitives: Blake2bPrimitives }
    }
}

impl<P: SignaturePrimitives> CredentialService<P> {
    pub fn with_primitives(key_pair: IssuerKeyPair, primitives: P) -> Self {
        Self { key_pair, primitives }
    }

    pub fn public_key(&self) -> &IssuerPublicKey {
        self.key_pair.public_key()
    }

    pub fn primitives(&self) -> &P {
        &self.primitives
    }

    /// Signs the circuit view of `input`.
    ///
    /// The input is converted first, so a non-numeric attribute fails with [`CredentialError::TypeMismatch`] before
    /// any hashing. Primitive failures are returned as-is.
    pub fn sign<C: CircuitInput + ?Sized>(&self, input: &C) -> Result<SignedCredential, CredentialError> {
        let credential = input.to_circuit_input()?;
        trace!("Signing credential with {} attributes", credential.len());
        let sk = self.key_pair.secret().as_scalar();
        let pk = *self.key_pair.public_key();

        let k = Zeroizing::new(self.primitives.deterministic_nonce(sk, &credential)?.to_scalar());
        let r = self.primitives.mul_generator(&k);
        let c = self.primitives.challenge(&r, pk.as_point(), &credential)?.to_scalar();
        let s = *k + c * sk;
        debug!("Credential signed. R = ({}, {})", FieldElement::from_fq(&r.x()), FieldElement::from_fq(&r.y()));

        Ok(SignedCredential { credential, signature: CredentialSignature { r, s }, pk })
    }
}

/// Checks `s·G == R + c·PK` for a signed credential, recomputing `c` with `primitives`.
///
/// This mirrors the check the verification circuit performs. Returns `Ok(false)` for a well-formed signature that
/// does not verify.
pub fn verify_signed_credential<P: SignaturePrimitives + ?Sized>(
    primitives: &P,
    signed: &SignedCredential,
) -> Result<bool, CredentialError> {
    let SignedCredential { credential, signature, pk } = signed;
    let c = primitives.challenge(&signature.r, pk.as_point(), credential)?.to_scalar();
    let lhs = primitives.mul_generator(&signature.s);
    let rhs = ProjectivePoint::from(*signature.r.as_affine()) + *pk.as_point().as_affine() * c;
    let valid = *lhs.as_affine() == rhs.into_affine();
    if !valid {
        warn!("Signed credential failed verification");
    }
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::PassportData;
    use crate::encoding::encode;
    use crate::keys::IssuerSecret;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> CredentialService {
        let secret =
            IssuerSecret::from_decimal("1241430319352124423615924899154790773272120964456935720653499721250655785752")
                .unwrap();
        CredentialService::new(IssuerKeyPair::from_secret(secret))
    }

    fn credential() -> Credential {
        Credential::new()
            .with("documentCode", encode("P<").unwrap())
            .with("issuingOrganization", encode("UTO").unwrap())
            .with("holderName", encode("ERIKSSON<<ANNA<MARIA").unwrap())
    }

    #[test]
    fn signing_is_deterministic() {
        let svc = service();
        let a = svc.sign(&credential()).unwrap();
        let b = svc.sign(&credential()).unwrap();
        assert_eq!(a.signature, b.signature);
        let other = svc.sign(&credential().with("sex", encode("F").unwrap())).unwrap();
        assert_ne!(a.signature.r, other.signature.r);
    }

    #[test]
    fn signatures_satisfy_verification_equation() {
        let svc = service();
        let signed = svc.sign(&credential()).unwrap();
        assert_eq!(&signed.pk, svc.public_key());
        assert!(verify_signed_credential(svc.primitives(), &signed).unwrap());

        let random = CredentialService::new(IssuerKeyPair::random(&mut rand::rng()));
        let signed = random.sign(&credential()).unwrap();
        assert!(verify_signed_credential(&Blake2bPrimitives, &signed).unwrap());
    }

    #[test]
    fn tampering_breaks_verification() {
        let svc = service();
        let signed = svc.sign(&credential()).unwrap();

        let mut altered = signed.clone();
        altered.credential.insert("holderName", encode("ERIKSSON<<ANNA").unwrap());
        assert!(!verify_signed_credential(&Blake2bPrimitives, &altered).unwrap());

        let mut altered = signed.clone();
        altered.signature.s += Fr::from(1u64);
        assert!(!verify_signed_credential(&Blake2bPrimitives, &altered).unwrap());

        let mut altered = signed;
        altered.pk = IssuerPublicKey::from_secret(&IssuerSecret::from_decimal("5").unwrap());
        assert!(!verify_signed_credential(&Blake2bPrimitives, &altered).unwrap());
    }

    struct CountingPrimitives {
        calls: AtomicUsize,
    }

    impl SignaturePrimitives for CountingPrimitives {
        fn deterministic_nonce(&self, secret: &Fr, message: &Credential) -> Result<FieldElement, PrimitiveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Blake2bPrimitives.deterministic_nonce(secret, message)
        }

        fn challenge(
            &self,
            r: &CurvePoint,
            pk: &CurvePoint,
            message: &Credential,
        ) -> Result<FieldElement, PrimitiveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Blake2bPrimitives.challenge(r, pk, message)
        }
    }

    #[test]
    fn type_mismatch_fails_before_any_primitive() {
        let key_pair = IssuerKeyPair::from_secret(IssuerSecret::from_decimal("77").unwrap());
        let svc = CredentialService::with_primitives(key_pair, CountingPrimitives { calls: AtomicUsize::new(0) });
        let input = json!({"documentCode": "15440", "holderName": "ANNA"});
        match svc.sign(&input) {
            Err(CredentialError::TypeMismatch { field, .. }) => assert_eq!(field, "holderName"),
            other => panic!("expected a type mismatch, got {other:?}"),
        }
        assert_eq!(svc.primitives().calls.load(Ordering::SeqCst), 0);
        svc.sign(&json!({"documentCode": "15440"})).unwrap();
        assert_eq!(svc.primitives().calls.load(Ordering::SeqCst), 2);
    }

    struct FailingPrimitives;

    impl SignaturePrimitives for FailingPrimitives {
        fn deterministic_nonce(&self, _: &Fr, _: &Credential) -> Result<FieldElement, PrimitiveError> {
            Err(PrimitiveError::new("deterministic_nonce", "runtime unavailable"))
        }

        fn challenge(&self, _: &CurvePoint, _: &CurvePoint, _: &Credential) -> Result<FieldElement, PrimitiveError> {
            unreachable!("challenge must not run after a nonce failure")
        }
    }

    #[test]
    fn primitive_failures_propagate() {
        let key_pair = IssuerKeyPair::from_secret(IssuerSecret::from_decimal("77").unwrap());
        let svc = CredentialService::with_primitives(key_pair, FailingPrimitives);
        assert!(matches!(svc.sign(&credential()), Err(CredentialError::Primitive(_))));
    }

    #[test]
    fn raw_primitive_output_is_reduced() {
        // A nonce primitive returning M + 3 must sign exactly like one returning 3.
        struct Fixed(FieldElement);
        impl SignaturePrimitives for Fixed {
            fn deterministic_nonce(&self, _: &Fr, _: &Credential) -> Result<FieldElement, PrimitiveError> {
                Ok(self.0)
            }
            fn challenge(
                &self,
                r: &CurvePoint,
                pk: &CurvePoint,
                message: &Credential,
            ) -> Result<FieldElement, PrimitiveError> {
                Blake2bPrimitives.challenge(r, pk, message)
            }
        }
        let wide = num_bigint::BigUint::parse_bytes(rwa_jubjub::MODULUS_STR_FR.as_bytes(), 10).unwrap() + 3u8;
        let key_pair = IssuerKeyPair::from_secret(IssuerSecret::from_decimal("11").unwrap());
        let a = CredentialService::with_primitives(key_pair.clone(), Fixed(FieldElement::from_biguint(&wide).unwrap()));
        let b = CredentialService::with_primitives(key_pair, Fixed(FieldElement::from(3u64)));
        let sa = a.sign(&credential()).unwrap();
        let sb = b.sign(&credential()).unwrap();
        assert_eq!(sa.signature, sb.signature);
        assert_eq!(sa.signature.r.as_affine(), &rwa_jubjub::mul_generator(&Fr::from(3u64)));
    }

    #[test]
    fn signed_credential_wire_shape() {
        let svc = service();
        let data = PassportData::deserialize(json!({
            "documentCode": "15440", "issuingOrganization": "5215317", "holderName": "1",
            "documentNumber": "2", "documentNumberCheckDigit": "6", "nationality": "5215317",
            "dateOfBirth": "3", "dateOfBirthCheckDigit": "2", "sex": "70", "expiryDate": "4",
            "expiryDateCheckDigit": "9", "optionalData": "5", "optionalDataCheckDigit": "1",
            "compositeCheckDigit": "0"
        }))
        .unwrap();
        let signed = svc.sign(&data).unwrap();
        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(json["credential"]["documentCode"], "15440");
        assert_eq!(json["credential"].as_object().unwrap().keys().next().map(String::as_str), Some("documentCode"));
        assert!(json["signature"]["r"]["x"].is_string());
        assert!(json["signature"]["r"]["y"].is_string());
        assert!(json["signature"]["s"].is_string());
        assert!(json["pk"]["x"].is_string());
        let back: SignedCredential = serde_json::from_value(json).unwrap();
        assert_eq!(back, signed);
    }
}
