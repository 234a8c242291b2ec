//! The gate in front of the issuer: a government attestation must verify as an ECDSA P-256 / SHA-256 signature
//! before the attested bytes may be re-signed.

use crate::encoding::hex_to_bytes;
use crate::error::CredentialError;
use log::*;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;

/// DER header of a SubjectPublicKeyInfo holding an uncompressed P-256 point:
/// `SEQUENCE { SEQUENCE { id-ecPublicKey, prime256v1 }, BIT STRING (66 bytes, 0 unused bits) }`.
pub const EC_P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a, 0x86, 0x48, 0xce,
    0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

pub const UNCOMPRESSED_POINT_LENGTH: usize = 65;
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// A government attestation as received: three hex strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernmentSignaturePayload {
    pub credential: String,
    pub signature: String,
    pub pk: String,
}

impl GovernmentSignaturePayload {
    pub fn new(credential: impl Into<String>, signature: impl Into<String>, pk: impl Into<String>) -> Self {
        Self { credential: credential.into(), signature: signature.into(), pk: pk.into() }
    }

    /// Checks the payload shape. `credential`, `signature` and `pk` must all be present and be strings; other keys
    /// are ignored.
    pub fn from_json(value: &Value) -> Result<Self, CredentialError> {
        let object = value
            .as_object()
            .ok_or_else(|| CredentialError::MalformedPayload("payload must be a JSON object".to_string()))?;
        let field = |name: &str| match object.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(CredentialError::MalformedPayload(format!("\"{name}\" must be a string"))),
            None => Err(CredentialError::MalformedPayload(format!("missing \"{name}\""))),
        };
        Ok(Self { credential: field("credential")?, signature: field("signature")?, pk: field("pk")? })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CredentialError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| CredentialError::MalformedPayload(format!("invalid JSON: {e}")))?;
        Self::from_json(&value)
    }
}

/// The public key encodings the gate understands, in the order they are tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublicKeyEncoding {
    /// A DER-encoded SubjectPublicKeyInfo.
    Spki,
    /// A bare 65-byte SEC1 point, `0x04 ‖ x ‖ y`.
    UncompressedPoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a {encoding} key: {reason}")]
pub struct KeyImportFailure {
    pub encoding: PublicKeyEncoding,
    pub reason: String,
}

impl KeyImportFailure {
    fn new(encoding: PublicKeyEncoding, reason: impl Into<String>) -> Self {
        Self { encoding, reason: reason.into() }
    }
}

impl Display for PublicKeyEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicKeyEncoding::Spki => write!(f, "SPKI DER"),
            PublicKeyEncoding::UncompressedPoint => write!(f, "raw uncompressed point"),
        }
    }
}

impl PublicKeyEncoding {
    pub const IMPORT_ORDER: [PublicKeyEncoding; 2] = [PublicKeyEncoding::Spki, PublicKeyEncoding::UncompressedPoint];

    pub fn decode(self, bytes: &[u8]) -> Result<VerifyingKey, KeyImportFailure> {
        match self {
            PublicKeyEncoding::Spki => {
                VerifyingKey::from_public_key_der(bytes).map_err(|e| KeyImportFailure::new(self, e.to_string()))
            }
            PublicKeyEncoding::UncompressedPoint => {
                if bytes.len() != UNCOMPRESSED_POINT_LENGTH {
                    let reason = format!("expected {UNCOMPRESSED_POINT_LENGTH} bytes, got {}", bytes.len());
                    return Err(KeyImportFailure::new(self, reason));
                }
                if bytes[0] != UNCOMPRESSED_POINT_TAG {
                    return Err(KeyImportFailure::new(self, format!("leading byte is {:#04x}", bytes[0])));
                }
                let mut der = Vec::with_capacity(EC_P256_SPKI_PREFIX.len() + bytes.len());
                der.extend_from_slice(&EC_P256_SPKI_PREFIX);
                der.extend_from_slice(bytes);
                VerifyingKey::from_public_key_der(&der).map_err(|e| KeyImportFailure::new(self, e.to_string()))
            }
        }
    }
}

/// Imports a P-256 public key, trying each of [`PublicKeyEncoding::IMPORT_ORDER`] in turn.
pub fn import_public_key(bytes: &[u8]) -> Result<(VerifyingKey, PublicKeyEncoding), CredentialError> {
    let mut failures = Vec::with_capacity(PublicKeyEncoding::IMPORT_ORDER.len());
    for encoding in PublicKeyEncoding::IMPORT_ORDER {
        match encoding.decode(bytes) {
            Ok(key) => return Ok((key, encoding)),
            Err(failure) => {
                trace!("Key import: {failure}");
                failures.push(failure.to_string());
            }
        }
    }
    Err(CredentialError::UnsupportedKeyEncoding(failures.join("; ")))
}

/// Verifies the government signature and returns the attested credential bytes.
pub fn verify_and_open(payload: &GovernmentSignaturePayload) -> Result<Vec<u8>, CredentialError> {
    let credential = hex_to_bytes(&payload.credential, "credential")?;
    let signature = hex_to_bytes(&payload.signature, "signature")?;
    let pk = hex_to_bytes(&payload.pk, "pk")?;

    let (key, encoding) = import_public_key(&pk)?;
    debug!("Imported government key from {encoding}");

    // The verifier hashes the credential with SHA-256 itself.
    let valid = Signature::from_der(&signature).map(|sig| key.verify(&credential, &sig).is_ok()).unwrap_or(false);
    if !valid {
        warn!("Government signature over {} credential bytes did not verify", credential.len());
        return Err(CredentialError::SignatureInvalid);
    }
    Ok(credential)
}

/// Succeeds silently if `payload` carries a valid government signature.
pub fn verify_government_signature(payload: &GovernmentSignaturePayload) -> Result<(), CredentialError> {
    verify_and_open(payload).map(|_| ())
}
