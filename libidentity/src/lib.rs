//! Passport credential issuance.
//!
//! A government attests to a passport's machine-readable zone with an ECDSA P-256 signature. Once that attestation
//! verifies ([`government`]), the MRZ is parsed ([`mrz`]) and its fields are re-signed with a Schnorr-style
//! signature over Jubjub ([`signature`]) that a zero-knowledge circuit can check. [`IdentityProvider`] runs the
//! whole pipeline.

pub mod credential;
pub mod encoding;
pub mod error;
pub mod government;
pub mod keys;
pub mod mrz;
pub mod provider;
pub mod signature;
pub mod types;

pub use credential::{CircuitInput, Credential, PassportData};
pub use encoding::{decode_text, encode, hex_to_bytes};
pub use error::{CredentialError, PrimitiveError};
pub use government::{verify_government_signature, GovernmentSignaturePayload, PublicKeyEncoding};
pub use keys::{IssuerKeyPair, IssuerPublicKey, IssuerSecret, KeyError};
pub use mrz::{Mrz, MrzError};
pub use provider::IdentityProvider;
pub use signature::{
    verify_signed_credential, Blake2bPrimitives, CredentialService, CredentialSignature, SignaturePrimitives,
    SignedCredential,
};
pub use types::{CurvePoint, FieldElement};
