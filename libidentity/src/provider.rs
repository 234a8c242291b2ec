use crate::credential::PassportData;
use crate::error::CredentialError;
use crate::government::{verify_and_open, GovernmentSignaturePayload};
use crate::keys::{IssuerKeyPair, IssuerPublicKey};
use crate::mrz::Mrz;
use crate::signature::{Blake2bPrimitives, CredentialService, SignaturePrimitives, SignedCredential};
use log::*;
use serde_json::Value;

/// Turns government-attested passports into circuit-ready credentials.
///
/// Each request runs the same pipeline, and the first failing stage ends it:
/// 1. the payload shape check,
/// 2. the government signature gate,
/// 3. TD3 MRZ parsing of the attested bytes,
/// 4. signing of the resulting [`PassportData`].
pub struct IdentityProvider<P = Blake2bPrimitives> {
    service: CredentialService<P>,
}

impl IdentityProvider<Blake2bPrimitives> {
    pub fn new(key_pair: IssuerKeyPair) -> Self {
        Self { service: CredentialService::new(key_pair) }
    }
}

impl<P: SignaturePrimitives> IdentityProvider<P> {
    pub fn from_service(service: CredentialService<P>) -> Self {
        Self { service }
    }

    pub fn public_key(&self) -> &IssuerPublicKey {
        self.service.public_key()
    }

    pub fn service(&self) -> &CredentialService<P> {
        &self.service
    }

    /// Verifies the attestation and parses the passport it covers, without signing anything.
    pub fn attested_passport(&self, payload: &GovernmentSignaturePayload) -> Result<PassportData, CredentialError> {
        let attested = verify_and_open(payload)?;
        let mrz = Mrz::from_bytes(&attested)?;
        debug!("Attested MRZ for document {} issued by {}", mrz.document_number(), mrz.issuing_organization());
        mrz.to_passport_data()
    }

    pub fn issue(&self, payload: &GovernmentSignaturePayload) -> Result<SignedCredential, CredentialError> {
        let passport = self.attested_passport(payload)?;
        let signed = self.service.sign(&passport)?;
        info!("Issued credential with {} attributes", signed.credential.len());
        Ok(signed)
    }

    pub fn issue_json(&self, payload: &Value) -> Result<SignedCredential, CredentialError> {
        let payload = GovernmentSignaturePayload::from_json(payload)?;
        self.issue(&payload)
    }

    pub fn issue_json_str(&self, payload: &str) -> Result<SignedCredential, CredentialError> {
        let payload = GovernmentSignaturePayload::from_json_str(payload)?;
        self.issue(&payload)
    }
}
