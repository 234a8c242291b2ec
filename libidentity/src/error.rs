use crate::keys::KeyError;
use crate::mrz::MrzError;
use thiserror::Error;

/// Everything that can stop a credential from being verified or signed.
///
/// None of these are transient: they all describe malformed or fraudulent input, so callers should surface them
/// rather than retry.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("field \"{field}\" must be numeric, received {received}")]
    TypeMismatch { field: String, received: String },
    #[error("value is {len} bytes long; the maximum is {max} bytes")]
    Length { len: usize, max: usize },
    #[error("field \"{field}\" must be a hex string: {reason}")]
    Format { field: String, reason: String },
    #[error("attribute \"{0}\" appears more than once")]
    DuplicateAttribute(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("unsupported public key encoding: {0}")]
    UnsupportedKeyEncoding(String),
    #[error("invalid issuer signature")]
    SignatureInvalid,
    #[error("invalid MRZ: {0}")]
    Mrz(#[from] MrzError),
    #[error("invalid key: {0}")]
    Key(#[from] KeyError),
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
}

impl CredentialError {
    pub fn format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format { field: field.into(), reason: reason.into() }
    }

    pub fn type_mismatch(field: impl Into<String>, received: impl Into<String>) -> Self {
        Self::TypeMismatch { field: field.into(), received: received.into() }
    }
}

/// A failure raised by one of the injected signing primitives.
#[derive(Debug, Error)]
#[error("signing primitive '{primitive}' failed: {reason}")]
pub struct PrimitiveError {
    primitive: String,
    reason: String,
}

impl PrimitiveError {
    pub fn new(primitive: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { primitive: primitive.into(), reason: reason.into() }
    }
}
