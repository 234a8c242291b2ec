//! Byte-level encodings shared by the issuer and the government signature gate.
//!
//! * [`encode`] packs a short string into a single circuit input.
//! * [`hex_to_bytes`] is the strict hex grammar used for every field of a
//!   [`GovernmentSignaturePayload`](crate::government::GovernmentSignaturePayload).
//! * [`decimal_scalar`] serializes scalars as decimal strings so large integers survive JSON.

use crate::error::CredentialError;
use crate::types::{FieldElement, FIELD_ELEMENT_SIZE};

/// Pack `text` into a [`FieldElement`].
///
/// The UTF-8 bytes are zero-padded to 32 bytes and read as a little-endian integer, so byte 0 is the least
/// significant digit. Nothing is reduced modulo the field; text longer than 32 bytes is an error, never truncated.
pub fn encode(text: &str) -> Result<FieldElement, CredentialError> {
    let bytes = text.as_bytes();
    if bytes.len() > FIELD_ELEMENT_SIZE {
        return Err(CredentialError::Length { len: bytes.len(), max: FIELD_ELEMENT_SIZE });
    }
    let mut packed = [0u8; FIELD_ELEMENT_SIZE];
    packed[..bytes.len()].copy_from_slice(bytes);
    Ok(FieldElement::from_le_bytes(packed))
}

/// The inverse of [`encode`]: strips trailing zero bytes and decodes what is left as UTF-8.
///
/// Returns `None` if the remaining bytes are not valid UTF-8. Trailing NUL characters are indistinguishable from
/// padding, so `encode` is only injective over strings that do not end in `'\0'`.
pub fn decode_text(value: &FieldElement) -> Option<String> {
    let bytes = value.as_le_bytes();
    let len = bytes.iter().rposition(|b| *b != 0).map(|i| i + 1).unwrap_or(0);
    String::from_utf8(bytes[..len].to_vec()).ok()
}

/// Decode a hex string into bytes.
///
/// An optional `0x` or `0X` prefix is stripped. The rest must be a non-empty, even-length run of hex digits in
/// either case. `field` names the offending payload field in the error.
pub fn hex_to_bytes(value: &str, field: &str) -> Result<Vec<u8>, CredentialError> {
    let digits = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).unwrap_or(value);
    if digits.is_empty() {
        return Err(CredentialError::format(field, "no hex digits"));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(CredentialError::format(field, format!("invalid character {bad:?}")));
    }
    if digits.len() % 2 != 0 {
        return Err(CredentialError::format(field, "must contain an even number of hex characters"));
    }
    hex::decode(digits).map_err(|e| CredentialError::format(field, e.to_string()))
}

/// Serde adapter writing a prime field element as a decimal string.
pub mod decimal_scalar {
    use crate::types::{parse_canonical, to_decimal};
    use ark_ff::PrimeField;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<F: PrimeField, S: Serializer>(value: &F, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_decimal(value))
    }

    pub fn deserialize<'de, F: PrimeField, D: Deserializer<'de>>(deserializer: D) -> Result<F, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_canonical(&text).ok_or_else(|| serde::de::Error::custom("expected a canonical decimal field element"))
    }
}
