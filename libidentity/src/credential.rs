use crate::error::CredentialError;
use crate::types::{FieldElement, ParseFieldElementError};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// An ordered mapping of attribute names to circuit inputs.
///
/// Order matters: it is the order the attributes are hashed in and the order they are written out in. Inserting an
/// existing name replaces the value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credential {
    attributes: Vec<(String, FieldElement)>,
}

impl Credential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldElement) -> Option<FieldElement> {
        let name = name.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.attributes.push((name, value));
                None
            }
        }
    }

    /// Appends a new attribute, refusing to overwrite one that is already present.
    pub fn try_insert(&mut self, name: impl Into<String>, value: FieldElement) -> Result<(), CredentialError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(CredentialError::DuplicateAttribute(name));
        }
        self.attributes.push((name, value));
        Ok(())
    }

    pub fn with(mut self, name: impl Into<String>, value: FieldElement) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldElement> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldElement)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// The canonical byte string the nonce and challenge primitives hash.
    ///
    /// For each attribute, in order: `u32-le(name length) ‖ name ‖ value as 32 little-endian bytes`.
    pub fn message_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.attributes.len() * 56);
        for (name, value) in &self.attributes {
            out.extend_from_slice(&(name.len() as u32).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(value.as_le_bytes());
        }
        out
    }

    /// Builds a credential from an untyped JSON object.
    ///
    /// Every value must be a decimal string or a non-negative integer. The first value that is not fails the whole
    /// conversion with [`CredentialError::TypeMismatch`] naming the attribute.
    ///
    /// `serde_json` keeps only the last of repeated keys when it builds a [`Value`], so callers holding raw JSON
    /// text should deserialize a [`Credential`] directly, which rejects repeated names.
    pub fn from_json(value: &Value) -> Result<Self, CredentialError> {
        let object = value
            .as_object()
            .ok_or_else(|| CredentialError::MalformedPayload("credential must be a JSON object".to_string()))?;
        let mut credential = Self::new();
        for (name, value) in object {
            credential.try_insert(name.clone(), json_to_field_element(name, value)?)?;
        }
        Ok(credential)
    }
}

fn json_to_field_element(name: &str, value: &Value) -> Result<FieldElement, CredentialError> {
    match value {
        Value::String(text) => text.parse::<FieldElement>().map_err(|e| match e {
            ParseFieldElementError::NotDecimal => CredentialError::type_mismatch(name, "a non-numeric string"),
            ParseFieldElementError::TooWide(len) => {
                CredentialError::Length { len, max: crate::types::FIELD_ELEMENT_SIZE }
            }
        }),
        Value::Number(n) => n
            .as_u64()
            .map(FieldElement::from)
            .ok_or_else(|| CredentialError::type_mismatch(name, format!("number {n}"))),
        Value::Null => Err(CredentialError::type_mismatch(name, "null")),
        Value::Bool(_) => Err(CredentialError::type_mismatch(name, "a boolean")),
        Value::Array(_) => Err(CredentialError::type_mismatch(name, "an array")),
        Value::Object(_) => Err(CredentialError::type_mismatch(name, "an object")),
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len()))?;
        for (name, value) in &self.attributes {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CredentialVisitor;

        impl<'de> Visitor<'de> for CredentialVisitor {
            type Value = Credential;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of attribute names to decimal strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut credential = Credential::new();
                while let Some((name, value)) = access.next_entry::<String, FieldElement>()? {
                    credential.try_insert(name, value).map_err(<A::Error as serde::de::Error>::custom)?;
                }
                Ok(credential)
            }
        }

        deserializer.deserialize_map(CredentialVisitor)
    }
}

/// Anything that can be turned into the circuit's view of a credential.
///
/// Conversion happens before any cryptographic step, so a bad attribute fails fast.
pub trait CircuitInput {
    fn to_circuit_input(&self) -> Result<Credential, CredentialError>;
}

impl CircuitInput for Credential {
    fn to_circuit_input(&self) -> Result<Credential, CredentialError> {
        Ok(self.clone())
    }
}

impl CircuitInput for Value {
    fn to_circuit_input(&self) -> Result<Credential, CredentialError> {
        Credential::from_json(self)
    }
}

/// The passport attributes the verification circuit expects, in circuit order.
///
/// Text attributes hold [`encode`](crate::encoding::encode)d strings; check digits hold their digit value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportData {
    pub document_code: FieldElement,
    pub issuing_organization: FieldElement,
    pub holder_name: FieldElement,
    pub document_number: FieldElement,
    pub document_number_check_digit: FieldElement,
    pub nationality: FieldElement,
    pub date_of_birth: FieldElement,
    pub date_of_birth_check_digit: FieldElement,
    pub sex: FieldElement,
    pub expiry_date: FieldElement,
    pub expiry_date_check_digit: FieldElement,
    pub optional_data: FieldElement,
    pub optional_data_check_digit: FieldElement,
    pub composite_check_digit: FieldElement,
}

impl PassportData {
    pub fn to_credential(&self) -> Credential {
        Credential::new()
            .with("documentCode", self.document_code)
            .with("issuingOrganization", self.issuing_organization)
            .with("holderName", self.holder_name)
            .with("documentNumber", self.document_number)
            .with("documentNumberCheckDigit", self.document_number_check_digit)
            .with("nationality", self.nationality)
            .with("dateOfBirth", self.date_of_birth)
            .with("dateOfBirthCheckDigit", self.date_of_birth_check_digit)
            .with("sex", self.sex)
            .with("expiryDate", self.expiry_date)
            .with("expiryDateCheckDigit", self.expiry_date_check_digit)
            .with("optionalData", self.optional_data)
            .with("optionalDataCheckDigit", self.optional_data_check_digit)
            .with("compositeCheckDigit", self.composite_check_digit)
    }
}

impl CircuitInput for PassportData {
    fn to_circuit_input(&self) -> Result<Credential, CredentialError> {
        Ok(self.to_credential())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode;
    use serde_json::json;

    fn sample() -> Credential {
        Credential::new().with("documentCode", encode("P<").unwrap()).with("sex", encode("F").unwrap())
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut c = Credential::new().with("b", FieldElement::from(2u64)).with("a", FieldElement::from(1u64));
        assert_eq!(c.iter().map(|(n, _)| n).collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(c.insert("b", FieldElement::from(3u64)), Some(FieldElement::from(2u64)));
        assert_eq!(c.iter().map(|(n, _)| n).collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(c.get("b"), Some(&FieldElement::from(3u64)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn message_bytes_bind_names_and_order() {
        let a = Credential::new().with("x", FieldElement::from(1u64)).with("y", FieldElement::from(2u64));
        let b = Credential::new().with("y", FieldElement::from(2u64)).with("x", FieldElement::from(1u64));
        let c = Credential::new().with("x", FieldElement::from(1u64)).with("z", FieldElement::from(2u64));
        assert_ne!(a.message_bytes(), b.message_bytes());
        assert_ne!(a.message_bytes(), c.message_bytes());
        let bytes = Credential::new().with("x", FieldElement::from(1u64)).message_bytes();
        assert_eq!(bytes.len(), 4 + 1 + 32);
        assert_eq!(&bytes[..6], &[1, 0, 0, 0, b'x', 1]);
    }

    #[test]
    fn json_round_trip_keeps_order_and_decimal_strings() {
        let c = sample();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"documentCode":"15440","sex":"70"}"#);
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn repeated_attribute_names_are_rejected() {
        let err = serde_json::from_str::<Credential>(r#"{"sex":"70","documentCode":"15440","sex":"77"}"#);
        assert!(err.is_err());
        let mut c = sample();
        let err = c.try_insert("sex", FieldElement::from(77u64));
        assert!(matches!(err, Err(CredentialError::DuplicateAttribute(n)) if n == "sex"));
        assert_eq!(c, sample());
        c.try_insert("nationality", encode("UTO").unwrap()).unwrap();
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn from_json_accepts_numeric_values() {
        let c = Credential::from_json(&json!({"documentCode": "15440", "sex": 70})).unwrap();
        assert_eq!(c, sample());
    }

    #[test]
    fn from_json_names_the_non_numeric_field() {
        let input = json!({"documentCode": "15440", "holderName": "ANNA", "sex": true});
        match Credential::from_json(&input) {
            Err(CredentialError::TypeMismatch { field, .. }) => assert_eq!(field, "holderName"),
            other => panic!("expected a type mismatch, got {other:?}"),
        }
        for bad in [json!({"a": null}), json!({"a": -1}), json!({"a": 1.5}), json!({"a": [1]}), json!({"a": {}})] {
            assert!(matches!(Credential::from_json(&bad), Err(CredentialError::TypeMismatch { .. })));
        }
        assert!(matches!(Credential::from_json(&json!([1, 2])), Err(CredentialError::MalformedPayload(_))));
    }

    #[test]
    fn passport_data_uses_circuit_order() {
        let p = PassportData {
            document_code: FieldElement::from(1u64),
            issuing_organization: FieldElement::from(2u64),
            holder_name: FieldElement::from(3u64),
            document_number: FieldElement::from(4u64),
            document_number_check_digit: FieldElement::from(5u64),
            nationality: FieldElement::from(6u64),
            date_of_birth: FieldElement::from(7u64),
            date_of_birth_check_digit: FieldElement::from(8u64),
            sex: FieldElement::from(9u64),
            expiry_date: FieldElement::from(10u64),
            expiry_date_check_digit: FieldElement::from(11u64),
            optional_data: FieldElement::from(12u64),
            optional_data_check_digit: FieldElement::from(13u64),
            composite_check_digit: FieldElement::from(14u64),
        };
        let c = p.to_credential();
        let values: Vec<String> = c.iter().map(|(_, v)| v.to_string()).collect();
        assert_eq!(values, (1..=14).map(|i| i.to_string()).collect::<Vec<_>>());
        // The serde names match the credential names.
        let json = serde_json::to_value(&p).unwrap();
        let names: Vec<&str> = c.iter().map(|(n, _)| n).collect();
        for name in names {
            assert!(json.get(name).is_some(), "missing {name}");
        }
    }
}
