//! Machine-readable zone parsing for TD3 (passport book) documents, per ICAO Doc 9303 part 4.
//!
//! A TD3 MRZ is two lines of 44 characters drawn from `0-9`, `A-Z` and the filler `<`. The government signature
//! covers these 88 characters, and the parsed fields become the [`PassportData`] that the issuer re-signs.

use crate::credential::PassportData;
use crate::encoding::encode;
use crate::error::CredentialError;
use crate::types::FieldElement;
use log::*;
use std::ops::Range;
use thiserror::Error;

pub const MRZ_LINE_LENGTH: usize = 44;
pub const FILLER: char = '<';

const LINE1_DOCUMENT_CODE: Range<usize> = 0..2;
const LINE1_ISSUING_ORGANIZATION: Range<usize> = 2..5;
const LINE1_NAME: Range<usize> = 5..44;
const LINE2_DOCUMENT_NUMBER: Range<usize> = 0..9;
const LINE2_DOCUMENT_NUMBER_CHECK: usize = 9;
const LINE2_NATIONALITY: Range<usize> = 10..13;
const LINE2_DATE_OF_BIRTH: Range<usize> = 13..19;
const LINE2_DATE_OF_BIRTH_CHECK: usize = 19;
const LINE2_SEX: Range<usize> = 20..21;
const LINE2_EXPIRY_DATE: Range<usize> = 21..27;
const LINE2_EXPIRY_DATE_CHECK: usize = 27;
const LINE2_OPTIONAL_DATA: Range<usize> = 28..42;
const LINE2_OPTIONAL_DATA_CHECK: usize = 42;
const LINE2_COMPOSITE_CHECK: usize = 43;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MrzError {
    #[error("expected two 44-character lines, found {0} bytes")]
    Layout(usize),
    #[error("line {line} is {found} characters long, expected 44")]
    LineLength { line: usize, found: usize },
    #[error("line {line} has invalid character {character:?} at position {position}")]
    InvalidCharacter { line: usize, position: usize, character: char },
    #[error("check digit for {field} is {found:?}, expected {expected}")]
    CheckDigit { field: &'static str, expected: u8, found: char },
}

/// A validated TD3 machine-readable zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mrz {
    line1: String,
    line2: String,
}

impl Mrz {
    /// Parses the two MRZ lines and validates every check digit.
    pub fn parse_td3(line1: &str, line2: &str) -> Result<Self, MrzError> {
        validate_line(1, line1)?;
        validate_line(2, line2)?;
        let mrz = Self { line1: line1.to_string(), line2: line2.to_string() };
        mrz.verify_check_digits()?;
        trace!("Parsed TD3 MRZ for document {}", mrz.document_number());
        Ok(mrz)
    }

    /// Parses the byte layout covered by the government signature: the 88 characters of both lines, optionally
    /// separated by a single `\n`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MrzError> {
        let (line1, line2) = match bytes.len() {
            88 => (&bytes[..MRZ_LINE_LENGTH], &bytes[MRZ_LINE_LENGTH..]),
            89 if bytes[MRZ_LINE_LENGTH] == b'\n' => (&bytes[..MRZ_LINE_LENGTH], &bytes[MRZ_LINE_LENGTH + 1..]),
            n => return Err(MrzError::Layout(n)),
        };
        // Bytes map one-to-one onto chars so that non-ASCII input is reported with its position.
        let line1: String = line1.iter().map(|b| char::from(*b)).collect();
        let line2: String = line2.iter().map(|b| char::from(*b)).collect();
        Self::parse_td3(&line1, &line2)
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn line2(&self) -> &str {
        &self.line2
    }

    pub fn document_code(&self) -> &str {
        &self.line1[LINE1_DOCUMENT_CODE]
    }

    pub fn issuing_organization(&self) -> &str {
        &self.line1[LINE1_ISSUING_ORGANIZATION]
    }

    /// The name field with its trailing fillers removed. The full field is 39 characters, which does not fit in a
    /// single circuit input.
    pub fn holder_name(&self) -> &str {
        self.line1[LINE1_NAME].trim_end_matches(FILLER)
    }

    pub fn document_number(&self) -> &str {
        &self.line2[LINE2_DOCUMENT_NUMBER]
    }

    pub fn nationality(&self) -> &str {
        &self.line2[LINE2_NATIONALITY]
    }

    pub fn date_of_birth(&self) -> &str {
        &self.line2[LINE2_DATE_OF_BIRTH]
    }

    pub fn sex(&self) -> &str {
        &self.line2[LINE2_SEX]
    }

    pub fn expiry_date(&self) -> &str {
        &self.line2[LINE2_EXPIRY_DATE]
    }

    pub fn optional_data(&self) -> &str {
        &self.line2[LINE2_OPTIONAL_DATA]
    }

    fn line2_digit(&self, position: usize) -> u8 {
        self.line2[position..].chars().next().map(char_value).unwrap_or(0) as u8
    }

    pub fn to_passport_data(&self) -> Result<PassportData, CredentialError> {
        let digit = |position| FieldElement::from(u64::from(self.line2_digit(position)));
        Ok(PassportData {
            document_code: encode(self.document_code())?,
            issuing_organization: encode(self.issuing_organization())?,
            holder_name: encode(self.holder_name())?,
            document_number: encode(self.document_number())?,
            document_number_check_digit: digit(LINE2_DOCUMENT_NUMBER_CHECK),
            nationality: encode(self.nationality())?,
            date_of_birth: encode(self.date_of_birth())?,
            date_of_birth_check_digit: digit(LINE2_DATE_OF_BIRTH_CHECK),
            sex: encode(self.sex())?,
            expiry_date: encode(self.expiry_date())?,
            expiry_date_check_digit: digit(LINE2_EXPIRY_DATE_CHECK),
            optional_data: encode(self.optional_data())?,
            optional_data_check_digit: digit(LINE2_OPTIONAL_DATA_CHECK),
            composite_check_digit: digit(LINE2_COMPOSITE_CHECK),
        })
    }

    fn verify_check_digits(&self) -> Result<(), MrzError> {
        let l2 = &self.line2;
        let composite = format!("{}{}{}", &l2[0..10], &l2[13..20], &l2[21..43]);
        let checks: [(&'static str, &str, usize); 5] = [
            ("document number", self.document_number(), LINE2_DOCUMENT_NUMBER_CHECK),
            ("date of birth", self.date_of_birth(), LINE2_DATE_OF_BIRTH_CHECK),
            ("expiry date", self.expiry_date(), LINE2_EXPIRY_DATE_CHECK),
            ("optional data", self.optional_data(), LINE2_OPTIONAL_DATA_CHECK),
            ("composite", &composite, LINE2_COMPOSITE_CHECK),
        ];
        for (field, data, position) in checks {
            let expected = check_digit(data);
            let found = l2[position..].chars().next().unwrap_or(FILLER);
            if u32::from(expected) != char_value(found) {
                debug!("MRZ check digit mismatch for {field}: expected {expected}, found {found}");
                return Err(MrzError::CheckDigit { field, expected, found });
            }
        }
        Ok(())
    }
}

/// The ICAO 9303 check digit: weights 7, 3, 1 repeating, sum modulo 10.
pub fn check_digit(data: &str) -> u8 {
    const WEIGHTS: [u32; 3] = [7, 3, 1];
    let sum: u32 = data.chars().zip(WEIGHTS.iter().cycle()).map(|(c, w)| char_value(c) * w).sum();
    (sum % 10) as u8
}

/// `0-9` map to their value, `A-Z` to 10–35 and the filler to 0.
fn char_value(c: char) -> u32 {
    match c {
        '0'..='9' => c as u32 - '0' as u32,
        'A'..='Z' => c as u32 - 'A' as u32 + 10,
        _ => 0,
    }
}

fn validate_line(line: usize, text: &str) -> Result<(), MrzError> {
    let found = text.chars().count();
    if found != MRZ_LINE_LENGTH {
        return Err(MrzError::LineLength { line, found });
    }
    match text.chars().enumerate().find(|(_, c)| !(c.is_ascii_digit() || c.is_ascii_uppercase() || *c == FILLER)) {
        Some((position, character)) => Err(MrzError::InvalidCharacter { line, position, character }),
        None => Ok(()),
    }
}
