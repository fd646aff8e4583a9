//! Corporate number derivation
//!
//! An invoice registration number is `T` followed by the 13-digit corporate
//! number, optionally written with hyphens (`T1-2345-6789-0123`). The corporate
//! number is what the registry API is keyed on.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::MalformedIdentifier;

/// Number of digits in a corporate number
pub const CORPORATE_NUMBER_LEN: usize = 13;

/// Canonical 13-digit corporate number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorporateNumber(String);

impl CorporateNumber {
    /// Derive the corporate number from an invoice registration number.
    ///
    /// Hyphens are stripped wherever they appear and the leading letter is
    /// dropped. Anything that does not leave exactly 13 digits is rejected.
    pub fn from_registration_number(registration_number: &str) -> Result<Self, MalformedIdentifier> {
        let trimmed = registration_number.trim();
        let stripped: String = trimmed.chars().filter(|c| *c != '-').collect();

        let mut chars = stripped.chars();
        match chars.next() {
            None => return Err(MalformedIdentifier::Empty),
            Some(prefix) if !prefix.is_ascii_alphabetic() => {
                return Err(MalformedIdentifier::MissingPrefix {
                    input: trimmed.to_string(),
                })
            }
            Some(_) => {}
        }

        validate_digits(chars.as_str(), trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derive the corporate number for a registration number
pub fn normalize(registration_number: &str) -> Result<CorporateNumber, MalformedIdentifier> {
    CorporateNumber::from_registration_number(registration_number)
}

fn validate_digits(body: &str, input: &str) -> Result<CorporateNumber, MalformedIdentifier> {
    let length = body.chars().count();
    if length != CORPORATE_NUMBER_LEN {
        return Err(MalformedIdentifier::WrongLength {
            input: input.to_string(),
            length,
        });
    }
    if !body.chars().all(|c| c.is_ascii_digit()) {
        return Err(MalformedIdentifier::NonDigit {
            input: input.to_string(),
        });
    }
    Ok(CorporateNumber(body.to_string()))
}

/// Parses an already-canonical corporate number (no prefix, no hyphens)
impl FromStr for CorporateNumber {
    type Err = MalformedIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MalformedIdentifier::Empty);
        }
        validate_digits(trimmed, trimmed)
    }
}

impl fmt::Display for CorporateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CorporateNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for CorporateNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
