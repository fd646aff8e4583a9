//! Registry response parsing

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ParseError;

use super::identifier::CorporateNumber;
use super::types::{CorporateRecord, CorporationsDocument, RawPayload};

/// Decode a registry payload into records keyed by corporate number.
///
/// A document that cannot be decoded, or whose root is not `<corporations>`,
/// fails as a whole. Individual entries without a usable corporate number or
/// name are skipped.
pub fn parse(payload: &RawPayload) -> Result<HashMap<CorporateNumber, CorporateRecord>, ParseError> {
    let body = payload.as_str().trim();
    if body.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(root) = root_element(body)? {
        if root != ROOT_ELEMENT {
            return Err(ParseError::UnexpectedRoot(root));
        }
    }

    let document: CorporationsDocument = quick_xml::de::from_str(body)?;

    if let Some(declared) = document.declared_count() {
        if declared != document.corporations.len() {
            tracing::warn!(
                declared,
                received = document.corporations.len(),
                "Registry document count does not match its entries"
            );
        }
    }

    let mut records = HashMap::with_capacity(document.corporations.len());
    for entry in &document.corporations {
        let Some(raw_number) = entry.corporate_number.as_deref() else {
            tracing::debug!(sequence = ?entry.sequence_number, "Skipping entry without corporate number");
            continue;
        };
        let corporate_number: CorporateNumber = match raw_number.parse() {
            Ok(number) => number,
            Err(err) => {
                tracing::debug!(error = %err, "Skipping entry with invalid corporate number");
                continue;
            }
        };
        let Some(name) = entry.registered_name() else {
            tracing::debug!(%corporate_number, "Skipping entry without name");
            continue;
        };

        records.insert(
            corporate_number.clone(),
            CorporateRecord {
                corporate_number,
                registered_name: name.to_string(),
                address: entry.address(),
            },
        );
    }

    Ok(records)
}

const ROOT_ELEMENT: &str = "corporations";

/// Name of the first element in the document, if there is one
fn root_element(body: &str) -> Result<Option<String>, ParseError> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event()? {
            Event::Start(tag) | Event::Empty(tag) => {
                let name = String::from_utf8_lossy(tag.local_name().as_ref()).into_owned();
                return Ok(Some(name));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
