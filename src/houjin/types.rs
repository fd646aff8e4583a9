//! Corporate-number API response types
//!
//! Mapping of the XML (`type=12`) document returned by the `num` endpoint.
//! Only the fields the lookup uses are declared; the rest are ignored.
//!
//! Reference: https://www.houjin-bangou.nta.go.jp/webapi/

use serde::Deserialize;

use super::identifier::CorporateNumber;

/// Raw response body of one registry request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(String);

impl RawPayload {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RawPayload {
    fn from(body: String) -> Self {
        Self(body)
    }
}

/// `<corporations>` root element
#[derive(Debug, Clone, Deserialize)]
pub struct CorporationsDocument {
    #[serde(rename = "lastUpdateDate", default)]
    pub last_update_date: Option<String>,
    #[serde(default)]
    pub count: Option<String>,
    #[serde(rename = "divideNumber", default)]
    pub divide_number: Option<String>,
    #[serde(rename = "divideSize", default)]
    pub divide_size: Option<String>,
    #[serde(rename = "corporation", default)]
    pub corporations: Vec<CorporationEntry>,
}

impl CorporationsDocument {
    /// Entry count announced in the document header
    pub fn declared_count(&self) -> Option<usize> {
        self.count.as_deref().and_then(|c| c.trim().parse().ok())
    }
}

/// One `<corporation>` entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorporationEntry {
    #[serde(rename = "sequenceNumber", default)]
    pub sequence_number: Option<String>,
    #[serde(rename = "corporateNumber", default)]
    pub corporate_number: Option<String>,
    #[serde(default)]
    pub process: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "prefectureName", default)]
    pub prefecture_name: Option<String>,
    #[serde(rename = "cityName", default)]
    pub city_name: Option<String>,
    #[serde(rename = "streetNumber", default)]
    pub street_number: Option<String>,
    #[serde(rename = "postCode", default)]
    pub post_code: Option<String>,
}

impl CorporationEntry {
    /// Registered address: prefecture, city and street joined without separator
    pub fn address(&self) -> String {
        [&self.prefecture_name, &self.city_name, &self.street_number]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .collect()
    }

    /// Name, if present and not blank
    pub fn registered_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Corporate name and address as registered with the authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorporateRecord {
    pub corporate_number: CorporateNumber,
    pub registered_name: String,
    pub address: String,
}
