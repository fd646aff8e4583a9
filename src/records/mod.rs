//! Record sources and sinks
//!
//! The lookup pipeline only sees [`InputRow`]s and [`OutputRow`]s; where they
//! live (CSV file, xlsx workbook) is behind [`RecordStore`].

pub mod csv_store;
pub mod lock;
pub mod xlsx_store;

use serde::Serialize;

use crate::error::{MalformedIdentifier, StoreError};
use crate::houjin::CorporateNumber;

pub use csv_store::CsvRecordStore;
pub use xlsx_store::XlsxRecordStore;

/// One company to look up, as read from the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputRow {
    pub registration_number: String,
    pub display_name: String,
}

impl InputRow {
    pub fn new(registration_number: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            registration_number: registration_number.into(),
            display_name: display_name.into(),
        }
    }

    /// Corporate number derived from the registration number
    pub fn corporate_number(&self) -> Result<CorporateNumber, MalformedIdentifier> {
        CorporateNumber::from_registration_number(&self.registration_number)
    }
}

/// An input row with its registry lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    #[serde(flatten)]
    pub input: InputRow,
    pub corporate_number: Option<CorporateNumber>,
    pub registered_name: String,
    pub address: String,
    pub is_registered: bool,
}

/// Storage capability for the rows of one run
pub trait RecordStore {
    /// Read input rows (header excluded)
    fn read_rows(&self) -> Result<Vec<InputRow>, StoreError>;

    /// Persist output rows, replacing any previous result
    fn write_rows(&self, rows: &[OutputRow]) -> Result<(), StoreError>;

    /// Fail with [`StoreError::OutputLocked`] if the destination is held open elsewhere
    fn ensure_writable(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Human-readable location, for messages
    fn describe(&self) -> String;
}
