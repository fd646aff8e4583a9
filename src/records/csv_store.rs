//! CSV record store
//!
//! Input: header row, then `事業者名,登録番号` per line.
//! Output: one line per input row with the lookup result appended.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::StoreError;

use super::{lock, InputRow, OutputRow, RecordStore};

pub const DEFAULT_SOURCE: &str = "csv/target__corporations.csv";
pub const DEFAULT_DESTINATION: &str = "csv/fetch_result.csv";

const NAME_COLUMN: usize = 0;
const REGISTRATION_COLUMN: usize = 1;

const REGISTERED_MARK: &str = "有";

const HEADER: [&str; 6] = [
    "登録番号",
    "事業者名",
    "法人番号",
    "国税庁登録名",
    "住所",
    "登録有無",
];

/// Reads rows from one CSV file and writes results to another
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    source: PathBuf,
    destination: PathBuf,
}

impl CsvRecordStore {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl Default for CsvRecordStore {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE, DEFAULT_DESTINATION)
    }
}

/// Fields in `HEADER` order
#[derive(Serialize)]
struct CsvOutputRecord<'a> {
    registration_number: &'a str,
    display_name: &'a str,
    corporate_number: &'a str,
    registered_name: &'a str,
    address: &'a str,
    registered: &'a str,
}

impl<'a> From<&'a OutputRow> for CsvOutputRecord<'a> {
    fn from(row: &'a OutputRow) -> Self {
        Self {
            registration_number: &row.input.registration_number,
            display_name: &row.input.display_name,
            corporate_number: row.corporate_number.as_ref().map_or("", |n| n.as_str()),
            registered_name: &row.registered_name,
            address: &row.address,
            registered: if row.is_registered { REGISTERED_MARK } else { "" },
        }
    }
}

impl RecordStore for CsvRecordStore {
    fn read_rows(&self) -> Result<Vec<InputRow>, StoreError> {
        if !self.source.exists() {
            return Err(StoreError::SourceNotFound(self.source.clone()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.source)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let display_name = record.get(NAME_COLUMN).unwrap_or_default().trim();
            let registration_number = record.get(REGISTRATION_COLUMN).unwrap_or_default().trim();
            if display_name.is_empty() && registration_number.is_empty() {
                continue;
            }
            rows.push(InputRow::new(registration_number, display_name));
        }

        tracing::info!(path = %self.source.display(), rows = rows.len(), "Read CSV rows");
        Ok(rows)
    }

    fn write_rows(&self, rows: &[OutputRow]) -> Result<(), StoreError> {
        self.ensure_writable()?;
        if let Some(parent) = self.destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.destination)?;
        writer.write_record(HEADER)?;
        for row in rows {
            writer.serialize(CsvOutputRecord::from(row))?;
        }
        writer.flush()?;

        tracing::info!(path = %self.destination.display(), rows = rows.len(), "Wrote CSV result");
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if lock::is_locked(&self.destination) {
            return Err(StoreError::OutputLocked(self.destination.clone()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} -> {}", self.source.display(), self.destination.display())
    }
}
