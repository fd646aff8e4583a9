//! Invoice registration lookup
//!
//! Looks up the registered corporate name and address for invoice
//! registration numbers through the National Tax Agency corporate-number
//! Web-API and merges the results back into a CSV file or workbook.
//!
//! Pipeline: rows → [`houjin::normalize`] → [`houjin::batches`] →
//! [`houjin::RegistryFetch`] + [`houjin::parse`] per batch →
//! [`lookup::LookupAggregator`] → [`lookup::merge`] → rows.

pub mod config;
pub mod error;
pub mod houjin;
pub mod lookup;
pub mod pipeline;
pub mod records;

// Re-export commonly used types
pub use config::{AppConfig, LookupSettings, RegistryConfig};
pub use error::{ConfigError, MalformedIdentifier, ParseError, RequestError, StoreError};
pub use houjin::{
    batches, normalize, parse, Batch, CorporateNumber, CorporateRecord, HoujinClient,
    RawPayload, RegistryFetch, MAX_BATCH_SIZE,
};
pub use lookup::{
    merge, BatchFailure, BatchFailureReason, LookupAggregator, LookupOutcome, LookupTable,
};
pub use pipeline::{run_lookup, RunReport, RunSummary, SkippedRow};
pub use records::{CsvRecordStore, InputRow, OutputRow, RecordStore, XlsxRecordStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
