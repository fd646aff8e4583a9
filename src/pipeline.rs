//! End-to-end lookup run over a record store

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{MalformedIdentifier, StoreError};
use crate::houjin::CorporateNumber;
use crate::lookup::{merge, BatchFailure, BatchFailureReason, LookupAggregator};
use crate::records::RecordStore;

/// Input row whose registration number could not be normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based position among the data rows
    pub row: usize,
    pub display_name: String,
    pub error: MalformedIdentifier,
}

/// What happened during one run
#[derive(Debug, Default)]
pub struct RunReport {
    pub rows: usize,
    /// Distinct corporate numbers sent to the registry
    pub requested: usize,
    pub batches: usize,
    pub registered: usize,
    pub skipped_rows: Vec<SkippedRow>,
    pub failures: Vec<BatchFailure>,
}

impl RunReport {
    /// No input rows were found
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Every row was looked up without a failed batch or malformed number
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.skipped_rows.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            rows: self.rows,
            requested: self.requested,
            batches: self.batches,
            registered: self.registered,
            unregistered: self.rows - self.registered,
            skipped_rows: self
                .skipped_rows
                .iter()
                .map(|s| SkippedRowSummary {
                    row: s.row + 1,
                    display_name: s.display_name.clone(),
                    error: s.error.to_string(),
                })
                .collect(),
            failed_batches: self
                .failures
                .iter()
                .map(|f| FailedBatchSummary {
                    batch: f.index + 1,
                    numbers: f.batch.numbers().iter().map(|n| n.to_string()).collect(),
                    status: match &f.reason {
                        BatchFailureReason::Request(err) => err.status(),
                        _ => None,
                    },
                    reason: f.reason.to_string(),
                })
                .collect(),
        }
    }
}

/// Serializable view of a [`RunReport`]
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub requested: usize,
    pub batches: usize,
    pub registered: usize,
    pub unregistered: usize,
    pub skipped_rows: Vec<SkippedRowSummary>,
    pub failed_batches: Vec<FailedBatchSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRowSummary {
    /// One-based data row
    pub row: usize,
    pub display_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedBatchSummary {
    /// One-based batch number
    pub batch: usize,
    pub numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub reason: String,
}

/// Read rows from `store`, look them up, and write the merged result back.
///
/// Fails only when the source is missing, the destination is locked, or the
/// store cannot be read or written. Malformed rows and failed batches are
/// reported in the returned [`RunReport`].
pub async fn run_lookup(
    store: &dyn RecordStore,
    aggregator: &LookupAggregator,
) -> Result<RunReport, StoreError> {
    store.ensure_writable()?;
    let rows = store.read_rows()?;
    tracing::info!(store = %store.describe(), rows = rows.len(), "Loaded input rows");

    let mut skipped_rows = Vec::new();
    let mut seen = HashSet::new();
    let mut identifiers: Vec<CorporateNumber> = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match row.corporate_number() {
            Ok(number) => {
                if seen.insert(number.clone()) {
                    identifiers.push(number);
                }
            }
            Err(error) => {
                tracing::warn!(
                    row = index + 1,
                    name = %row.display_name,
                    error = %error,
                    "Skipping row with malformed registration number"
                );
                skipped_rows.push(SkippedRow {
                    row: index,
                    display_name: row.display_name.clone(),
                    error,
                });
            }
        }
    }

    let outcome = aggregator.run(&identifiers).await;
    let output = merge(&rows, &outcome.table);
    store.write_rows(&output)?;

    Ok(RunReport {
        rows: rows.len(),
        requested: identifiers.len(),
        batches: outcome.batches,
        registered: output.iter().filter(|row| row.is_registered).count(),
        skipped_rows,
        failures: outcome.failures,
    })
}
