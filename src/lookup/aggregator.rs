//! Lookup Aggregator
//!
//! Drives batching, fetching and parsing across all identifiers of a run and
//! folds the successful batches into one [`LookupTable`]. A failed batch is
//! recorded and skipped; it never aborts the run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;

use crate::config::LookupSettings;
use crate::error::{ParseError, RequestError};
use crate::houjin::{
    batches, parse, Batch, CorporateNumber, CorporateRecord, RegistryFetch, MAX_BATCH_SIZE,
};

use super::table::LookupTable;

type BatchResult = Result<HashMap<CorporateNumber, CorporateRecord>, BatchFailureReason>;

/// Why a batch produced no records
#[derive(Debug)]
pub enum BatchFailureReason {
    Request(RequestError),
    Parse(ParseError),
    /// The run deadline passed before the batch completed
    Cancelled { in_flight: bool },
}

impl fmt::Display for BatchFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::Cancelled { in_flight: true } => write!(f, "cancelled while in flight"),
            Self::Cancelled { in_flight: false } => write!(f, "cancelled before start"),
        }
    }
}

/// A batch that failed, with the identifiers it carried
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the batch within the run
    pub index: usize,
    pub batch: Batch,
    pub reason: BatchFailureReason,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch {} {}: {}", self.index + 1, self.batch, self.reason)
    }
}

/// Result of one aggregation run
#[derive(Debug, Default)]
pub struct LookupOutcome {
    pub table: LookupTable,
    /// Failed batches in batch order
    pub failures: Vec<BatchFailure>,
    /// Number of batches the identifiers were split into
    pub batches: usize,
}

impl LookupOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Identifiers whose batch failed
    pub fn failed_numbers(&self) -> impl Iterator<Item = &CorporateNumber> {
        self.failures.iter().flat_map(|f| f.batch.numbers())
    }
}

pub struct LookupAggregator {
    client: Arc<dyn RegistryFetch>,
    batch_size: usize,
    concurrency: usize,
    run_timeout: Option<Duration>,
}

impl LookupAggregator {
    pub fn new(client: Arc<dyn RegistryFetch>) -> Self {
        Self {
            client,
            batch_size: MAX_BATCH_SIZE,
            concurrency: 1,
            run_timeout: None,
        }
    }

    pub fn from_settings(client: Arc<dyn RegistryFetch>, settings: &LookupSettings) -> Self {
        let aggregator = Self::new(client)
            .with_batch_size(settings.batch_size)
            .with_concurrency(settings.concurrency);
        match settings.run_timeout() {
            Some(timeout) => aggregator.with_run_timeout(timeout),
            None => aggregator,
        }
    }

    /// Numbers per request, clamped to `1..=MAX_BATCH_SIZE`
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Maximum batches in flight at once (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Deadline for the whole run; unfinished batches are cancelled when it passes
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Look up every identifier and collect the results.
    ///
    /// Batch results are applied in batch order, so the table does not depend
    /// on the order in which concurrent requests complete.
    pub async fn run(&self, identifiers: &[CorporateNumber]) -> LookupOutcome {
        tracing::info!(
            identifiers = identifiers.len(),
            batch_size = self.batch_size,
            concurrency = self.concurrency,
            "Starting registry lookup"
        );

        let mut pending = batches(identifiers.iter().cloned(), self.batch_size).enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut started: BTreeMap<usize, Batch> = BTreeMap::new();
        let mut settled: BTreeMap<usize, (Batch, BatchResult)> = BTreeMap::new();

        let deadline_at = self.run_timeout.map(|timeout| Instant::now() + timeout);
        let deadline = async move {
            match deadline_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);
        let mut timed_out = false;

        loop {
            while in_flight.len() < self.concurrency {
                let Some((index, batch)) = pending.next() else {
                    break;
                };
                started.insert(index, batch.clone());
                in_flight.push(self.fetch_batch(index, batch));
            }
            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                Some((index, batch, result)) = in_flight.next() => {
                    started.remove(&index);
                    settled.insert(index, (batch, result));
                }
                _ = &mut deadline => {
                    timed_out = true;
                    break;
                }
            }
        }
        // Dropping the set aborts any request still in flight
        drop(in_flight);

        if timed_out {
            tracing::warn!(
                in_flight = started.len(),
                "Lookup deadline reached, cancelling unfinished batches"
            );
            for (index, batch) in started {
                settled.insert(
                    index,
                    (batch, Err(BatchFailureReason::Cancelled { in_flight: true })),
                );
            }
            for (index, batch) in pending {
                settled.insert(
                    index,
                    (batch, Err(BatchFailureReason::Cancelled { in_flight: false })),
                );
            }
        }

        let mut outcome = LookupOutcome {
            batches: settled.len(),
            ..Default::default()
        };
        for (index, (batch, result)) in settled {
            match result {
                Ok(records) => outcome.table.extend(records.into_values()),
                Err(reason) => outcome.failures.push(BatchFailure {
                    index,
                    batch,
                    reason,
                }),
            }
        }

        tracing::info!(
            batches = outcome.batches,
            found = outcome.table.len(),
            failed = outcome.failures.len(),
            "Registry lookup finished"
        );
        outcome
    }

    async fn fetch_batch(&self, index: usize, batch: Batch) -> (usize, Batch, BatchResult) {
        let result = match self.client.fetch(&batch).await {
            Ok(payload) => parse(&payload).map_err(BatchFailureReason::Parse),
            Err(err) => Err(BatchFailureReason::Request(err)),
        };

        match &result {
            Ok(records) => tracing::info!(
                batch = index + 1,
                requested = batch.len(),
                found = records.len(),
                "Fetched registry batch"
            ),
            Err(reason) => tracing::warn!(
                batch = index + 1,
                numbers = %batch,
                error = %reason,
                "Registry batch failed"
            ),
        }

        (index, batch, result)
    }
}
