//! Batch lookup: aggregation of registry results and merging them onto rows

pub mod aggregator;
pub mod merge;
pub mod table;

pub use aggregator::{BatchFailure, BatchFailureReason, LookupAggregator, LookupOutcome};
pub use merge::merge;
pub use table::LookupTable;
