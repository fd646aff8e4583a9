//! National Tax Agency corporate-number ("houjin bangou") integration
//!
//! This module provides:
//! - Corporate number derivation from invoice registration numbers
//! - Fixed-size batching for the `num` endpoint
//! - Client for fetching batches from the Web-API
//! - Response types and parser for the XML payload

pub mod batch;
pub mod client;
pub mod identifier;
pub mod parser;
pub mod types;

pub use batch::{batches, Batch, Batches, MAX_BATCH_SIZE};
pub use client::{HoujinClient, RegistryFetch};
pub use identifier::{normalize, CorporateNumber};
pub use parser::parse;
pub use types::{CorporateRecord, CorporationEntry, CorporationsDocument, RawPayload};
