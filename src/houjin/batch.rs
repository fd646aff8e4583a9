//! Fixed-size batching of corporate numbers
//!
//! The registry accepts at most [`MAX_BATCH_SIZE`] numbers per request.

use std::fmt;

use serde::Serialize;

use super::identifier::CorporateNumber;

/// Registry page-size limit for the `num` endpoint
pub const MAX_BATCH_SIZE: usize = 10;

/// An ordered, non-empty group of corporate numbers sent in one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Batch(Vec<CorporateNumber>);

impl Batch {
    pub fn numbers(&self) -> &[CorporateNumber] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, number: &CorporateNumber) -> bool {
        self.0.contains(number)
    }

    /// Comma-joined form used for the `number` query parameter
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(CorporateNumber::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.joined())
    }
}

/// Lazy iterator over batches; see [`batches`]
#[derive(Debug)]
pub struct Batches<I> {
    source: I,
    size: usize,
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = CorporateNumber>,
{
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let group: Vec<CorporateNumber> = self.source.by_ref().take(self.size).collect();
        if group.is_empty() {
            None
        } else {
            Some(Batch(group))
        }
    }
}

/// Split identifiers into groups of `size`, preserving order.
///
/// The final group holds the remainder and is never empty. A `size` of zero
/// is treated as one.
pub fn batches<I>(identifiers: I, size: usize) -> Batches<I::IntoIter>
where
    I: IntoIterator<Item = CorporateNumber>,
{
    Batches {
        source: identifiers.into_iter(),
        size: size.max(1),
    }
}
