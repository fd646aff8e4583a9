//! Lookup table accumulated over one run

use std::collections::hash_map::{self, HashMap};

use crate::houjin::{CorporateNumber, CorporateRecord};

/// Corporate records keyed by corporate number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    records: HashMap<CorporateNumber, CorporateRecord>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing (and returning) any previous one for the same number
    pub fn insert(&mut self, record: CorporateRecord) -> Option<CorporateRecord> {
        self.records.insert(record.corporate_number.clone(), record)
    }

    pub fn get(&self, number: &CorporateNumber) -> Option<&CorporateRecord> {
        self.records.get(number)
    }

    pub fn contains(&self, number: &CorporateNumber) -> bool {
        self.records.contains_key(number)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> hash_map::Values<'_, CorporateNumber, CorporateRecord> {
        self.records.values()
    }
}

impl Extend<CorporateRecord> for LookupTable {
    fn extend<T: IntoIterator<Item = CorporateRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<CorporateRecord> for LookupTable {
    fn from_iter<T: IntoIterator<Item = CorporateRecord>>(iter: T) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}
