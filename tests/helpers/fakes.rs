//! In-memory registry and record store for pipeline tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use invoice_lookup::{
    Batch, InputRow, OutputRow, RawPayload, RecordStore, RegistryFetch, RequestError, StoreError,
};

/// Render a `num` response document for the given entries
pub fn corporations_xml(entries: &[(&str, &str, &str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .enumerate()
        .map(|(i, (number, name, prefecture, city, street))| {
            format!(
                "<corporation>\n<sequenceNumber>{}</sequenceNumber>\n\
                 <corporateNumber>{number}</corporateNumber>\n<process>01</process>\n\
                 <name>{name}</name>\n<prefectureName>{prefecture}</prefectureName>\n\
                 <cityName>{city}</cityName>\n<streetNumber>{street}</streetNumber>\n\
                 </corporation>\n",
                i + 1
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<corporations>\n\
         <lastUpdateDate>2024-04-01</lastUpdateDate>\n<count>{}</count>\n\
         <divideNumber>1</divideNumber>\n<divideSize>1</divideSize>\n{body}</corporations>",
        entries.len()
    )
}

/// Registry answering from a fixed set of corporations
#[derive(Default)]
pub struct FakeRegistry {
    known: HashMap<String, (String, String, String, String)>,
    failing: HashSet<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_corporation(
        mut self,
        number: &str,
        name: &str,
        prefecture: &str,
        city: &str,
        street: &str,
    ) -> Self {
        self.known.insert(
            number.to_string(),
            (name.into(), prefecture.into(), city.into(), street.into()),
        );
        self
    }

    /// Any batch containing `number` fails with HTTP 503
    pub fn failing_on(mut self, number: &str) -> Self {
        self.failing.insert(number.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryFetch for FakeRegistry {
    async fn fetch(&self, batch: &Batch) -> Result<RawPayload, RequestError> {
        let numbers: Vec<String> = batch.numbers().iter().map(|n| n.to_string()).collect();
        self.calls.lock().unwrap().push(numbers.clone());

        if numbers.iter().any(|n| self.failing.contains(n)) {
            return Err(RequestError::Status {
                status: 503,
                body: "service unavailable".into(),
            });
        }

        let entries: Vec<(&str, &str, &str, &str, &str)> = numbers
            .iter()
            .filter_map(|n| {
                self.known.get(n).map(|(name, prefecture, city, street)| {
                    (
                        n.as_str(),
                        name.as_str(),
                        prefecture.as_str(),
                        city.as_str(),
                        street.as_str(),
                    )
                })
            })
            .collect();
        Ok(RawPayload::new(corporations_xml(&entries)))
    }
}

/// Record store kept in memory
pub struct MemoryStore {
    rows: Option<Vec<InputRow>>,
    locked: bool,
    written: RefCell<Option<Vec<OutputRow>>>,
}

impl MemoryStore {
    pub fn new(rows: Vec<InputRow>) -> Self {
        Self {
            rows: Some(rows),
            locked: false,
            written: RefCell::new(None),
        }
    }

    /// Store whose source does not exist
    pub fn missing() -> Self {
        Self {
            rows: None,
            locked: false,
            written: RefCell::new(None),
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn written(&self) -> Option<Vec<OutputRow>> {
        self.written.borrow().clone()
    }
}

impl RecordStore for MemoryStore {
    fn read_rows(&self) -> Result<Vec<InputRow>, StoreError> {
        self.rows
            .clone()
            .ok_or_else(|| StoreError::SourceNotFound("memory".into()))
    }

    fn write_rows(&self, rows: &[OutputRow]) -> Result<(), StoreError> {
        self.ensure_writable()?;
        *self.written.borrow_mut() = Some(rows.to_vec());
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if self.locked {
            return Err(StoreError::OutputLocked("memory".into()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
