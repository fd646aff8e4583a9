//! Error types for the invoice lookup pipeline
//!
//! Per-row and per-batch errors ([`MalformedIdentifier`], [`RequestError`],
//! [`ParseError`]) are recovered locally by the pipeline. Store-level errors
//! ([`StoreError`]) abort a run.

use std::path::PathBuf;

use thiserror::Error;

/// A registration number that does not yield a 13-digit corporate number
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedIdentifier {
    #[error("registration number is empty")]
    Empty,

    #[error("registration number '{input}' does not start with a letter prefix")]
    MissingPrefix { input: String },

    #[error("registration number '{input}' has {length} characters after the prefix, expected 13")]
    WrongLength { input: String, length: usize },

    #[error("registration number '{input}' contains non-digit characters")]
    NonDigit { input: String },
}

/// Failure of a single registry request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("registry returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("no application id configured for the registry API")]
    MissingCredential,
}

impl RequestError {
    /// HTTP status of the failed call, if the registry answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Registry payload that could not be decoded
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("registry returned an empty payload")]
    Empty,

    #[error("malformed registry document: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("malformed registry document: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("registry answered with <{0}> instead of <corporations>")]
    UnexpectedRoot(String),
}

/// Record source / sink errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("input source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("output destination is locked by another process: {}", .0.display())]
    OutputLocked(PathBuf),

    #[error("worksheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("failed to write workbook: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid registry base URL '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}
