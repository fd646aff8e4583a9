//! Runtime configuration
//!
//! Settings come from an optional YAML file, then environment overrides
//! (after `.env` is loaded by the binary). The resulting values are passed
//! explicitly to the registry client and aggregator.
//!
//! ```yaml
//! registry:
//!   application_id: "KXXXXXXXXXXXX"
//!   base_url: "https://api.houjin-bangou.nta.go.jp"
//!   api_version: "4"
//!   timeout_secs: 30
//! lookup:
//!   batch_size: 10
//!   concurrency: 1
//!   run_timeout_secs: 600
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::houjin::batch::MAX_BATCH_SIZE;

pub const DEFAULT_API_BASE: &str = "https://api.houjin-bangou.nta.go.jp";
pub const DEFAULT_API_VERSION: &str = "4";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const APP_ID_ENV: &str = "HOUJIN_BANGOU_APP_ID";
pub const API_BASE_ENV: &str = "HOUJIN_BANGOU_API_BASE";
pub const API_VERSION_ENV: &str = "HOUJIN_BANGOU_API_VERSION";
pub const TIMEOUT_ENV: &str = "HOUJIN_BANGOU_TIMEOUT_SECS";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub lookup: LookupSettings,
}

/// Connection settings for the corporate-number API
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Application id issued by the National Tax Agency (`id` parameter)
    pub application_id: String,
    pub base_url: String,
    pub api_version: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            base_url: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RegistryConfig {
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = application_id.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        !self.application_id.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{base_url}/{api_version}/num`
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let raw = format!(
            "{}/{}/num",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        );
        Url::parse(&raw).map_err(|source| ConfigError::InvalidBaseUrl {
            value: self.base_url.clone(),
            source,
        })
    }
}

/// Batching and scheduling of registry requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    pub batch_size: usize,
    /// Batches in flight at once; 1 keeps requests strictly sequential
    pub concurrency: usize,
    /// Deadline for the whole fetch phase
    pub run_timeout_secs: Option<u64>,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            concurrency: 1,
            run_timeout_secs: None,
        }
    }
}

impl LookupSettings {
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply `HOUJIN_BANGOU_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup(APP_ID_ENV) {
            self.registry.application_id = id;
        }
        if let Some(base) = lookup(API_BASE_ENV) {
            self.registry.base_url = base;
        }
        if let Some(version) = lookup(API_VERSION_ENV) {
            self.registry.api_version = version;
        }
        if let Some(secs) = lookup(TIMEOUT_ENV) {
            match secs.trim().parse() {
                Ok(secs) => self.registry.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %secs, "Ignoring invalid {}", TIMEOUT_ENV),
            }
        }
        if !self.registry.has_credential() {
            tracing::warn!(
                "{} is not set; every registry request will fail",
                APP_ID_ENV
            );
        }
    }
}
