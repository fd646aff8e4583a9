//! Corporate-number API client
//!
//! HTTP client for the National Tax Agency `num` endpoint. One request per
//! batch, no retries; failures are returned to the caller as [`RequestError`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::RegistryConfig;
use crate::error::RequestError;

use super::batch::Batch;
use super::types::RawPayload;

/// `type` parameter: XML, Unicode
const RESPONSE_TYPE_XML_UNICODE: &str = "12";
/// `history` parameter: latest state only
const HISTORY_EXCLUDED: &str = "0";
const ERROR_BODY_LIMIT: usize = 200;

/// Anything that can answer a batch lookup with a raw registry payload
#[async_trait]
pub trait RegistryFetch: Send + Sync {
    async fn fetch(&self, batch: &Batch) -> Result<RawPayload, RequestError>;
}

/// Corporate-number API client
pub struct HoujinClient {
    http: Client,
    endpoint: Url,
    application_id: String,
}

impl HoujinClient {
    /// Create a client from explicit registry settings
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let endpoint = config.endpoint().context("Invalid registry endpoint")?;
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            application_id: config.application_id.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RegistryFetch for HoujinClient {
    async fn fetch(&self, batch: &Batch) -> Result<RawPayload, RequestError> {
        if self.application_id.is_empty() {
            return Err(RequestError::MissingCredential);
        }

        let numbers = batch.joined();
        tracing::debug!(size = batch.len(), numbers = %numbers, "Requesting registry batch");

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("id", self.application_id.as_str()),
                ("number", numbers.as_str()),
                ("type", RESPONSE_TYPE_XML_UNICODE),
                ("history", HISTORY_EXCLUDED),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(RawPayload::from(response.text().await?))
    }
}
