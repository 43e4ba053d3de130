//! Client for the report endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::ledger::LedgerConfig;

use super::types::ReportEnvelope;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts report envelopes to the downstream consumer.
pub struct ReportSink {
    client: Client,
    url: String,
}

impl ReportSink {
    pub fn new(url: String) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Self::with_timeout(
            config.sink_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_timeout(url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit a report. Returns the endpoint's reply, as JSON when it parses.
    pub async fn submit(&self, envelope: &ReportEnvelope) -> Result<Value> {
        debug!(
            url = %self.url,
            id = %envelope.id,
            trades = envelope.data.close_trades.len(),
            "Posting report"
        );

        let response = self
            .client
            .post(&self.url)
            .json(envelope)
            .send()
            .await
            .context("Failed to post report")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Report submission failed: {} - {}", status, body);
        }

        let body = response
            .text()
            .await
            .context("Failed to read report response")?;

        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}
