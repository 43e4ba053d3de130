//! Client for the execution feed (read-only).

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use backoff::ExponentialBackoff;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::ledger::LedgerConfig;
use crate::models::Execution;

use super::types::{parse_records, ExecutionRecord};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_BUDGET: Duration = Duration::from_secs(60);

/// Fetches the batch of raw executions to reconcile.
pub struct ExecutionSource {
    client: Client,
    url: String,
    retry_budget: Duration,
}

impl ExecutionSource {
    /// Create a source for the given feed URL with default settings.
    pub fn new(url: String) -> Result<Self> {
        Self::with_settings(url, DEFAULT_TIMEOUT, DEFAULT_RETRY_BUDGET)
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Self::with_settings(
            config.source_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.fetch_retry_secs),
        )
    }

    pub fn with_settings(url: String, timeout: Duration, retry_budget: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url,
            retry_budget,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and validate the execution batch.
    pub async fn fetch_executions(&self) -> Result<Vec<Execution>> {
        let records = self.fetch_records().await?;
        let count = records.len();
        let executions =
            parse_records(records).context("Execution feed returned a malformed record")?;

        debug!(records = count, "Validated execution records");
        Ok(executions)
    }

    /// Fetch the raw records, retrying connection errors and 5xx/429 responses.
    pub async fn fetch_records(&self) -> Result<Vec<ExecutionRecord>> {
        debug!(url = %self.url, "Fetching executions");

        let policy = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_budget),
            ..Default::default()
        };
        let client = &self.client;
        let url = self.url.as_str();

        backoff::future::retry(policy, || async move {
            let response = client.get(url).send().await.map_err(|e| {
                warn!(error = %e, "Execution fetch failed, retrying");
                backoff::Error::transient(anyhow::Error::new(e).context("Failed to fetch executions"))
            })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let err = anyhow!("Executions request failed: {} - {}", status, body);
                return Err(if is_retryable(status) {
                    warn!(status = %status, "Execution feed unavailable, retrying");
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                });
            }

            response
                .json::<Vec<ExecutionRecord>>()
                .await
                .context("Failed to parse executions response")
                .map_err(backoff::Error::permanent)
        })
        .await
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
