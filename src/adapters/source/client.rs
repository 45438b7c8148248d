//! HTTP client for the clinician measurement API
//!
//! Every request carries `Authorization: Basic base64(key:secret)`.
//! Transport failures and 5xx answers are retried with exponential backoff.

use super::models::MeasurementPage;
use super::MeasurementSource;
use crate::config::SourceConfig;
use crate::domain::ids::{MeasurementRef, PatientRef};
use crate::domain::{Measurement, Patient, Result, SourceError, VitexError};
use crate::log_retry_attempt;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Measurement source backed by the clinician REST API
///
/// # Example
///
/// ```no_run
/// use vitex::adapters::source::{ClinicianClient, MeasurementSource};
/// # fn example(config: vitex::config::SourceConfig) -> vitex::domain::Result<()> {
/// let client = ClinicianClient::new(config)?;
/// assert_eq!(client.page_size(), 100);
/// # Ok(())
/// # }
/// ```
pub struct ClinicianClient {
    client: Client,
    base_url: String,
    auth_header: String,
    config: SourceConfig,
}

impl ClinicianClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            VitexError::Configuration(format!("Failed to build source HTTP client: {e}"))
        })?;

        let credentials = format!(
            "{}:{}",
            config.key,
            config.secret.expose_secret().as_ref()
        );
        let auth_header = format!(
            "Basic {}",
            general_purpose::STANDARD.encode(credentials.as_bytes())
        );

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            auth_header,
            config,
        })
    }

    /// Listing URL for one page
    fn measurements_url(&self, from: DateTime<Utc>, offset: usize) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/measurements", self.base_url))
            .map_err(|e| VitexError::Configuration(format!("Invalid source URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("from", &from.to_rfc3339_opts(SecondsFormat::Secs, true))
            .append_pair("ignored", "false")
            .append_pair("offset", &offset.to_string())
            .append_pair("max", &self.config.batch_size.to_string());

        Ok(url)
    }

    /// GET a JSON document
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("GET {url} failed: {e}")))?;

        match resp.status() {
            status if status.is_success() => resp
                .json::<T>()
                .await
                .map_err(|e| SourceError::InvalidResponse(e.to_string()).into()),
            StatusCode::NOT_FOUND => Err(SourceError::NotFound(url.to_string()).into()),
            status => {
                let body = resp.text().await.unwrap_or_else(|e| {
                tracing::warn!(url = %url, error = %e, "Failed to read health check body");
                String::new()
            });
                Err(SourceError::Status {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                }
                .into())
            }
        }
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries || !is_retryable(&e) {
                        return Err(e);
                    }

                    let delay_ms = backoff_delay_ms(
                        self.config.retry.initial_delay_ms,
                        self.config.retry.backoff_multiplier,
                        self.config.retry.max_delay_ms,
                        attempt,
                    );

                    log_retry_attempt!(attempt, max_retries, delay_ms, e);

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

/// Transport failures and server-side errors are worth another attempt
fn is_retryable(error: &VitexError) -> bool {
    match error {
        VitexError::Source(SourceError::Unavailable(_)) => true,
        VitexError::Source(SourceError::Status { status, .. }) => *status >= 500,
        _ => false,
    }
}

/// Delay before retry number `attempt` (1-based)
fn backoff_delay_ms(initial_ms: u64, multiplier: f64, max_ms: u64, attempt: usize) -> u64 {
    let factor = multiplier.powf(attempt.saturating_sub(1) as f64);
    let delay = (initial_ms as f64 * factor) as u64;
    delay.min(max_ms)
}

#[async_trait]
impl MeasurementSource for ClinicianClient {
    async fn fetch_measurements(
        &self,
        since: DateTime<Utc>,
        offset: usize,
    ) -> Result<MeasurementPage> {
        let from = ChronoDuration::try_hours(self.config.lookback_hours)
            .and_then(|lookback| since.checked_sub_signed(lookback))
            .ok_or_else(|| {
                VitexError::Configuration(format!(
                    "source.lookback_hours {} moves the listing window out of range",
                    self.config.lookback_hours
                ))
            })?;
        let url = self.measurements_url(from, offset)?;

        tracing::debug!(
            url = %url,
            since = %since,
            offset = offset,
            batch_size = self.config.batch_size,
            "Fetching measurement page"
        );

        let page: MeasurementPage = self
            .retry_request(|| self.get_json(url.as_str()))
            .await
            .map_err(|e| match e {
                VitexError::Source(SourceError::Unavailable(_))
                | VitexError::Source(SourceError::InvalidResponse(_)) => e,
                other => SourceError::Unavailable(other.to_string()).into(),
            })?;

        tracing::debug!(
            total = page.total,
            max = page.max,
            returned = page.results.len(),
            "Fetched measurement page"
        );

        Ok(page)
    }

    async fn fetch_measurement(&self, reference: &MeasurementRef) -> Result<Measurement> {
        tracing::debug!(measurement = %reference, "Fetching measurement");
        self.retry_request(|| self.get_json(reference.as_str()))
            .await
    }

    async fn fetch_patient(&self, reference: &PatientRef) -> Result<Patient> {
        tracing::debug!(patient = %reference, "Fetching patient");
        self.retry_request(|| self.get_json(reference.as_str()))
            .await
    }

    async fn check_health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        tracing::debug!(url = %url, "Checking source health");

        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("GET {url} failed: {e}")))?;

        if resp.status() != StatusCode::OK {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_else(|e| {
                tracing::warn!(url = %url, error = %e, "Failed to read health check body");
                String::new()
            });
            return Err(SourceError::Status {
                status,
                message: format!("health check on {url} answered: {body}"),
            }
            .into());
        }

        Ok(())
    }

    fn page_size(&self) -> usize {
        self.config.batch_size
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}
