//! Time-bounded patient cache
//!
//! Patient demographics are fetched once per reference and reused until the
//! entry expires.

use crate::adapters::source::MeasurementSource;
use crate::domain::ids::PatientRef;
use crate::domain::{Patient, Result};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

const MAX_PATIENTS: u64 = 10_000;

/// Caching front for [`MeasurementSource::fetch_patient`]
#[derive(Clone)]
pub struct PatientCache {
    source: Arc<dyn MeasurementSource>,
    cache: Cache<String, Patient>,
}

impl PatientCache {
    pub fn new(source: Arc<dyn MeasurementSource>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(MAX_PATIENTS)
            .build();

        Self { source, cache }
    }

    /// Cached patient, fetching from the source on a miss
    ///
    /// Failed fetches are not cached.
    pub async fn get(&self, reference: &PatientRef) -> Result<Patient> {
        if let Some(patient) = self.cache.get(reference.as_str()).await {
            tracing::debug!(patient = %reference, "Patient cache hit");
            return Ok(patient);
        }

        tracing::debug!(patient = %reference, "Patient cache miss");
        let patient = self.source.fetch_patient(reference).await?;
        self.cache
            .insert(reference.as_str().to_string(), patient.clone())
            .await;
        Ok(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::source::ClinicianClient;
    use crate::config::{secret_string, RetryConfig, SourceConfig};

    fn source(url: &str) -> Arc<dyn MeasurementSource> {
        Arc::new(
            ClinicianClient::new(SourceConfig {
                url: url.to_string(),
                key: "k".to_string(),
                secret: secret_string("s".to_string()),
                batch_size: 10,
                timeout_seconds: 5,
                tls_verify: true,
                lookback_hours: 2,
                retry: RetryConfig {
                    max_retries: 1,
                    initial_delay_ms: 1,
                    max_delay_ms: 1,
                    backoff_multiplier: 1.0,
                },
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/patients/1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uniqueId": "2512484916"}"#)
            .expect(1)
            .create_async()
            .await;

        let cache = PatientCache::new(source(&server.url()), Duration::from_secs(3600));
        let reference = PatientRef::new(format!("{}/patients/1", server.url())).unwrap();

        let first = cache.get(&reference).await.unwrap();
        let second = cache.get(&reference).await.unwrap();

        assert_eq!(first, second);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/patients/2")
            .with_status(404)
            .expect(2)
            .create_async()
            .await;

        let cache = PatientCache::new(source(&server.url()), Duration::from_secs(3600));
        let reference = PatientRef::new(format!("{}/patients/2", server.url())).unwrap();

        assert!(cache.get(&reference).await.is_err());
        assert!(cache.get(&reference).await.is_err());
        mock.assert_async().await;
    }
}
