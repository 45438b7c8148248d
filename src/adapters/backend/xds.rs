//! OIO XDS self-monitoring backend
//!
//! Measurements become `SelfMonitoringSample` documents posted as JSON to an
//! XDS document generator.

use super::cache::PatientCache;
use super::models::{XdsErrorResponse, XdsGeneratorRequest};
use super::traits::{ExportBackend, ExportPayload};
use crate::adapters::source::MeasurementSource;
use crate::config::ExportConfig;
use crate::core::mapping::{ReportBuilder, TypeRegistry};
use crate::domain::ids::PatientRef;
use crate::domain::{
    DeliveryError, ExportState, MappingError, Measurement, Result, VitexError,
};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Statuses above this are rejections
const ERROR_THRESHOLD: u16 = 400;

/// Backend posting to an OIO XDS generator
pub struct XdsBackend {
    client: Client,
    url: String,
    health_check_url: String,
    created_by: String,
    builder: ReportBuilder,
    source: Arc<dyn MeasurementSource>,
    patients: PatientCache,
}

impl XdsBackend {
    /// Create a backend with the standard type registry
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ExportConfig, source: Arc<dyn MeasurementSource>) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.oioxds.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if config.oioxds.skip_tls_verify {
            tracing::warn!("TLS verification disabled for the XDS generator");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            VitexError::Configuration(format!("Failed to build XDS HTTP client: {e}"))
        })?;

        let patients = PatientCache::new(
            Arc::clone(&source),
            Duration::from_secs(config.patient_cache_ttl_seconds),
        );

        Ok(Self {
            client,
            url: config.oioxds.url.clone(),
            health_check_url: config.oioxds.health_check_url.clone(),
            created_by: config.created_by.clone(),
            builder: ReportBuilder::new(TypeRegistry::standard(), config.device_provenance),
            source,
            patients,
        })
    }

    /// Patient link for a measurement
    ///
    /// Falls back to the stored link, then to a fresh copy of the measurement.
    async fn patient_reference(
        &self,
        measurement: &Measurement,
        state: &ExportState,
    ) -> Result<PatientRef> {
        if let Some(link) = measurement.patient_reference() {
            return PatientRef::new(link).map_err(|e| MappingError::Conversion(e).into());
        }
        if let Some(link) = state.patient.as_deref().filter(|s| !s.is_empty()) {
            return PatientRef::new(link).map_err(|e| MappingError::Conversion(e).into());
        }

        tracing::debug!(measurement = %state.measurement, "No patient link, refetching measurement");
        let fresh = self.source.fetch_measurement(&state.measurement).await?;
        let link = fresh.patient_reference().ok_or_else(|| {
            MappingError::Conversion(format!("{} has no patient link", state.measurement))
        })?;
        PatientRef::new(link).map_err(|e| MappingError::Conversion(e).into())
    }
}

/// Error message from a rejecting response body
fn rejection_message(body: &str) -> String {
    match serde_json::from_str::<XdsErrorResponse>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ => body.chars().take(500).collect(),
    }
}

#[async_trait]
impl ExportBackend for XdsBackend {
    fn should_export(&self, measurement: &Measurement) -> bool {
        self.builder.registry().is_exportable(&measurement.kind)
    }

    async fn convert(
        &self,
        measurement: &Measurement,
        state: &ExportState,
    ) -> Result<ExportPayload> {
        let reports = self.builder.build(measurement, state)?;
        let patient_ref = self.patient_reference(measurement, state).await?;
        let patient = self.patients.get(&patient_ref).await?;

        let request = XdsGeneratorRequest::new(state.id, &patient, &self.created_by, reports);
        let body = serde_json::to_value(&request)
            .map_err(|e| MappingError::Conversion(format!("Failed to encode document: {e}")))?;

        Ok(ExportPayload {
            document_id: state.id,
            body,
        })
    }

    async fn deliver(&self, payload: &ExportPayload) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&payload.body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        if status > ERROR_THRESHOLD {
            let body = resp.text().await.unwrap_or_else(|e| {
                tracing::warn!(
                    document_id = %payload.document_id,
                    status = status,
                    error = %e,
                    "Failed to read generator error body"
                );
                String::new()
            });
            return Err(DeliveryError::Rejected {
                status,
                message: rejection_message(&body),
            }
            .into());
        }

        tracing::debug!(document_id = %payload.document_id, status = status, "Document delivered");
        Ok(())
    }

    async fn check_health(&self) -> Result<()> {
        let resp = self
            .client
            .get(&self.health_check_url)
            .send()
            .await
            .map_err(|e| DeliveryError::Unhealthy(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(DeliveryError::Unhealthy(format!(
                "{} returned {}",
                self.health_check_url,
                resp.status()
            ))
            .into());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "oioxds"
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::source::ClinicianClient;
    use crate::config::{
        secret_string, DeviceProvenance, OioXdsConfig, RetryConfig, SourceConfig,
    };
    use crate::domain::ids::MeasurementRef;
    use mockito::Matcher;

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

    fn backend(source_url: &str, xds_url: &str) -> XdsBackend {
        let config = ExportConfig {
            start: "2024-01-01".to_string(),
            backend: "oioxds".to_string(),
            created_by: "Telemedicine".to_string(),
            retry_days: 7,
            device_provenance: DeviceProvenance::Whitelist,
            patient_cache_ttl_seconds: 3600,
            oioxds: OioXdsConfig {
                url: format!("{xds_url}/generate"),
                health_check_url: format!("{xds_url}/health"),
                skip_tls_verify: false,
                timeout_seconds: 5,
            },
        };
        XdsBackend::new(&config, source(source_url)).unwrap()
    }

    fn weight(patient_link: Option<String>) -> Measurement {
        let mut measurement: Measurement = serde_json::from_value(serde_json::json!({
            "timestamp": "2024-03-01T08:15:00Z",
            "type": "weight",
            "measurement": {"unit": "kg", "value": 84.9}
        }))
        .unwrap();
        measurement.links.patient = patient_link;
        measurement
    }

    fn state(link: &str) -> ExportState {
        ExportState::new(MeasurementRef::new(link).unwrap(), None)
    }

    #[test]
    fn test_should_export() {
        let backend = backend("http://localhost:1", "http://localhost:2");
        assert!(backend.should_export(&weight(None)));

        let mut ratio = weight(None);
        ratio.kind = "fev1/fev6".to_string();
        assert!(!backend.should_export(&ratio));

        let mut unknown = weight(None);
        unknown.kind = "mood".to_string();
        assert!(!backend.should_export(&unknown));
    }

    #[tokio::test]
    async fn test_convert_builds_document() {
        let mut source_server = mockito::Server::new_async().await;
        source_server
            .mock("GET", "/patients/1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uniqueId": "2512484916", "firstName": "Nancy", "lastName": "Berggren"}"#)
            .create_async()
            .await;

        let backend = backend(&source_server.url(), "http://localhost:2");
        let state = state("https://s/m/1");
        let measurement = weight(Some(format!("{}/patients/1", source_server.url())));

        let payload = backend.convert(&measurement, &state).await.unwrap();

        assert_eq!(payload.document_id, state.id);
        assert_eq!(payload.body["DocumentUUID"], state.id.to_string());
        let collection = &payload.body["SelfMonitoringCollection"][0];
        assert_eq!(
            collection["Citizen"]["personCivilRegistrationIdentifier"],
            "2512484916"
        );
        let sample = &collection["SelfMonitoringSamples"][0]["SelfMonitoringSample"];
        assert_eq!(sample["CreatedByText"], "Telemedicine");
        assert_eq!(sample["LaboratoryReports"][0]["ResultText"], "84.9");
    }

    #[tokio::test]
    async fn test_convert_refetches_measurement_without_patient_link() {
        let mut source_server = mockito::Server::new_async().await;
        let patient_link = format!("{}/patients/9", source_server.url());
        source_server
            .mock("GET", "/measurements/9")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "timestamp": "2024-03-01T08:15:00Z",
                    "type": "weight",
                    "measurement": {"unit": "kg", "value": 84.9},
                    "links": {"patient": patient_link}
                })
                .to_string(),
            )
            .create_async()
            .await;
        source_server
            .mock("GET", "/patients/9")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uniqueId": "0101010101"}"#)
            .create_async()
            .await;

        let backend = backend(&source_server.url(), "http://localhost:2");
        let state = state(&format!("{}/measurements/9", source_server.url()));

        let payload = backend.convert(&weight(None), &state).await.unwrap();
        assert_eq!(
            payload.body["SelfMonitoringCollection"][0]["Citizen"]
                ["personCivilRegistrationIdentifier"],
            "0101010101"
        );
    }

    #[tokio::test]
    async fn test_deliver_posts_json() {
        let mut xds = mockito::Server::new_async().await;
        let mock = xds
            .mock("POST", "/generate")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({"hello": "world"})))
            .with_status(200)
            .create_async()
            .await;

        let backend = backend("http://localhost:1", &xds.url());
        let payload = ExportPayload {
            document_id: uuid::Uuid::new_v4(),
            body: serde_json::json!({"hello": "world"}),
        };

        backend.deliver(&payload).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_surfaces_server_message() {
        let mut xds = mockito::Server::new_async().await;
        xds.mock("POST", "/generate")
            .with_status(500)
            .with_body(r#"{"timestamp":"t","status":500,"error":"Internal","message":"Missing CPR","path":"/generate"}"#)
            .create_async()
            .await;

        let backend = backend("http://localhost:1", &xds.url());
        let payload = ExportPayload {
            document_id: uuid::Uuid::new_v4(),
            body: serde_json::json!({}),
        };

        let err = backend.deliver(&payload).await.unwrap_err();
        match err {
            VitexError::Delivery(DeliveryError::Rejected { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Missing CPR");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_truncated_error_body_still_rejects() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.ends_with(b"{}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            // promises more body than it sends
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let backend = backend("http://localhost:1", &format!("http://{address}"));
        let payload = ExportPayload {
            document_id: uuid::Uuid::new_v4(),
            body: serde_json::json!({}),
        };

        match backend.deliver(&payload).await.unwrap_err() {
            VitexError::Delivery(DeliveryError::Rejected { status, message }) => {
                assert_eq!(status, 500);
                assert!(message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_400_is_not_a_rejection() {
        let mut xds = mockito::Server::new_async().await;
        xds.mock("POST", "/generate")
            .with_status(400)
            .create_async()
            .await;

        let backend = backend("http://localhost:1", &xds.url());
        let payload = ExportPayload {
            document_id: uuid::Uuid::new_v4(),
            body: serde_json::json!({}),
        };
        assert!(backend.deliver(&payload).await.is_ok());
    }

    #[test]
    fn test_rejection_message_falls_back_to_text() {
        assert_eq!(rejection_message("gateway timeout"), "gateway timeout");
        assert_eq!(rejection_message(r#"{"message":"nope"}"#), "nope");
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut xds = mockito::Server::new_async().await;
        xds.mock("GET", "/health")
            .with_status(200)
            .create_async()
            .await;

        let backend = backend("http://localhost:1", &xds.url());
        assert!(backend.check_health().await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_reports_unhealthy() {
        let mut xds = mockito::Server::new_async().await;
        xds.mock("GET", "/health")
            .with_status(503)
            .create_async()
            .await;

        let backend = backend("http://localhost:1", &xds.url());
        let err = backend.check_health().await.unwrap_err();
        assert!(matches!(err, VitexError::Delivery(DeliveryError::Unhealthy(_))));
    }
}
