//! Shared fixtures for the integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use vitex::config::VitexConfig;
use vitex::core::export::ExportCoordinator;

/// Configuration pointing at mock servers with an in-memory store
pub fn config(source_url: &str, xds_url: &str) -> VitexConfig {
    let content = format!(
        r#"
[source]
url = "{source_url}"
key = "exporter"
secret = "s3cret"
batch_size = 10
timeout_seconds = 5

[source.retry]
max_retries = 1
initial_delay_ms = 1
max_delay_ms = 1

[export]
start = "2024-01-01"
created_by = "Telemedicine"
retry_days = 7

[export.oioxds]
url = "{xds_url}/generate"
health_check_url = "{xds_url}/health"
timeout_seconds = 5

[database]
store = "memory"
"#
    );
    let config: VitexConfig = toml::from_str(&content).unwrap();
    config.validate().unwrap();
    config
}

pub async fn coordinator(source: &ServerGuard, xds: &ServerGuard) -> ExportCoordinator {
    ExportCoordinator::from_config(&config(&source.url(), &xds.url()))
        .await
        .unwrap()
}

/// Measurement as listed by the source
pub fn measurement(base: &str, id: u32, kind: &str, value: Value, unit: &str) -> Value {
    json!({
        "timestamp": "2024-03-01T08:15:00Z",
        "type": kind,
        "measurement": {"unit": unit, "value": value},
        "links": {
            "measurement": format!("{base}/measurements/{id}"),
            "patient": format!("{base}/patients/1")
        }
    })
}

/// Weight, pulse and one type the backend does not export
pub fn mixed_batch(base: &str) -> Vec<Value> {
    vec![
        measurement(base, 1, "weight", json!(84.9), "kg"),
        measurement(base, 2, "pulse", json!(71), "1/min"),
        measurement(base, 3, "mood", json!(4), ""),
    ]
}

/// Serve `results` as a single listing page
pub async fn mock_listing(server: &mut ServerGuard, results: &[Value]) -> Mock {
    server
        .mock("GET", "/measurements")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": results,
                "total": results.len(),
                "max": 10,
                "offset": 0
            })
            .to_string(),
        )
        .create_async()
        .await
}

pub async fn mock_patient(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/patients/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"uniqueId": "2512484916", "firstName": "Nancy", "lastName": "Berggren"}"#,
        )
        .create_async()
        .await
}

pub async fn mock_health(server: &mut ServerGuard, status: usize) -> Mock {
    server
        .mock("GET", "/health")
        .with_status(status)
        .create_async()
        .await
}

pub async fn mock_generator(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
    server
        .mock("POST", "/generate")
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}
