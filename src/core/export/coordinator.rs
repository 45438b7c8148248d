//! Export coordinator, the orchestrator of a run
//!
//! Pages through the measurement source from the run watermark, creates or
//! reads each measurement's export state, hands eligible measurements to the
//! backend and records the outcome. Only a failing source page or a failing
//! run bootstrap aborts a run.

use super::outcome::{
    ExportOutcome, FailureCategory, MeasurementFailure, MeasurementReport,
};
use super::summary::{RetryReport, RunReport, RunSummary};
use crate::adapters::backend::{create_backend, ExportBackend};
use crate::adapters::database::create_state_store;
use crate::adapters::database::StateStore;
use crate::adapters::source::{ClinicianClient, MeasurementSource};
use crate::config::VitexConfig;
use crate::core::state::StateManager;
use crate::domain::ids::MeasurementRef;
use crate::domain::{
    ExportState, ExportStatus, Measurement, MeasurementTotals, Result, RunOverview, RunStatus,
    SourceError, StoreError, VitexError,
};
use crate::{log_measurement_failed, log_run_started};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Settings the coordinator needs from `[export]`
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    /// Export start used when no run history exists
    pub start: DateTime<Utc>,

    /// Days a temporary failure is retried
    pub retry_days: u32,
}

/// Health of one remote endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EndpointHealth {
    pub endpoint: String,
    pub healthy: bool,
    pub checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EndpointHealth {
    fn from_probe(endpoint: &str, probe: Result<()>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            healthy: probe.is_ok(),
            checked_at: Utc::now(),
            error: probe.err().map(|e| e.to_string()),
        }
    }
}

/// Aggregate state for the status surface
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub store: &'static str,
    pub measurements: MeasurementTotals,
    pub runs: RunOverview,
    pub source: EndpointHealth,
    pub destination: EndpointHealth,
}

/// A failing component reported by [`ExportCoordinator::check_health`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthIssue {
    pub resource: &'static str,
    pub error: String,
}

/// Stored state and current source copy of one measurement
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementLookup {
    pub state: Option<ExportState>,
    pub measurement: Option<Measurement>,
}

/// Export coordinator
pub struct ExportCoordinator {
    source: Arc<dyn MeasurementSource>,
    backend: Arc<dyn ExportBackend>,
    state: StateManager,
    settings: CoordinatorSettings,
}

impl ExportCoordinator {
    pub fn new(
        source: Arc<dyn MeasurementSource>,
        backend: Arc<dyn ExportBackend>,
        state: StateManager,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            source,
            backend,
            state,
            settings,
        }
    }

    /// Wire every collaborator from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the start date is invalid or a collaborator cannot
    /// be created.
    pub async fn from_config(config: &VitexConfig) -> Result<Self> {
        let start = config
            .export
            .start_date()
            .map_err(VitexError::Configuration)?;

        let source: Arc<dyn MeasurementSource> =
            Arc::new(ClinicianClient::new(config.source.clone())?);
        let store = create_state_store(&config.database).await?;
        let backend = create_backend(&config.export, Arc::clone(&source))?;

        tracing::info!(
            source = %source.endpoint(),
            backend = backend.name(),
            destination = %backend.endpoint(),
            store = store.backend_name(),
            "Export coordinator ready"
        );

        Ok(Self::new(
            source,
            backend,
            StateManager::new(store),
            CoordinatorSettings {
                start,
                retry_days: config.export.retry_days,
            },
        ))
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        self.state.store()
    }

    /// Incremental run from the stored watermark
    ///
    /// # Errors
    ///
    /// Fails only when the run cannot be opened or a source page cannot be
    /// fetched. Per-measurement failures are in the report.
    pub async fn run_export(&self) -> Result<RunReport> {
        let run = self.state.start_run(self.settings.start).await?;
        self.execute(run.clone(), run.lastrun).await
    }

    /// Full run from the configured start date, ignoring the watermark
    ///
    /// Terminal measurements are still skipped.
    pub async fn export_all(&self) -> Result<RunReport> {
        let run = self.state.start_run(self.settings.start).await?;
        tracing::info!(start = %self.settings.start, "Exporting everything since start date");
        self.execute(run, self.settings.start).await
    }

    async fn execute(&self, run: RunStatus, since: DateTime<Utc>) -> Result<RunReport> {
        let started = Instant::now();
        log_run_started!(run.id, since);

        let mut summary = RunSummary::new(run.id);
        let outcomes = match self.paginate(since, &mut summary).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!(run_id = %run.id, error = %e, "Export run aborted");
                if let Err(close_err) = self.state.finish_run(&run, true).await {
                    tracing::error!(run_id = %run.id, error = %close_err, "Failed to close run");
                }
                return Err(e);
            }
        };

        self.state
            .finish_run(&run, summary.has_failures())
            .await?;

        let summary = summary.with_elapsed(started.elapsed());
        summary.log();

        Ok(RunReport { summary, outcomes })
    }

    /// Walk every source page, always fetching at least one
    async fn paginate(
        &self,
        since: DateTime<Utc>,
        summary: &mut RunSummary,
    ) -> Result<Vec<MeasurementReport>> {
        let page_size = self.source.page_size().max(1);
        let mut outcomes = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .source
                .fetch_measurements(since, offset)
                .await
                .map_err(|e| match e {
                    VitexError::Source(_) => e,
                    other => SourceError::Unavailable(other.to_string()).into(),
                })?;
            summary.iterations += 1;

            tracing::debug!(
                offset = offset,
                total = page.total,
                returned = page.results.len(),
                "Processing measurement page"
            );

            for measurement in &page.results {
                let report = self.process(measurement).await;
                summary.record(&report);
                outcomes.push(report);
            }

            if offset + page_size >= page.total {
                break;
            }
            offset += page_size;
        }

        Ok(outcomes)
    }

    /// Handle one listed measurement
    async fn process(&self, measurement: &Measurement) -> MeasurementReport {
        let reference = match measurement.reference().map(MeasurementRef::new) {
            Some(Ok(reference)) => reference,
            _ => {
                let failure = MeasurementFailure::new(
                    FailureCategory::Source,
                    format!("{} measurement has no self link", measurement.kind),
                );
                tracing::warn!(kind = %measurement.kind, "Skipping measurement without reference");
                return MeasurementReport {
                    measurement: String::new(),
                    state_id: None,
                    status: None,
                    result: Err(failure),
                };
            }
        };

        let state = match self
            .state
            .find_or_create(&reference, measurement.patient_reference())
            .await
        {
            Ok(state) => state,
            Err(e) => {
                log_measurement_failed!(reference, e);
                return MeasurementReport {
                    measurement: reference.into_inner(),
                    state_id: None,
                    status: None,
                    result: Err(MeasurementFailure::from(&e)),
                };
            }
        };

        if state.status.is_terminal() {
            tracing::debug!(
                measurement = %state.measurement,
                state_id = %state.id,
                status = %state.status,
                "Already handled"
            );
            return MeasurementReport {
                measurement: reference.into_inner(),
                state_id: Some(state.id),
                status: Some(state.status),
                result: Ok(ExportOutcome::Handled),
            };
        }

        self.export_one(measurement, state).await
    }

    /// Export a measurement whose state is not terminal
    async fn export_one(&self, measurement: &Measurement, state: ExportState) -> MeasurementReport {
        let mut report = MeasurementReport {
            measurement: state.measurement.to_string(),
            state_id: Some(state.id),
            status: Some(state.status),
            result: Ok(ExportOutcome::Handled),
        };

        if !self.backend.should_export(measurement) {
            tracing::debug!(
                measurement = %state.measurement,
                kind = %measurement.kind,
                "Measurement type not exported"
            );
            report.result = self
                .persist(&state, ExportStatus::NoExport, &mut report)
                .await
                .map(|()| ExportOutcome::Rejected);
            return report;
        }

        match self.deliver(measurement, &state).await {
            Ok(()) => {
                tracing::info!(
                    measurement = %state.measurement,
                    state_id = %state.id,
                    kind = %measurement.kind,
                    "Measurement exported"
                );
                report.result = self
                    .persist(&state, ExportStatus::Completed, &mut report)
                    .await
                    .map(|()| ExportOutcome::Exported);
            }
            Err(e) => {
                log_measurement_failed!(state.measurement, e);
                let failure = MeasurementFailure::from(&e);
                if let Err(store_failure) = self
                    .persist(&state, ExportStatus::TempFailure, &mut report)
                    .await
                {
                    tracing::error!(
                        measurement = %state.measurement,
                        error = %store_failure,
                        "Failed to record temporary failure"
                    );
                }
                report.result = Err(failure);
            }
        }

        report
    }

    async fn deliver(&self, measurement: &Measurement, state: &ExportState) -> Result<()> {
        let payload = self.backend.convert(measurement, state).await?;
        self.backend.deliver(&payload).await
    }

    /// Store a transition, keeping the report's status current
    async fn persist(
        &self,
        state: &ExportState,
        status: ExportStatus,
        report: &mut MeasurementReport,
    ) -> std::result::Result<(), MeasurementFailure> {
        match self.state.transition(state, status).await {
            Ok(saved) => {
                report.status = Some(saved.status);
                Ok(())
            }
            Err(e) => {
                log_measurement_failed!(state.measurement, e);
                Err(MeasurementFailure::from(&e))
            }
        }
    }

    /// Re-export every `TEMP_FAILURE` row, then age out expired ones
    ///
    /// Measurements are fetched again by reference before conversion.
    pub async fn retry_failed(&self) -> Result<RetryReport> {
        let pending = self.state.temp_failures().await?;
        tracing::info!(count = pending.len(), "Retrying temporarily failed measurements");

        let mut retry = RetryReport::default();
        for state in pending {
            let report = match self.source.fetch_measurement(&state.measurement).await {
                Ok(measurement) => self.export_one(&measurement, state).await,
                Err(e) => {
                    log_measurement_failed!(state.measurement, e);
                    MeasurementReport {
                        measurement: state.measurement.to_string(),
                        state_id: Some(state.id),
                        status: Some(state.status),
                        result: Err(MeasurementFailure::new(FailureCategory::Source, e.to_string())),
                    }
                }
            };
            retry.push(report);
        }

        retry.aged = self.mark_permanent_failed(Utc::now()).await?;

        tracing::info!(
            retried = retry.retried,
            exported = retry.exported,
            failed = retry.failed,
            aged = retry.aged,
            "Retry of failed measurements completed"
        );
        Ok(retry)
    }

    /// Move `TEMP_FAILURE` rows older than the retry window to `FAILED`
    pub async fn mark_permanent_failed(&self, now: DateTime<Utc>) -> Result<usize> {
        self.state
            .age_temp_failures(self.settings.retry_days, now)
            .await
    }

    /// Stored state plus a fresh copy from the source
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when neither the store nor the source knows
    /// the reference.
    pub async fn lookup(&self, reference: &MeasurementRef) -> Result<MeasurementLookup> {
        let state = self.store().find_by_ref(reference).await?;

        let measurement = match self.source.fetch_measurement(reference).await {
            Ok(measurement) => Some(measurement),
            Err(VitexError::Source(SourceError::NotFound(_))) => None,
            Err(e) if state.is_some() => {
                tracing::warn!(measurement = %reference, error = %e, "Source lookup failed");
                None
            }
            Err(e) => return Err(e),
        };

        if state.is_none() && measurement.is_none() {
            return Err(StoreError::NotFound(reference.to_string()).into());
        }

        Ok(MeasurementLookup { state, measurement })
    }

    /// Totals, run history and endpoint health
    pub async fn overview(&self) -> Result<Overview> {
        let measurements = self.store().totals().await?;
        let runs = self.store().run_overview().await?;

        let source = EndpointHealth::from_probe(self.source.endpoint(), self.source.check_health().await);
        let destination =
            EndpointHealth::from_probe(self.backend.endpoint(), self.backend.check_health().await);

        Ok(Overview {
            store: self.store().backend_name(),
            measurements,
            runs,
            source,
            destination,
        })
    }

    /// Probe every collaborator, returning the ones that failed
    pub async fn check_health(&self) -> Vec<HealthIssue> {
        let mut issues = Vec::new();

        if let Err(e) = self.store().health_check().await {
            issues.push(HealthIssue {
                resource: "repository",
                error: e.to_string(),
            });
        }
        if let Err(e) = self.source.check_health().await {
            issues.push(HealthIssue {
                resource: "source",
                error: e.to_string(),
            });
        }
        if let Err(e) = self.backend.check_health().await {
            issues.push(HealthIssue {
                resource: "exporter",
                error: e.to_string(),
            });
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::backend::ExportPayload;
    use crate::adapters::database::MemoryStateStore;
    use crate::adapters::source::MeasurementPage;
    use crate::domain::ids::PatientRef;
    use crate::domain::{DeliveryError, Patient};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source serving a fixed list in pages
    struct FixedSource {
        measurements: Vec<Measurement>,
        page_size: usize,
        reported_total: Option<usize>,
        fail_listing: bool,
        calls: Mutex<Vec<usize>>,
    }

    impl FixedSource {
        fn new(measurements: Vec<Measurement>, page_size: usize) -> Self {
            Self {
                measurements,
                page_size,
                reported_total: None,
                fail_listing: false,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MeasurementSource for FixedSource {
        async fn fetch_measurements(
            &self,
            _since: DateTime<Utc>,
            offset: usize,
        ) -> Result<MeasurementPage> {
            self.calls.lock().unwrap().push(offset);
            if self.fail_listing {
                return Err(SourceError::Unavailable("connection refused".to_string()).into());
            }
            let results = self
                .measurements
                .iter()
                .skip(offset)
                .take(self.page_size)
                .cloned()
                .collect();
            Ok(MeasurementPage {
                results,
                total: self.reported_total.unwrap_or(self.measurements.len()),
                max: self.page_size,
                offset,
                ..Default::default()
            })
        }

        async fn fetch_measurement(&self, reference: &MeasurementRef) -> Result<Measurement> {
            self.measurements
                .iter()
                .find(|m| m.reference() == Some(reference.as_str()))
                .cloned()
                .ok_or_else(|| SourceError::NotFound(reference.to_string()).into())
        }

        async fn fetch_patient(&self, _reference: &PatientRef) -> Result<Patient> {
            Ok(Patient::default())
        }

        async fn check_health(&self) -> Result<()> {
            Ok(())
        }

        fn page_size(&self) -> usize {
            self.page_size
        }

        fn endpoint(&self) -> &str {
            "fixed"
        }
    }

    /// Backend accepting weight and pulse, recording deliveries
    struct RecordingBackend {
        delivered: Mutex<Vec<uuid::Uuid>>,
        fail_delivery: bool,
    }

    impl RecordingBackend {
        fn new(fail_delivery: bool) -> Self {
            Self {
                delivered: Mutex::new(Vec::new()),
                fail_delivery,
            }
        }

        fn delivered(&self) -> usize {
            self.delivered.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ExportBackend for RecordingBackend {
        fn should_export(&self, measurement: &Measurement) -> bool {
            matches!(measurement.kind.as_str(), "weight" | "pulse")
        }

        async fn convert(
            &self,
            _measurement: &Measurement,
            state: &ExportState,
        ) -> Result<ExportPayload> {
            Ok(ExportPayload {
                document_id: state.id,
                body: serde_json::json!({}),
            })
        }

        async fn deliver(&self, payload: &ExportPayload) -> Result<()> {
            if self.fail_delivery {
                return Err(DeliveryError::Rejected {
                    status: 500,
                    message: "Missing CPR".to_string(),
                }
                .into());
            }
            self.delivered.lock().unwrap().push(payload.document_id);
            Ok(())
        }

        async fn check_health(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }

        fn endpoint(&self) -> &str {
            "recording"
        }
    }

    fn measurement(kind: &str, n: usize) -> Measurement {
        serde_json::from_value(serde_json::json!({
            "timestamp": "2024-03-01T08:15:00Z",
            "type": kind,
            "measurement": {"unit": "kg", "value": 84.9},
            "links": {
                "measurement": format!("https://s/measurements/{n}"),
                "patient": "https://s/patients/1"
            }
        }))
        .unwrap()
    }

    fn coordinator(
        source: FixedSource,
        backend: Arc<RecordingBackend>,
        store: &MemoryStateStore,
    ) -> ExportCoordinator {
        ExportCoordinator::new(
            Arc::new(source),
            backend,
            StateManager::new(Arc::new(store.clone())).with_liveness(1, Duration::ZERO),
            CoordinatorSettings {
                start: Utc::now() - ChronoDuration::days(30),
                retry_days: 7,
            },
        )
    }

    async fn status_of(store: &MemoryStateStore, n: usize) -> ExportStatus {
        store
            .find_by_ref(&MeasurementRef::new(format!("https://s/measurements/{n}")).unwrap())
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_run_counts_exported_and_rejected() {
        let store = MemoryStateStore::new();
        let backend = Arc::new(RecordingBackend::new(false));
        let source = FixedSource::new(
            vec![
                measurement("weight", 1),
                measurement("pulse", 2),
                measurement("mood", 3),
            ],
            100,
        );

        let report = coordinator(source, backend.clone(), &store)
            .run_export()
            .await
            .unwrap();

        assert_eq!(report.summary.exported, 2);
        assert_eq!(report.summary.rejected, 1);
        assert_eq!(report.summary.failed, 0);
        assert_eq!(report.summary.iterations, 1);
        assert_eq!(backend.delivered(), 2);
        assert_eq!(status_of(&store, 3).await, ExportStatus::NoExport);

        let runs = store.runs().unwrap();
        assert_eq!(runs.last().unwrap().status, ExportStatus::Completed);
    }

    #[tokio::test]
    async fn test_terminal_measurements_are_not_resubmitted() {
        let store = MemoryStateStore::new();
        let backend = Arc::new(RecordingBackend::new(false));
        let list = vec![measurement("weight", 1), measurement("mood", 2)];

        coordinator(FixedSource::new(list.clone(), 100), backend.clone(), &store)
            .run_export()
            .await
            .unwrap();
        let second = coordinator(FixedSource::new(list, 100), backend.clone(), &store)
            .run_export()
            .await
            .unwrap();

        assert_eq!(backend.delivered(), 1);
        assert_eq!(second.summary.handled, 2);
        assert_eq!(second.summary.exported, 0);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_temporary_and_fails_run() {
        let store = MemoryStateStore::new();
        let backend = Arc::new(RecordingBackend::new(true));
        let source = FixedSource::new(vec![measurement("weight", 1)], 100);

        let report = coordinator(source, backend, &store)
            .run_export()
            .await
            .unwrap();

        assert_eq!(report.summary.failed, 1);
        let failure = report.outcomes[0].result.clone().unwrap_err();
        assert_eq!(failure.category, FailureCategory::Delivery);
        assert_eq!(report.outcomes[0].status, Some(ExportStatus::TempFailure));
        assert_eq!(status_of(&store, 1).await, ExportStatus::TempFailure);
        assert_eq!(store.runs().unwrap().last().unwrap().status, ExportStatus::Failed);
    }

    #[tokio::test]
    async fn test_pagination_walks_all_pages() {
        let store = MemoryStateStore::new();
        let backend = Arc::new(RecordingBackend::new(false));
        let list = (1..=5).map(|n| measurement("weight", n)).collect();
        let source = FixedSource::new(list, 2);

        let report = coordinator(source, backend.clone(), &store)
            .run_export()
            .await
            .unwrap();

        assert_eq!(report.summary.iterations, 3);
        assert_eq!(report.summary.exported, 5);
    }

    #[tokio::test]
    async fn test_zero_total_still_fetches_once() {
        let store = MemoryStateStore::new();
        let backend = Arc::new(RecordingBackend::new(false));
        let mut source = FixedSource::new(vec![measurement("weight", 1)], 100);
        source.reported_total = Some(0);

        let report = coordinator(source, backend, &store)
            .run_export()
            .await
            .unwrap();

        assert_eq!(report.summary.iterations, 1);
        assert_eq!(report.summary.exported, 1);
    }

    #[tokio::test]
    async fn test_source_failure_aborts_run() {
        let store = MemoryStateStore::new();
        let backend = Arc::new(RecordingBackend::new(false));
        let mut source = FixedSource::new(vec![], 100);
        source.fail_listing = true;

        let err = coordinator(source, backend, &store)
            .run_export()
            .await
            .unwrap_err();

        assert!(matches!(err, VitexError::Source(SourceError::Unavailable(_))));
        assert_eq!(store.runs().unwrap().last().unwrap().status, ExportStatus::Failed);
    }

    #[tokio::test]
    async fn test_retry_failed_recovers_and_ages() {
        let store = MemoryStateStore::new();
        let list = vec![measurement("weight", 1)];

        coordinator(
            FixedSource::new(list.clone(), 100),
            Arc::new(RecordingBackend::new(true)),
            &store,
        )
        .run_export()
        .await
        .unwrap();

        let mut stale = ExportState::new(MeasurementRef::new("https://s/measurements/9").unwrap(), None);
        stale.status = ExportStatus::TempFailure;
        stale.created_at = Utc::now() - ChronoDuration::days(8);
        store.insert(stale).unwrap();

        let healthy = Arc::new(RecordingBackend::new(false));
        let retry = coordinator(FixedSource::new(list, 100), healthy.clone(), &store)
            .retry_failed()
            .await
            .unwrap();

        assert_eq!(retry.retried, 2);
        assert_eq!(retry.exported, 1);
        assert_eq!(retry.failed, 1);
        assert_eq!(retry.aged, 1);
        assert_eq!(healthy.delivered(), 1);
        assert_eq!(status_of(&store, 1).await, ExportStatus::Completed);
        assert_eq!(status_of(&store, 9).await, ExportStatus::Failed);
    }

    #[tokio::test]
    async fn test_lookup_unknown_reference() {
        let store = MemoryStateStore::new();
        let backend = Arc::new(RecordingBackend::new(false));
        let coordinator = coordinator(FixedSource::new(vec![], 100), backend, &store);

        let err = coordinator
            .lookup(&MeasurementRef::new("https://s/measurements/404").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, VitexError::Store(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overview_and_health() {
        let store = MemoryStateStore::new();
        let backend = Arc::new(RecordingBackend::new(false));
        let coordinator = coordinator(
            FixedSource::new(vec![measurement("weight", 1)], 100),
            backend,
            &store,
        );
        coordinator.run_export().await.unwrap();

        let overview = coordinator.overview().await.unwrap();
        assert_eq!(overview.measurements.completed, 1);
        assert!(overview.source.healthy);
        assert_eq!(overview.store, "memory");
        assert!(coordinator.check_health().await.is_empty());
    }
}
