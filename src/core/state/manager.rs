//! State manager
//!
//! Wraps a [`StateStore`] with the bookkeeping rules of the export engine:
//! a bounded liveness probe before rows are created, status transitions and
//! ageing of temporary failures.

use crate::adapters::database::StateStore;
use crate::domain::ids::MeasurementRef;
use crate::domain::{ExportState, ExportStatus, Result, RunStatus, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

const LIVENESS_ATTEMPTS: usize = 3;
const LIVENESS_DELAY: Duration = Duration::from_secs(1);

/// Export state bookkeeping on top of a [`StateStore`]
#[derive(Clone)]
pub struct StateManager {
    store: Arc<dyn StateStore>,
    liveness_attempts: usize,
    liveness_delay: Duration,
}

impl StateManager {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            liveness_attempts: LIVENESS_ATTEMPTS,
            liveness_delay: LIVENESS_DELAY,
        }
    }

    /// Override the liveness probe policy
    pub fn with_liveness(mut self, attempts: usize, delay: Duration) -> Self {
        self.liveness_attempts = attempts.max(1);
        self.liveness_delay = delay;
        self
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Probe the store, retrying a bounded number of times
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] once every attempt has failed.
    pub async fn ensure_live(&self) -> Result<()> {
        let mut last_error = None;

        for attempt in 1..=self.liveness_attempts {
            match self.store.health_check().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = self.liveness_attempts,
                        error = %e,
                        "State store liveness probe failed"
                    );
                    last_error = Some(e);
                    if attempt < self.liveness_attempts {
                        tokio::time::sleep(self.liveness_delay).await;
                    }
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(StoreError::Unavailable(reason).into())
    }

    /// Find the state for a measurement, creating it on first sight
    pub async fn find_or_create(
        &self,
        measurement: &MeasurementRef,
        patient: Option<&str>,
    ) -> Result<ExportState> {
        self.ensure_live().await?;
        self.store.find_or_create(measurement, patient).await
    }

    /// Move a state to `status` and persist it
    pub async fn transition(
        &self,
        state: &ExportState,
        status: ExportStatus,
    ) -> Result<ExportState> {
        let mut next = state.clone();
        next.status = status;
        let saved = self.store.update(&next).await?;

        tracing::debug!(
            measurement = %saved.measurement,
            state_id = %saved.id,
            from = %state.status,
            to = %saved.status,
            "State transition"
        );
        Ok(saved)
    }

    pub async fn temp_failures(&self) -> Result<Vec<ExportState>> {
        self.store.find_by_status(ExportStatus::TempFailure).await
    }

    /// Open a run and return it with its watermark
    pub async fn start_run(&self, start: DateTime<Utc>) -> Result<RunStatus> {
        self.store.start_run(start).await
    }

    /// Close a run as `COMPLETED`, or `FAILED` when any item failed
    pub async fn finish_run(&self, run: &RunStatus, had_failures: bool) -> Result<RunStatus> {
        let status = if had_failures {
            ExportStatus::Failed
        } else {
            ExportStatus::Completed
        };
        let mut closed = run.clone();
        closed.status = status;
        self.store.update_run(&closed).await
    }

    /// Move expired `TEMP_FAILURE` rows to `FAILED`
    ///
    /// Rows whose update fails are logged and left for the next pass.
    /// Returns the number of rows moved.
    pub async fn age_temp_failures(&self, retry_days: u32, now: DateTime<Utc>) -> Result<usize> {
        let pending = self.temp_failures().await?;
        let mut aged = 0;

        for state in pending
            .iter()
            .filter(|state| state.retry_window_expired(retry_days, now))
        {
            match self.transition(state, ExportStatus::Failed).await {
                Ok(_) => {
                    tracing::info!(
                        measurement = %state.measurement,
                        state_id = %state.id,
                        age_hours = state.age_hours(now),
                        "Retry window expired, measurement marked failed"
                    );
                    aged += 1;
                }
                Err(e) => {
                    tracing::error!(
                        measurement = %state.measurement,
                        error = %e,
                        "Failed to mark measurement as permanently failed"
                    );
                }
            }
        }

        Ok(aged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::MemoryStateStore;
    use crate::domain::{MeasurementTotals, RunOverview, VitexError};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn aged(link: &str, hours: i64, status: ExportStatus) -> ExportState {
        let mut state = ExportState::new(MeasurementRef::new(link).unwrap(), None);
        state.status = status;
        state.created_at = Utc::now() - ChronoDuration::hours(hours);
        state
    }

    #[tokio::test]
    async fn test_age_temp_failures() {
        let store = MemoryStateStore::new();
        store.insert(aged("m-old", 8 * 24, ExportStatus::TempFailure)).unwrap();
        store.insert(aged("m-young", 6 * 24, ExportStatus::TempFailure)).unwrap();
        store.insert(aged("m-done", 30 * 24, ExportStatus::Completed)).unwrap();

        let manager = StateManager::new(Arc::new(store.clone()));
        let moved = manager.age_temp_failures(7, Utc::now()).await.unwrap();

        assert_eq!(moved, 1);
        let old = store
            .find_by_ref(&MeasurementRef::new("m-old").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.status, ExportStatus::Failed);
        let young = store
            .find_by_ref(&MeasurementRef::new("m-young").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(young.status, ExportStatus::TempFailure);
    }

    #[tokio::test]
    async fn test_finish_run_status() {
        let store = Arc::new(MemoryStateStore::new());
        let manager = StateManager::new(store.clone());
        let run = manager.start_run(Utc::now()).await.unwrap();

        let closed = manager.finish_run(&run, true).await.unwrap();
        assert_eq!(closed.status, ExportStatus::Failed);
    }

    /// Store whose probe fails a fixed number of times
    struct FlakyStore {
        inner: MemoryStateStore,
        failures_left: AtomicUsize,
        probes: AtomicUsize,
    }

    #[async_trait]
    impl StateStore for FlakyStore {
        async fn find_or_create(
            &self,
            measurement: &MeasurementRef,
            patient: Option<&str>,
        ) -> Result<ExportState> {
            self.inner.find_or_create(measurement, patient).await
        }
        async fn update(&self, state: &ExportState) -> Result<ExportState> {
            self.inner.update(state).await
        }
        async fn find_by_status(&self, status: ExportStatus) -> Result<Vec<ExportState>> {
            self.inner.find_by_status(status).await
        }
        async fn find_by_ref(&self, measurement: &MeasurementRef) -> Result<Option<ExportState>> {
            self.inner.find_by_ref(measurement).await
        }
        async fn start_run(&self, start: DateTime<Utc>) -> Result<RunStatus> {
            self.inner.start_run(start).await
        }
        async fn update_run(&self, run: &RunStatus) -> Result<RunStatus> {
            self.inner.update_run(run).await
        }
        async fn totals(&self) -> Result<MeasurementTotals> {
            self.inner.totals().await
        }
        async fn run_overview(&self) -> Result<RunOverview> {
            self.inner.run_overview().await
        }
        async fn health_check(&self) -> Result<()> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Unavailable("connection refused".to_string()).into());
            }
            Ok(())
        }
        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    fn flaky(failures: usize) -> Arc<FlakyStore> {
        Arc::new(FlakyStore {
            inner: MemoryStateStore::new(),
            failures_left: AtomicUsize::new(failures),
            probes: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_liveness_recovers_within_budget() {
        let store = flaky(2);
        let manager =
            StateManager::new(store.clone()).with_liveness(3, Duration::from_millis(1));

        let state = manager
            .find_or_create(&MeasurementRef::new("m-1").unwrap(), None)
            .await
            .unwrap();

        assert_eq!(state.status, ExportStatus::Initial);
        assert_eq!(store.probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_liveness_gives_up() {
        let store = flaky(5);
        let manager =
            StateManager::new(store.clone()).with_liveness(3, Duration::from_millis(1));

        let err = manager
            .find_or_create(&MeasurementRef::new("m-1").unwrap(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, VitexError::Store(StoreError::Unavailable(_))));
        assert_eq!(store.probes.load(Ordering::SeqCst), 3);
        assert_eq!(store.inner.totals().await.unwrap().total, 0);
    }
}
