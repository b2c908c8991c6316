//! Poll loop with bounded retries.
//!
//! A poll asks the backend for a fresh pH sample, waits for the probe to
//! settle, then fetches the full status. Failed polls schedule a single
//! delayed retry until the retry ceiling is reached; after that only the next
//! scheduled tick or a manual retry polls again.
//!
//! Polls started by consecutive ticks may overlap. Every poll carries a
//! sequence number and a poll that resolves after a newer one is discarded.

use crate::backend::{Backend, StatusData};
use crate::error::{DashboardError, Result};
use crate::monitor::config::PollerConfig;
use crate::monitor::data::DashboardState;
use crate::monitor::reconciler;
use crate::monitor::store::StateStore;
use chrono::Utc;
use futures_util::future::BoxFuture;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a single poll resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// The snapshot and history were updated.
    Updated,
    /// The poll failed and one retry is pending.
    RetryScheduled,
    /// The poll failed and the retry ceiling has been reached.
    RetriesExhausted,
    /// A newer poll resolved first; this result was dropped.
    Superseded,
    /// The controller was stopped while the poll was in flight.
    Cancelled,
}

/// Drives periodic polling of the backend and owns the dashboard state.
///
/// Cloning is cheap; all clones share the same state, timer and backend.
#[derive(Clone)]
pub struct PollController {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn Backend>,
    store: StateStore,
    config: PollerConfig,
    sequence: AtomicU64,
    /// Cancelled by `stop()`; ticker, settle delays and retries watch it.
    lifetime: Mutex<CancellationToken>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PollController {
    /// Create a controller with a fresh state store.
    pub fn new(backend: Arc<dyn Backend>, config: PollerConfig) -> Self {
        let store = StateStore::new(DashboardState::new(config.history_capacity));
        Self::with_store(backend, config, store)
    }

    /// Create a controller that publishes into an existing store.
    pub fn with_store(backend: Arc<dyn Backend>, config: PollerConfig, store: StateStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                config,
                sequence: AtomicU64::new(0),
                lifetime: Mutex::new(CancellationToken::new()),
                ticker: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    /// Poll immediately, then every `poll_interval` until [`stop`](Self::stop).
    pub fn start(&self) -> Result<()> {
        let mut ticker = lock(&self.inner.ticker);
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(DashboardError::AlreadyRunning);
        }

        let token = self.token();
        *ticker = Some(tokio::spawn(self.clone().run_ticker(token)));

        info!(
            "Started polling every {}ms",
            self.inner.config.poll_interval_ms
        );
        Ok(())
    }

    /// Stop the ticker and drop pending retries and settle waits. Idempotent.
    pub fn stop(&self) {
        let previous = std::mem::take(&mut *lock(&self.inner.lifetime));
        previous.cancel();

        if lock(&self.inner.ticker).take().is_some() {
            info!("Polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.ticker)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Run one poll cycle.
    ///
    /// Failures never surface as errors; they are recorded in the state
    /// store and may schedule a retry. The poll is bound to the controller's
    /// lifetime at the moment this is called, so a `stop()` issued before the
    /// future first runs still cancels it.
    pub fn poll(&self) -> BoxFuture<'static, PollOutcome> {
        let this = self.clone();
        let token = self.token();
        let sequence = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        Box::pin(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(sequence, "poll cancelled");
                    return PollOutcome::Cancelled;
                }
                result = this.fetch_cycle() => result,
            };

            match result {
                Ok(data) => this.record_success(sequence, &data),
                Err(err) => this.record_failure(sequence, &err, token),
            }
        })
    }

    /// Operator-initiated retry: bumps the retry count and polls regardless
    /// of the ceiling.
    pub fn manual_retry(&self) -> BoxFuture<'static, PollOutcome> {
        let ceiling = self.inner.config.max_retries;
        let retry_count = self.inner.store.update(|state| {
            let connection = &mut state.connection;
            connection.retry_count = connection.retry_count.saturating_add(1).min(ceiling);
            connection.retry_count
        });

        info!("Manual retry requested (retry count {})", retry_count);
        self.poll()
    }

    fn token(&self) -> CancellationToken {
        lock(&self.inner.lifetime).clone()
    }

    async fn run_ticker(self, token: CancellationToken) {
        let mut interval = time::interval(self.inner.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("poll ticker shutting down");
                    break;
                }
                _ = interval.tick() => {
                    tokio::spawn(self.poll());
                }
            }
        }
    }

    async fn fetch_cycle(&self) -> Result<StatusData> {
        if let Err(err) = self.inner.backend.request_ph_reading().await {
            debug!("pH sample request failed: {}", err);
        }

        time::sleep(self.inner.config.settle_delay()).await;

        self.inner.backend.fetch_status().await
    }

    fn record_success(&self, sequence: u64, data: &StatusData) -> PollOutcome {
        let now = Utc::now();
        let applied = self.inner.store.update(|state| {
            if !state.resolve_poll(sequence) {
                return false;
            }
            state.last_error = None;
            state.connection.mark_connected(now);
            reconciler::apply_update(state, data, now);
            true
        });

        if applied {
            debug!(sequence, ph = ?data.current_ph, "poll succeeded");
            PollOutcome::Updated
        } else {
            debug!(sequence, "dropping result of superseded poll");
            PollOutcome::Superseded
        }
    }

    fn record_failure(
        &self,
        sequence: u64,
        err: &DashboardError,
        token: CancellationToken,
    ) -> PollOutcome {
        let now = Utc::now();
        let ceiling = self.inner.config.max_retries;

        let (outcome, retry_count) = self.inner.store.update(|state| {
            if !state.resolve_poll(sequence) {
                return (PollOutcome::Superseded, state.connection.retry_count);
            }
            state.last_error = Some(format!("Failed to connect: {}", err));
            state.connection.mark_disconnected(now);

            let outcome = if state.connection.register_failure(ceiling) {
                PollOutcome::RetryScheduled
            } else {
                PollOutcome::RetriesExhausted
            };
            (outcome, state.connection.retry_count)
        });

        match outcome {
            PollOutcome::RetryScheduled => {
                warn!(
                    "Poll failed ({}), retry {}/{} in {}ms",
                    err, retry_count, ceiling, self.inner.config.retry_delay_ms
                );
                self.schedule_retry(token);
            }
            PollOutcome::RetriesExhausted => {
                warn!(
                    "Poll failed ({}), giving up after {} retries until the next tick",
                    err, ceiling
                );
            }
            _ => debug!(sequence, "dropping failure of superseded poll"),
        }

        outcome
    }

    fn schedule_retry(&self, token: CancellationToken) {
        let this = self.clone();
        let delay = self.inner.config.retry_delay();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!("pending retry dropped"),
                _ = time::sleep(delay) => {
                    this.poll().await;
                }
            }
        });
    }
}

impl std::fmt::Debug for PollController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollController")
            .field("config", &self.inner.config)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{ph_data, Reply, ScriptedBackend};
    use std::time::Duration;

    fn controller_with(backend: ScriptedBackend) -> (PollController, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let controller = PollController::new(backend.clone(), PollerConfig::default());
        (controller, backend)
    }

    async fn advance(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_populates_state() {
        let (controller, backend) = controller_with(ScriptedBackend::always(StatusData {
            current_ph: Some(7.2),
            fish_detected: Some(true),
            motor_initialized: Some(false),
            ..Default::default()
        }));

        assert_eq!(controller.poll().await, PollOutcome::Updated);

        let state = controller.store().snapshot();
        assert_eq!(state.sensors.ph, 7.2);
        assert!(state.sensors.fish_detected);
        assert!(!state.sensors.motor_initialized);
        assert!(state.connection.is_connected);
        assert!(state.connection.last_attempt.is_some());
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history.latest().unwrap().value, 7.2);
        assert_eq!(backend.ph_requests(), 1);
        assert_eq!(backend.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_fetched_after_settle_delay() {
        let (controller, backend) = controller_with(ScriptedBackend::always(ph_data(7.0)));

        let poll = tokio::spawn(controller.poll());
        advance(999).await;
        assert_eq!(backend.ph_requests(), 1);
        assert_eq!(backend.fetches(), 0);

        assert_eq!(poll.await.unwrap(), PollOutcome::Updated);
        assert_eq!(backend.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_schedules_one_retry() {
        let (controller, backend) = controller_with(ScriptedBackend::offline());

        assert_eq!(controller.poll().await, PollOutcome::RetryScheduled);

        let state = controller.store().snapshot();
        assert!(!state.connection.is_connected);
        assert_eq!(state.connection.retry_count, 1);
        assert!(state.connection.last_attempt.is_some());
        assert!(state
            .last_error
            .as_deref()
            .unwrap()
            .starts_with("Failed to connect: "));

        advance(1999).await;
        assert_eq!(backend.ph_requests(), 1);

        advance(2).await;
        assert_eq!(backend.ph_requests(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_reported_failure_is_retried() {
        let backend = ScriptedBackend::always(ph_data(7.4)).then(Reply::Failure);
        let (controller, backend) = controller_with(backend);

        assert_eq!(controller.poll().await, PollOutcome::RetryScheduled);
        assert_eq!(
            controller.store().snapshot().last_error.as_deref(),
            Some("Failed to connect: Backend reported failure")
        );

        advance(3001).await;
        assert_eq!(backend.fetches(), 2);
        let state = controller.store().snapshot();
        assert!(state.connection.is_connected);
        assert_eq!(state.sensors.ph, 7.4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_exhaust_retries() {
        let (controller, backend) = controller_with(ScriptedBackend::offline());

        assert_eq!(controller.poll().await, PollOutcome::RetryScheduled);
        advance(60_000).await;

        assert_eq!(backend.fetches(), 3);
        let state = controller.store().snapshot();
        assert!(!state.connection.is_connected);
        assert_eq!(state.connection.retry_count, 3);
        assert!(state.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_retry_count() {
        let backend = ScriptedBackend::always(ph_data(6.6))
            .then(Reply::NetworkDown)
            .then(Reply::NetworkDown);
        let (controller, backend) = controller_with(backend);

        controller.poll().await;
        advance(10_000).await;

        assert_eq!(backend.fetches(), 3);
        let state = controller.store().snapshot();
        assert!(state.connection.is_connected);
        assert_eq!(state.connection.retry_count, 0);
        assert!(state.last_error.is_none());
        assert_eq!(state.sensors.ph, 6.6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_retry_ignores_ceiling() {
        let backend = ScriptedBackend::always(ph_data(7.1))
            .then(Reply::NetworkDown)
            .then(Reply::NetworkDown)
            .then(Reply::NetworkDown)
            .then(Reply::NetworkDown);
        let (controller, backend) = controller_with(backend);

        controller.poll().await;
        advance(60_000).await;
        assert_eq!(backend.fetches(), 3);
        assert_eq!(controller.store().snapshot().connection.retry_count, 3);

        assert_eq!(controller.manual_retry().await, PollOutcome::RetriesExhausted);
        assert_eq!(backend.fetches(), 4);
        assert_eq!(controller.store().snapshot().connection.retry_count, 3);

        assert_eq!(controller.manual_retry().await, PollOutcome::Updated);
        let state = controller.store().snapshot();
        assert_eq!(state.connection.retry_count, 0);
        assert!(state.connection.is_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_retry_counts_as_attempt() {
        let (controller, _backend) = controller_with(ScriptedBackend::offline());

        assert_eq!(controller.manual_retry().await, PollOutcome::RetryScheduled);
        assert_eq!(controller.store().snapshot().connection.retry_count, 2);
        controller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_success_is_dropped() {
        let backend = ScriptedBackend::always(ph_data(7.0))
            .then_after(Duration::from_secs(3), Reply::Data(ph_data(6.5)))
            .then(Reply::Data(ph_data(8.0)));
        let (controller, _backend) = controller_with(backend);

        let older = tokio::spawn(controller.poll());
        advance(500).await;
        let newer = tokio::spawn(controller.poll());

        assert_eq!(newer.await.unwrap(), PollOutcome::Updated);
        assert_eq!(older.await.unwrap(), PollOutcome::Superseded);

        let state = controller.store().snapshot();
        assert_eq!(state.sensors.ph, 8.0);
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_failure_does_not_retry() {
        let backend = ScriptedBackend::always(ph_data(7.3))
            .then_after(Duration::from_secs(3), Reply::NetworkDown);
        let (controller, backend) = controller_with(backend);

        let older = tokio::spawn(controller.poll());
        advance(500).await;
        let newer = tokio::spawn(controller.poll());

        assert_eq!(newer.await.unwrap(), PollOutcome::Updated);
        assert_eq!(older.await.unwrap(), PollOutcome::Superseded);

        advance(10_000).await;
        assert_eq!(backend.fetches(), 2);
        let state = controller.store().snapshot();
        assert!(state.connection.is_connected);
        assert!(state.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_retry() {
        let (controller, backend) = controller_with(ScriptedBackend::offline());

        assert_eq!(controller.poll().await, PollOutcome::RetryScheduled);
        controller.stop();
        controller.stop();

        advance(30_000).await;
        assert_eq!(backend.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_settle_wait() {
        let (controller, backend) = controller_with(ScriptedBackend::always(ph_data(7.0)));

        let poll = tokio::spawn(controller.poll());
        advance(100).await;
        controller.stop();

        assert_eq!(poll.await.unwrap(), PollOutcome::Cancelled);
        assert_eq!(backend.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_poll_created_before_it_runs() {
        let (controller, backend) = controller_with(ScriptedBackend::offline());

        let poll = tokio::spawn(controller.poll());
        controller.stop();

        assert_eq!(poll.await.unwrap(), PollOutcome::Cancelled);
        advance(30_000).await;

        assert_eq!(backend.ph_requests(), 0);
        assert_eq!(backend.fetches(), 0);
        let state = controller.store().snapshot();
        assert_eq!(state.connection.retry_count, 0);
        assert!(state.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_polls_immediately_then_every_interval() {
        let (controller, backend) = controller_with(ScriptedBackend::always(ph_data(7.0)));

        controller.start().unwrap();
        assert!(controller.is_running());
        assert!(matches!(
            controller.start(),
            Err(DashboardError::AlreadyRunning)
        ));

        advance(1001).await;
        assert_eq!(backend.fetches(), 1);

        advance(4500).await;
        assert_eq!(backend.ph_requests(), 2);
        assert_eq!(backend.fetches(), 1);

        advance(15_500).await;
        assert_eq!(backend.fetches(), 5);
        assert_eq!(controller.store().snapshot().history.len(), 5);

        controller.stop();
        assert!(!controller.is_running());
        advance(30_000).await;
        assert_eq!(backend.fetches(), 5);

        controller.start().unwrap();
        advance(1001).await;
        assert_eq!(backend.fetches(), 6);
        controller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_after_exhaustion_does_not_retry() {
        let (controller, backend) = controller_with(ScriptedBackend::offline());

        controller.poll().await;
        advance(7_000).await;
        assert_eq!(backend.fetches(), 3);

        controller.start().unwrap();
        advance(4_000).await;
        assert_eq!(backend.fetches(), 4);
        assert_eq!(controller.store().snapshot().connection.retry_count, 3);

        advance(5_000).await;
        assert_eq!(backend.fetches(), 5);
        controller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_window_through_polls() {
        let (controller, _backend) = controller_with(ScriptedBackend::always(ph_data(7.0)));

        for _ in 0..25 {
            assert_eq!(controller.poll().await, PollOutcome::Updated);
        }

        let state = controller.store().snapshot();
        assert_eq!(state.history.len(), 20);
        assert!(state
            .history
            .iter()
            .zip(state.history.iter().skip(1))
            .all(|(a, b)| a.time <= b.time));
    }
}
