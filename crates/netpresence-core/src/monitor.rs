// ── Presence monitor ──
//
// Composition of source, reconciler, store and sink for one router.
// Owns the periodic refresh task and enforces the single-writer rule.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::model::{PresenceEntity, RouterDevice};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::sink::PresenceSink;
use crate::source::HostTableSource;
use crate::store::PresenceStore;

/// Polls one router and keeps its presence entities current.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Call [`start`](Self::start)
/// to run the first reconciliation and spawn the periodic refresh, and
/// [`shutdown`](Self::shutdown) to stop it.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    router: RouterDevice,
    source: Arc<dyn HostTableSource>,
    sink: Arc<dyn PresenceSink>,
    store: Arc<PresenceStore>,
    /// Held for the whole fetch + apply, so only one poll is ever in flight.
    reconciler: Mutex<Reconciler>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Create a monitor. Does not fetch anything until [`start`](Self::start)
    /// or [`refresh`](Self::refresh) is called.
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn HostTableSource>,
        sink: Arc<dyn PresenceSink>,
    ) -> Self {
        let store = Arc::new(PresenceStore::new());
        let reconciler = Reconciler::new(Arc::clone(&store), Arc::clone(&sink));
        let router = RouterDevice::new(&config.router_host);

        Self {
            inner: Arc::new(MonitorInner {
                config,
                router,
                source,
                sink,
                store,
                reconciler: Mutex::new(reconciler),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<PresenceStore> {
        &self.inner.store
    }

    pub fn router_device(&self) -> &RouterDevice {
        &self.inner.router
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the first reconciliation, then spawn the periodic refresh.
    ///
    /// Fails without spawning anything if the first fetch fails.
    pub async fn start(&self) -> Result<ReconcileReport, CoreError> {
        let report = self.refresh().await?;

        let period = self.inner.config.filters.poll_interval;
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(refresh_task(self.clone(), period, cancel));
        self.inner.task_handles.lock().await.push(handle);

        info!(
            scope = %self.inner.config.scope,
            entities = self.inner.store.entity_count(),
            interval_secs = period.as_secs(),
            "presence monitor started"
        );
        Ok(report)
    }

    /// Stop the refresh task and close the router session.
    ///
    /// A poll already in progress is allowed to finish first.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        self.inner.source.close().await;
        debug!(scope = %self.inner.config.scope, "presence monitor stopped");
    }

    /// Fetch and reconcile now, waiting for any poll already running.
    pub async fn refresh(&self) -> Result<ReconcileReport, CoreError> {
        let mut reconciler = self.inner.reconciler.lock().await;
        self.poll(&mut reconciler).await
    }

    /// Timer-driven poll. Returns `None` when another poll holds the lock.
    async fn tick(&self) -> Option<Result<ReconcileReport, CoreError>> {
        let Ok(mut reconciler) = self.inner.reconciler.try_lock() else {
            debug!("refresh already running, skipping tick");
            return None;
        };
        Some(self.poll(&mut reconciler).await)
    }

    async fn poll(&self, reconciler: &mut Reconciler) -> Result<ReconcileReport, CoreError> {
        match self.inner.source.fetch_host_table().await {
            Ok(rows) => {
                let report = reconciler.apply(&rows, &self.inner.config.filters);
                self.inner.store.mark_refreshed(Utc::now());
                self.inner.store.set_available(true);
                Ok(report)
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!(error = %e, "host table fetch failed");
                } else {
                    error!(error = %e, "host table fetch failed, check router settings");
                }
                self.inner.store.set_available(false);
                self.inner.sink.mark_unavailable(&e);
                Err(e)
            }
        }
    }

    // ── Readers ──────────────────────────────────────────────────────

    pub fn entities_snapshot(&self) -> Arc<Vec<Arc<PresenceEntity>>> {
        self.inner.store.entities_snapshot()
    }

    pub fn entity(&self, ip: &str) -> Option<Arc<PresenceEntity>> {
        self.inner.store.entity(ip)
    }

    pub fn entity_by_mac(&self, mac: &str) -> Option<Arc<PresenceEntity>> {
        self.inner.store.entity_by_mac(mac)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<PresenceEntity>>>> {
        self.inner.store.subscribe()
    }

    /// `false` after a failed fetch until the next successful one.
    pub fn available(&self) -> bool {
        self.inner.store.available()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_refresh()
    }
}

// ── Background task ──────────────────────────────────────────────────

/// Periodically poll the router. A failed poll never ends the series.
async fn refresh_task(monitor: Monitor, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Some(Err(e)) = monitor.tick().await {
                    debug!(error = %e, "periodic refresh failed, retrying next tick");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::model::DeviceRow;
    use crate::sink::NullSink;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Replays scripted results, then repeats `fallback` forever.
    struct ScriptedSource {
        script: StdMutex<VecDeque<Result<Vec<DeviceRow>, String>>>,
        fallback: Vec<DeviceRow>,
        calls: AtomicUsize,
        closed: AtomicBool,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<DeviceRow>, String>>, fallback: Vec<DeviceRow>) -> Arc<Self> {
            Arc::new(Self {
                script: StdMutex::new(script.into()),
                fallback,
                calls: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HostTableSource for ScriptedSource {
        async fn fetch_host_table(&self) -> Result<Vec<DeviceRow>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(rows)) => Ok(rows),
                Some(Err(reason)) => Err(CoreError::ConnectionFailed {
                    url: "http://192.168.0.1/".into(),
                    reason,
                }),
                None => Ok(self.fallback.clone()),
            }
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CountingSink {
        unavailable: AtomicUsize,
    }

    impl PresenceSink for CountingSink {
        fn create(&self, _entity: &PresenceEntity) {}

        fn update(&self, _entity: &PresenceEntity) {}

        fn mark_unavailable(&self, _error: &CoreError) {
            self.unavailable.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn phone() -> DeviceRow {
        DeviceRow::new("10.0.0.5")
            .with_mac("aa:bb:cc:dd:ee:ff")
            .with_active(true)
    }

    fn config() -> MonitorConfig {
        MonitorConfig::new("home", "192.168.0.1").with_filters(FilterConfig::default())
    }

    #[tokio::test]
    async fn start_runs_an_eager_refresh() {
        let source = ScriptedSource::new(vec![], vec![phone()]);
        let monitor = Monitor::new(config(), source.clone(), Arc::new(NullSink));

        let report = monitor.start().await.unwrap();

        assert_eq!(report.created, vec!["10.0.0.5"]);
        assert!(monitor.available());
        assert!(monitor.last_refresh().is_some());
        assert!(monitor.entity_by_mac("AA-BB-CC-DD-EE-FF").is_some());
        assert_eq!(monitor.router_device().configuration_url, "http://192.168.0.1/");
        monitor.shutdown().await;
        assert!(source.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn start_fails_when_first_fetch_fails() {
        let source = ScriptedSource::new(vec![Err("unreachable".into())], vec![]);
        let sink = Arc::new(CountingSink::default());
        let monitor = Monitor::new(config(), source, sink.clone());

        let err = monitor.start().await.unwrap_err();

        assert!(err.is_transport());
        assert!(!monitor.available());
        assert_eq!(sink.unavailable.load(Ordering::SeqCst), 1);
        assert!(monitor.inner.task_handles.lock().await.is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_leaves_entities_untouched() {
        let source = ScriptedSource::new(vec![Ok(vec![phone()]), Err("timeout".into())], vec![]);
        let monitor = Monitor::new(config(), source, Arc::new(NullSink));
        monitor.refresh().await.unwrap();
        let before = monitor.entity("10.0.0.5").unwrap();

        assert!(monitor.refresh().await.is_err());

        let after = monitor.entity("10.0.0.5").unwrap();
        assert_eq!(*before, *after);
        assert!(after.is_connected);
        assert!(!monitor.available());
    }

    #[tokio::test]
    async fn tick_skips_while_a_poll_holds_the_lock() {
        let source = ScriptedSource::new(vec![], vec![phone()]);
        let monitor = Monitor::new(config(), source.clone(), Arc::new(NullSink));

        let guard = monitor.inner.reconciler.lock().await;
        assert!(monitor.tick().await.is_none());
        drop(guard);

        assert!(monitor.tick().await.is_some());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_cancel_the_series() {
        let source = ScriptedSource::new(
            vec![Ok(vec![phone()]), Err("router rebooting".into())],
            vec![],
        );
        let monitor = Monitor::new(config(), source.clone(), Arc::new(NullSink));
        let mut entities = monitor.subscribe();
        monitor.start().await.unwrap();
        entities.borrow_and_update();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(source.calls(), 2);
        assert!(!monitor.available());
        assert!(monitor.entity("10.0.0.5").unwrap().is_connected);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 3);
        assert!(monitor.available());
        assert!(entities.has_changed().unwrap());
        assert!(!monitor.entity("10.0.0.5").unwrap().is_connected);

        monitor.shutdown().await;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.calls(), 3);
    }
}
