//! Event-driven state reconciliation.
//!
//! The reconciler treats server state as authoritative: whenever a
//! migration event arrives it re-fetches all five REST collections and
//! replaces its cached view wholesale. Completion events additionally
//! raise a success banner and, after a fixed delay, publish the synthetic
//! `email_sent` event; failure events raise an error banner.

use std::sync::Arc;
use std::time::Duration;

use cloudflow_api::{DashboardApi, DashboardSnapshot, fetch_snapshot};
use cloudflow_core::events::{DispatchedEvent, EventKind, PushEvent};
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatcher::{EventDispatcher, Subscription};

// ─────────────────────────────────────────────────────────────────────────────
// Rule table
// ─────────────────────────────────────────────────────────────────────────────

/// What the reconciler does in response to one event kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    /// No reconciliation reaction.
    Ignore,
    /// Re-fetch all collections.
    Refetch,
    /// Re-fetch, raise a success banner, and schedule the synthetic
    /// completion notification.
    RefetchAndNotify,
    /// Re-fetch and raise an error banner.
    RefetchAndAlert,
}

/// The fixed kind-to-action rule table.
#[must_use]
pub fn rule_for(kind: EventKind) -> ReconcileAction {
    match kind {
        EventKind::MigrationUpdate => ReconcileAction::Refetch,
        EventKind::MigrationComplete => ReconcileAction::RefetchAndNotify,
        EventKind::MigrationFailed => ReconcileAction::RefetchAndAlert,
        _ => ReconcileAction::Ignore,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner / DashboardView
// ─────────────────────────────────────────────────────────────────────────────

/// Transient operator notification raised by the reconciler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Banner {
    /// A migration completed.
    Success(String),
    /// A migration failed.
    Error(String),
}

/// Shared cached view of the last successful re-fetch cycle.
///
/// `None` until the first cycle succeeds. Replaced wholesale per cycle;
/// a failed cycle leaves the previous view untouched.
#[derive(Clone, Default)]
pub struct DashboardView {
    inner: Arc<RwLock<Option<DashboardSnapshot>>>,
}

impl DashboardView {
    /// Clone out the current snapshot, if any cycle has succeeded.
    #[must_use]
    pub fn snapshot(&self) -> Option<DashboardSnapshot> {
        self.inner.read().clone()
    }

    fn replace(&self, snapshot: DashboardSnapshot) {
        *self.inner.write() = Some(snapshot);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StateReconciler
// ─────────────────────────────────────────────────────────────────────────────

/// Subscribes to the migration event family and drives re-fetch cycles.
pub struct StateReconciler {
    view: DashboardView,
    banner_tx: watch::Sender<Option<Banner>>,
    cancel: CancellationToken,
    _subscriptions: Vec<Subscription>,
}

impl StateReconciler {
    /// Subscribe to the dispatcher and start the reconciliation task.
    ///
    /// `notification_delay` is the wait before the synthetic `email_sent`
    /// event after a completion.
    #[must_use]
    pub fn start(
        api: Arc<dyn DashboardApi>,
        dispatcher: &EventDispatcher,
        notification_delay: Duration,
    ) -> Self {
        let view = DashboardView::default();
        let (banner_tx, _) = watch::channel(None);
        let cancel = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<DispatchedEvent>();

        // Callbacks run on the publisher's task; hand off immediately.
        let subscriptions = [
            EventKind::MigrationUpdate,
            EventKind::MigrationComplete,
            EventKind::MigrationFailed,
        ]
        .into_iter()
        .map(|kind| {
            let event_tx = event_tx.clone();
            dispatcher.subscribe(kind, move |event| {
                let _ = event_tx.send(event.clone());
            })
        })
        .collect();

        let worker = Worker {
            api,
            dispatcher: dispatcher.clone(),
            view: view.clone(),
            banner_tx: banner_tx.clone(),
            cancel: cancel.clone(),
            notification_delay,
        };
        let _ = tokio::spawn(worker.run(event_rx));

        Self {
            view,
            banner_tx,
            cancel,
            _subscriptions: subscriptions,
        }
    }

    /// The shared cached view.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        self.view.clone()
    }

    /// Watch banner notifications. Starts at `None`.
    #[must_use]
    pub fn banners(&self) -> watch::Receiver<Option<Banner>> {
        self.banner_tx.subscribe()
    }

    /// Stop reacting to events and cancel any pending synthetic
    /// notifications. In-flight re-fetches are left to finish.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for StateReconciler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    api: Arc<dyn DashboardApi>,
    dispatcher: EventDispatcher,
    view: DashboardView,
    banner_tx: watch::Sender<Option<Banner>>,
    cancel: CancellationToken,
    notification_delay: Duration,
}

impl Worker {
    async fn run(self, mut event_rx: mpsc::UnboundedReceiver<DispatchedEvent>) {
        loop {
            let event = tokio::select! {
                () = self.cancel.cancelled() => return,
                event = event_rx.recv() => match event {
                    Some(event) => event,
                    None => return,
                },
            };
            self.handle(&event);
        }
    }

    fn handle(&self, event: &DispatchedEvent) {
        let kind = event.kind();
        match rule_for(kind) {
            ReconcileAction::Ignore => {}
            ReconcileAction::Refetch => self.spawn_refetch(kind),
            ReconcileAction::RefetchAndNotify => {
                let object = event.payload.object_name().unwrap_or("file");
                // send_replace stores the banner even before any receiver
                // subscribes, so a late UI still sees the latest one.
                let _ = self.banner_tx.send_replace(Some(Banner::Success(format!(
                    "📧 Email sent: Migration completed for {object}"
                ))));
                self.spawn_refetch(kind);
                self.schedule_notification();
            }
            ReconcileAction::RefetchAndAlert => {
                let object = event.payload.object_name().unwrap_or("file");
                let _ = self.banner_tx.send_replace(Some(Banner::Error(format!(
                    "Migration failed for {object}"
                ))));
                self.spawn_refetch(kind);
            }
        }
    }

    /// One fire-and-forget re-fetch cycle. Cycles may overlap under event
    /// bursts; each replaces the view wholesale on success, so the last
    /// writer wins. A failed cycle keeps the previous view.
    fn spawn_refetch(&self, trigger: EventKind) {
        let api = Arc::clone(&self.api);
        let view = self.view.clone();
        let _ = tokio::spawn(async move {
            match fetch_snapshot(api.as_ref()).await {
                Ok(snapshot) => {
                    debug!(%trigger, "view refreshed");
                    view.replace(snapshot);
                }
                Err(err) => {
                    warn!(%trigger, error = %err, "re-fetch cycle failed, keeping previous view");
                }
            }
        });
    }

    /// Publish the synthetic `email_sent` event after the configured
    /// delay, unless shutdown cancels it first.
    fn schedule_notification(&self) {
        let dispatcher = self.dispatcher.clone();
        let cancel = self.cancel.clone();
        let delay = self.notification_delay;
        let _ = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = dispatcher.publish(PushEvent::EmailSent {});
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudflow_api::{
        ApiError, CloudCredential, DashboardSummary, DataObject, MigrationJob,
        RecommendationReport,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory API double that counts fetch calls and can be told to
    /// fail.
    #[derive(Default)]
    struct RecordingApi {
        cycles: AtomicUsize,
        fail: AtomicBool,
        migrations: parking_lot::Mutex<Vec<MigrationJob>>,
    }

    impl RecordingApi {
        fn failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), ApiError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(ApiError::Status {
                    status: reqwest_status(),
                    path: "/api/v1/migration/".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn reqwest_status() -> reqwest::StatusCode {
        reqwest::StatusCode::INTERNAL_SERVER_ERROR
    }

    #[async_trait::async_trait]
    impl DashboardApi for RecordingApi {
        async fn fetch_summary(&self) -> Result<DashboardSummary, ApiError> {
            self.check()?;
            Ok(DashboardSummary::default())
        }

        async fn fetch_migrations(&self) -> Result<Vec<MigrationJob>, ApiError> {
            self.check()?;
            let _ = self.cycles.fetch_add(1, Ordering::SeqCst);
            Ok(self.migrations.lock().clone())
        }

        async fn fetch_data_objects(&self) -> Result<Vec<DataObject>, ApiError> {
            self.check()?;
            Ok(Vec::new())
        }

        async fn fetch_recommendations(&self) -> Result<RecommendationReport, ApiError> {
            self.check()?;
            Ok(RecommendationReport::default())
        }

        async fn fetch_credentials(&self) -> Result<Vec<CloudCredential>, ApiError> {
            self.check()?;
            Ok(Vec::new())
        }
    }

    fn complete(job_id: &str, object_name: Option<&str>) -> PushEvent {
        PushEvent::MigrationComplete {
            job_id: job_id.to_string(),
            object_name: object_name.map(String::from),
            progress: Some(100.0),
        }
    }

    async fn settle() {
        // Paused-clock runtimes auto-advance; this just yields until the
        // spawned cycles have run.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[test]
    fn rule_table_matches_contract() {
        assert_eq!(rule_for(EventKind::MigrationUpdate), ReconcileAction::Refetch);
        assert_eq!(
            rule_for(EventKind::MigrationComplete),
            ReconcileAction::RefetchAndNotify
        );
        assert_eq!(
            rule_for(EventKind::MigrationFailed),
            ReconcileAction::RefetchAndAlert
        );
        for kind in [
            EventKind::MigrationProgress,
            EventKind::DashboardUpdate,
            EventKind::Alert,
            EventKind::StreamEvent,
            EventKind::EmailSent,
        ] {
            assert_eq!(rule_for(kind), ReconcileAction::Ignore);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn update_event_triggers_one_cycle() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = EventDispatcher::new();
        let reconciler =
            StateReconciler::start(api.clone(), &dispatcher, Duration::from_millis(500));

        let _ = dispatcher.publish(PushEvent::MigrationUpdate {
            job_id: "j1".to_string(),
            progress: Some(10.0),
            object_name: None,
            status: None,
        });
        settle().await;

        assert_eq!(api.cycles.load(Ordering::SeqCst), 1);
        assert!(reconciler.view().snapshot().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_kinds_do_not_refetch() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = EventDispatcher::new();
        let _reconciler =
            StateReconciler::start(api.clone(), &dispatcher, Duration::from_millis(500));

        let _ = dispatcher.publish(PushEvent::DashboardUpdate {
            data: serde_json::json!({}),
        });
        let _ = dispatcher.publish(PushEvent::EmailSent {});
        settle().await;

        assert_eq!(api.cycles.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_raises_banner_and_schedules_notification() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = EventDispatcher::new();
        let reconciler =
            StateReconciler::start(api.clone(), &dispatcher, Duration::from_millis(500));

        let emails = Arc::new(AtomicUsize::new(0));
        let _sub = dispatcher.subscribe(EventKind::EmailSent, {
            let emails = Arc::clone(&emails);
            move |_| {
                let _ = emails.fetch_add(1, Ordering::SeqCst);
            }
        });

        let mut banners = reconciler.banners();
        let _ = dispatcher.publish(complete("j1", Some("report.csv")));
        settle().await;

        assert_eq!(
            *banners.borrow_and_update(),
            Some(Banner::Success(
                "📧 Email sent: Migration completed for report.csv".to_string()
            ))
        );
        // The banner is immediate; the synthetic event waits out the delay.
        assert_eq!(emails.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(emails.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_without_object_name_falls_back_to_file() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = EventDispatcher::new();
        let reconciler =
            StateReconciler::start(api, &dispatcher, Duration::from_millis(500));

        let mut banners = reconciler.banners();
        let _ = dispatcher.publish(complete("j1", None));
        settle().await;

        assert_eq!(
            *banners.borrow_and_update(),
            Some(Banner::Success(
                "📧 Email sent: Migration completed for file".to_string()
            ))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failure_raises_error_banner() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = EventDispatcher::new();
        let reconciler =
            StateReconciler::start(api.clone(), &dispatcher, Duration::from_millis(500));

        let mut banners = reconciler.banners();
        let _ = dispatcher.publish(PushEvent::MigrationFailed {
            job_id: "j9".to_string(),
            object_name: Some("big.bin".to_string()),
            error: Some("target unreachable".to_string()),
        });
        settle().await;

        assert_eq!(
            *banners.borrow_and_update(),
            Some(Banner::Error("Migration failed for big.bin".to_string()))
        );
        assert_eq!(api.cycles.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_subscriber_sees_latest_banner() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = EventDispatcher::new();
        let reconciler =
            StateReconciler::start(api, &dispatcher, Duration::from_millis(500));

        let _ = dispatcher.publish(PushEvent::MigrationFailed {
            job_id: "j9".to_string(),
            object_name: None,
            error: None,
        });
        settle().await;

        // Subscribed only after the banner was raised.
        assert_eq!(
            *reconciler.banners().borrow(),
            Some(Banner::Error("Migration failed for file".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_notification() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = EventDispatcher::new();
        let reconciler =
            StateReconciler::start(api, &dispatcher, Duration::from_secs(60));

        let emails = Arc::new(AtomicUsize::new(0));
        let _sub = dispatcher.subscribe(EventKind::EmailSent, {
            let emails = Arc::clone(&emails);
            move |_| {
                let _ = emails.fetch_add(1, Ordering::SeqCst);
            }
        });

        let _ = dispatcher.publish(complete("j1", None));
        settle().await;
        reconciler.shutdown();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(emails.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_keeps_previous_view() {
        let api = Arc::new(RecordingApi::default());
        api.migrations.lock().push(MigrationJob {
            job_id: "abc123456789".to_string(),
            ..MigrationJob::default()
        });
        let dispatcher = EventDispatcher::new();
        let reconciler =
            StateReconciler::start(api.clone(), &dispatcher, Duration::from_millis(500));

        let _ = dispatcher.publish(complete("j1", None));
        settle().await;
        let first = reconciler.view().snapshot().expect("first cycle succeeded");
        assert_eq!(first.migrations.len(), 1);

        api.failing(true);
        let _ = dispatcher.publish(complete("j2", None));
        settle().await;

        let second = reconciler.view().snapshot().expect("view retained");
        assert_eq!(second.migrations.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn events_after_shutdown_are_ignored() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = EventDispatcher::new();
        let reconciler =
            StateReconciler::start(api.clone(), &dispatcher, Duration::from_millis(500));

        reconciler.shutdown();
        settle().await;
        let _ = dispatcher.publish(complete("j1", None));
        settle().await;

        assert_eq!(api.cycles.load(Ordering::SeqCst), 0);
    }
}
