//! The assembled sync session.
//!
//! [`SyncSession`] wires the dispatcher, event log, reconciler, and
//! connection manager together under one client identity. The identity is
//! generated once per session and reused across reconnects, so the server
//! sees one stable subscriber.

use std::sync::Arc;

use cloudflow_api::DashboardApi;
use cloudflow_core::events::EventKind;
use cloudflow_core::ids::ClientId;
use cloudflow_settings::CloudflowSettings;
use tokio::sync::watch;
use tracing::info;

use crate::connection::{ConnectionManager, ConnectionStatus};
use crate::dispatcher::{EventDispatcher, Subscription};
use crate::log::{EventLog, LogEntry};
use crate::reconciler::{Banner, DashboardView, StateReconciler};

/// One dashboard sync session: push channel, event log, and reconciled
/// view behind a single handle.
pub struct SyncSession {
    client_id: ClientId,
    dispatcher: EventDispatcher,
    log: EventLog,
    connection: ConnectionManager,
    reconciler: StateReconciler,
    _log_subscriptions: Vec<Subscription>,
}

impl SyncSession {
    /// Assemble a session from settings and a data-access boundary.
    ///
    /// The event log subscribes to every kind, the reconciler to the
    /// migration family. Nothing is dialed until [`connect`](Self::connect).
    #[must_use]
    pub fn start(settings: &CloudflowSettings, api: Arc<dyn DashboardApi>) -> Self {
        let client_id = ClientId::generate();
        let dispatcher = EventDispatcher::new();

        let log = EventLog::with_capacity(settings.sync.event_log_capacity);
        let log_subscriptions = EventKind::ALL
            .into_iter()
            .map(|kind| {
                let log = log.clone();
                dispatcher.subscribe(kind, move |event| log.record(event))
            })
            .collect();

        let reconciler =
            StateReconciler::start(api, &dispatcher, settings.sync.notification_delay());
        let connection = ConnectionManager::new(&settings.sync, &client_id, dispatcher.clone());

        info!(%client_id, "sync session assembled");
        Self {
            client_id,
            dispatcher,
            log,
            connection,
            reconciler,
            _log_subscriptions: log_subscriptions,
        }
    }

    /// Open the push channel.
    pub fn connect(&self) {
        self.connection.connect();
    }

    /// Watch the push-channel lifecycle.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.status()
    }

    /// The session's stable client identity.
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The shared dispatcher, for additional consumers such as UI panels.
    #[must_use]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// The connection manager, for diagnostics.
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Snapshot of the operator event log, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    /// The reconciled dashboard view.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        self.reconciler.view()
    }

    /// Watch banner notifications raised by the reconciler.
    #[must_use]
    pub fn banners(&self) -> watch::Receiver<Option<Banner>> {
        self.reconciler.banners()
    }

    /// Tear the session down: close the channel and stop reconciling.
    /// Pending synthetic notifications are cancelled; in-flight re-fetches
    /// are left to finish.
    pub fn shutdown(&self) {
        self.connection.disconnect();
        self.reconciler.shutdown();
        info!(client_id = %self.client_id, "sync session shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudflow_api::{
        ApiError, CloudCredential, DashboardSummary, DataObject, MigrationJob,
        RecommendationReport,
    };
    use cloudflow_core::events::PushEvent;

    struct NullApi;

    #[async_trait::async_trait]
    impl DashboardApi for NullApi {
        async fn fetch_summary(&self) -> Result<DashboardSummary, ApiError> {
            Ok(DashboardSummary::default())
        }
        async fn fetch_migrations(&self) -> Result<Vec<MigrationJob>, ApiError> {
            Ok(Vec::new())
        }
        async fn fetch_data_objects(&self) -> Result<Vec<DataObject>, ApiError> {
            Ok(Vec::new())
        }
        async fn fetch_recommendations(&self) -> Result<RecommendationReport, ApiError> {
            Ok(RecommendationReport::default())
        }
        async fn fetch_credentials(&self) -> Result<Vec<CloudCredential>, ApiError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn sessions_get_distinct_client_ids() {
        let settings = CloudflowSettings::default();
        let a = SyncSession::start(&settings, Arc::new(NullApi));
        let b = SyncSession::start(&settings, Arc::new(NullApi));
        assert_ne!(a.client_id().as_str(), b.client_id().as_str());
    }

    #[tokio::test]
    async fn log_records_every_published_kind() {
        let settings = CloudflowSettings::default();
        let session = SyncSession::start(&settings, Arc::new(NullApi));

        let _ = session.dispatcher().publish(PushEvent::Alert {
            data: serde_json::json!({"severity": "low"}),
        });
        let _ = session.dispatcher().publish(PushEvent::StreamEvent {
            data: serde_json::json!({}),
        });

        let entries = session.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EventKind::StreamEvent);
        assert_eq!(entries[1].kind, EventKind::Alert);
    }

    #[tokio::test]
    async fn status_starts_idle() {
        let settings = CloudflowSettings::default();
        let session = SyncSession::start(&settings, Arc::new(NullApi));
        assert_eq!(*session.status().borrow(), ConnectionStatus::Idle);
        assert!(session.view().snapshot().is_none());
    }
}
