//! Application state management

use anyhow::Result;
use pw_core::{DashboardView, FetchTicket, RaceState, SessionContext, TelemetrySource};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Answer from the telemetry source for one fetch ticket
#[derive(Debug)]
pub struct FetchResult {
    pub ticket: FetchTicket,
    pub result: Result<Option<RaceState>>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The operator's session: parameters, clock, degradation, last snapshot
    pub session: Arc<RwLock<SessionContext>>,

    /// Supplier of race snapshots
    pub source: Arc<dyn TelemetrySource>,

    /// Broadcast channel for dashboard views
    /// Multiple consumers can subscribe to receive views
    pub view_tx: broadcast::Sender<DashboardView>,

    /// Completed fetches, applied in arrival order by the completion loop
    pub fetch_tx: mpsc::UnboundedSender<FetchResult>,

    /// Cancellation token for the playback task
    pub playback_cancel: Arc<RwLock<Option<CancellationToken>>>,

    /// Cancelled when the runner should exit
    pub shutdown: CancellationToken,

    /// Exit after this many clock ticks
    pub max_ticks: Option<u64>,
}

impl AppState {
    pub fn new(
        session: SessionContext,
        source: Arc<dyn TelemetrySource>,
    ) -> (Self, mpsc::UnboundedReceiver<FetchResult>) {
        // Create broadcast channel with capacity for 100 views
        let (view_tx, _) = broadcast::channel(100);
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();

        let state = Self {
            session: Arc::new(RwLock::new(session)),
            source,
            view_tx,
            fetch_tx,
            playback_cancel: Arc::new(RwLock::new(None)),
            shutdown: CancellationToken::new(),
            max_ticks: None,
        };
        (state, fetch_rx)
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Subscribe to dashboard views
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardView> {
        self.view_tx.subscribe()
    }

    /// Send the current session view to all subscribers
    pub async fn publish(&self) -> DashboardView {
        let view = self.session.read().await.view();
        // No subscribers is fine
        let _ = self.view_tx.send(view.clone());
        view
    }

    /// Stop the playback task, if one is running
    pub async fn cancel_playback(&self) {
        let mut cancel = self.playback_cancel.write().await;
        if let Some(token) = cancel.take() {
            token.cancel();
        }
    }
}
