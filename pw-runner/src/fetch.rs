//! Snapshot fetching
//!
//! Source queries run on the blocking pool and report back through the
//! state's fetch channel. A single completion loop applies them to the
//! session in arrival order; the session discards answers that were
//! overtaken by a newer request.

use crate::state::{AppState, FetchResult};
use anyhow::{anyhow, Context, Result};
use pw_core::{FetchOutcome, FetchTicket};
use tracing::{debug, error, info, warn};

/// Query the source for `ticket` in the background
pub fn dispatch(state: &AppState, ticket: FetchTicket) {
    let source = state.source.clone();
    let tx = state.fetch_tx.clone();

    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || source.race_state_at(ticket.session_time))
            .await
            .unwrap_or_else(|e| Err(anyhow!("fetch task failed: {}", e)));

        if tx.send(FetchResult { ticket, result }).is_err() {
            debug!("Fetch {} finished after shutdown", ticket.seq);
        }
    });
}

/// Apply one completed fetch and publish the view if anything changed
pub async fn apply(state: &AppState, done: FetchResult) -> FetchOutcome {
    let FetchResult { ticket, result } = done;

    let race_state = match result {
        Ok(race_state) => race_state,
        Err(e) => {
            // Keep showing the last good snapshot
            error!("Fetch for t={:.1} failed: {}", ticket.session_time, e);
            None
        }
    };

    let outcome = state.session.write().await.complete_fetch(ticket, race_state);
    match outcome {
        FetchOutcome::Applied => {
            state.publish().await;
        }
        FetchOutcome::Stale => {
            debug!(
                "Discarding stale fetch {} for t={:.1}",
                ticket.seq, ticket.session_time
            );
        }
        FetchOutcome::Empty => {
            warn!("No race state at t={:.1}", ticket.session_time);
        }
    }
    outcome
}

/// Completion loop; runs until every sender is dropped or shutdown
pub async fn run_completions(
    state: AppState,
    mut rx: tokio::sync::mpsc::UnboundedReceiver<FetchResult>,
) {
    info!("Fetch completion loop started");

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            done = rx.recv() => match done {
                Some(done) => {
                    apply(&state, done).await;
                }
                None => break,
            },
        }
    }

    info!("Fetch completion loop stopped");
}

/// Load the track outline for `driver` and attach it if the driver is still
/// selected when the source answers
pub async fn load_outline(state: &AppState, driver: String) -> Result<()> {
    let source = state.source.clone();
    let lookup = driver.clone();
    let outline = tokio::task::spawn_blocking(move || source.track_outline(&lookup))
        .await
        .map_err(|e| anyhow!("outline task failed: {}", e))?
        .with_context(|| format!("Failed to load track outline for {}", driver))?;

    if outline.is_none() {
        warn!("No track outline for {}", driver);
    }

    {
        let mut session = state.session.write().await;
        if !session.selected_driver().eq_ignore_ascii_case(&driver) {
            debug!("Driver changed while loading outline for {}", driver);
            return Ok(());
        }
        session.set_track_outline(outline);
    }
    state.publish().await;
    Ok(())
}
