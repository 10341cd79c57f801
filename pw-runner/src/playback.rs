//! Playback task
//!
//! Drives the session clock while playing. Each step advances simulated
//! time, integrates degradation, publishes the new view, and dispatches a
//! snapshot fetch for the new session time.

use crate::fetch;
use crate::state::AppState;
use pw_core::FetchTicket;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What one playback step did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Ticked(FetchTicket),
    Paused,
    Finished,
}

/// Advance the session by one clock step
pub async fn step(state: &AppState) -> Step {
    let step = {
        let mut session = state.session.write().await;
        match session.tick() {
            Some(ticket) => Step::Ticked(ticket),
            None if session.clock().is_finished() => Step::Finished,
            None => Step::Paused,
        }
    };

    if let Step::Ticked(ticket) = step {
        state.publish().await;
        fetch::dispatch(state, ticket);
    }
    step
}

/// Start (or restart) the playback task
pub async fn start_playback_task(state: AppState) {
    let cancel_token = CancellationToken::new();
    {
        let mut cancel = state.playback_cancel.write().await;
        if let Some(token) = cancel.take() {
            token.cancel();
        }
        *cancel = Some(cancel_token.clone());
    }

    tokio::spawn(async move {
        info!("Playback task started");
        let mut ticks: u64 = 0;

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            let interval = state.session.read().await.clock().tick_interval();
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {},
            }

            match step(&state).await {
                Step::Ticked(_) => ticks += 1,
                Step::Paused => break,
                Step::Finished => {
                    info!("Reached end of session");
                    state.publish().await;
                    break;
                }
            }

            if state.max_ticks.is_some_and(|max| ticks >= max) {
                info!("Stopping after {} ticks", ticks);
                state.session.write().await.pause();
                state.shutdown.cancel();
                break;
            }
        }

        info!("Playback task stopped");
    });
}
