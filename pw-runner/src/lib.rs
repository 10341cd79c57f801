//! PitWall Runner Library
//!
//! Wires a telemetry source to a strategy session: playback, operator
//! commands, fetch sequencing and dashboard sinks.

pub mod config;
pub mod control;
pub mod fetch;
pub mod playback;
pub mod sinks;
pub mod state;

use anyhow::Result;
use config::RunnerConfig;
use control::OperatorCommand;
use pw_core::TelemetrySource;
use state::AppState;
use std::sync::Arc;
use tracing::info;

/// Build the session and start its background tasks.
///
/// The initial snapshot and track outline are requested before returning.
pub async fn launch(config: &RunnerConfig, source: Arc<dyn TelemetrySource>) -> Result<AppState> {
    let sinks = config
        .sinks
        .iter()
        .map(sinks::create_sink)
        .collect::<Result<Vec<_>>>()?;

    let session = config.build_session(source.as_ref());
    let (state, fetch_rx) = AppState::new(session, source);
    let state = state.with_max_ticks(config.max_ticks);

    info!(
        "Session ready: source {}, driver {}, {} sink(s)",
        state.source.name(),
        config.driver,
        sinks.len()
    );

    let views = state.subscribe();
    tokio::spawn(sinks::run_sinks(state.clone(), views, sinks));
    tokio::spawn(fetch::run_completions(state.clone(), fetch_rx));

    control::prime(&state).await;

    if config.autoplay {
        control::apply_command(&state, OperatorCommand::Play).await?;
    }
    Ok(state)
}
