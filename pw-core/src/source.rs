//! Telemetry source trait definition

use crate::model::{DriverInfo, RaceState, TrackPoint};
use anyhow::Result;

/// Trait for external suppliers of race snapshots
///
/// Each source is responsible for:
/// - Answering "what did the field look like at session time t"
/// - Supplying a track outline and metadata for a selected driver
///
/// Implementations are queried from a blocking worker, so calls may take
/// time, but they must not hold locks on session state.
pub trait TelemetrySource: Send + Sync {
    /// Get the name of this source (e.g., "Demo", "Timeseries")
    fn name(&self) -> &str;

    /// Read the race state closest to `session_time`
    ///
    /// Returns:
    /// - `Ok(Some(state))` if a snapshot is available
    /// - `Ok(None)` if there is nothing for this time
    /// - `Err(_)` if the source failed
    fn race_state_at(&self, session_time: f64) -> Result<Option<RaceState>>;

    /// Track outline as seen from `driver`'s trace, if known
    fn track_outline(&self, driver: &str) -> Result<Option<Vec<TrackPoint>>>;

    /// Team and lap count for `driver`
    fn driver_info(&self, driver: &str) -> Option<DriverInfo>;

    /// First and last session time the source can answer for
    fn session_bounds(&self) -> Option<(f64, f64)>;
}
