//! Runner configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object (or
//! no file at all) yields a playable demo session.

use anyhow::{Context, Result};
use pw_core::clock::SimulationClock;
use pw_core::{PlaybackSpeed, SessionContext, StrategyParameters, TelemetrySource};
use pw_sources::{DemoSource, TimeseriesSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Where race snapshots come from
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    #[default]
    Demo,
    Timeseries { path: PathBuf },
}

/// Configuration for a dashboard sink
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Log,
    File { path: PathBuf },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub source: SourceConfig,

    /// Driver code the strategy is evaluated for
    pub driver: String,

    pub parameters: StrategyParameters,

    pub playback_speed: PlaybackSpeed,

    /// Clock step in milliseconds; also the wall-clock period at 1x
    pub tick_ms: u64,

    /// Defaults to the start of the source's session
    pub start_time: Option<f64>,

    /// Defaults to the end of the source's session
    pub end_time: Option<f64>,

    pub performance_penalty: f64,

    /// Start playing immediately
    pub autoplay: bool,

    /// Stop the runner after this many clock ticks
    pub max_ticks: Option<u64>,

    pub sinks: Vec<SinkConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::Demo,
            driver: "VER".to_string(),
            parameters: StrategyParameters::default(),
            playback_speed: PlaybackSpeed::X1,
            tick_ms: 1000,
            start_time: None,
            end_time: None,
            performance_penalty: 1.0,
            autoplay: false,
            max_ticks: None,
            sinks: vec![SinkConfig::Log],
        }
    }
}

impl RunnerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn build_source(&self) -> Result<Arc<dyn TelemetrySource>> {
        Ok(match &self.source {
            SourceConfig::Demo => Arc::new(DemoSource::new()),
            SourceConfig::Timeseries { path } => Arc::new(TimeseriesSource::load(path)?),
        })
    }

    /// Clock step in simulated seconds
    pub fn step_secs(&self) -> f64 {
        self.tick_ms.max(1) as f64 / 1000.0
    }

    /// Fresh session positioned at the configured (or source) start time
    pub fn build_session(&self, source: &dyn TelemetrySource) -> SessionContext {
        let bounds = source.session_bounds();
        let start = self
            .start_time
            .or(bounds.map(|(start, _)| start))
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(0.0);
        let end = self.end_time.or(bounds.map(|(_, end)| end));

        let mut clock = SimulationClock::new(start)
            .with_end_time(end)
            .with_step(self.step_secs());
        clock.set_speed(self.playback_speed);

        let mut session = SessionContext::new(self.driver.clone(), self.parameters, clock);
        session.set_performance_penalty(self.performance_penalty);
        session
    }
}
