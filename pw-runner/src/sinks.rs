//! Output sink implementations
//!
//! Sinks hand dashboard views to the rendering side: a one-line log summary
//! or an NDJSON file a front end can tail.

use crate::config::SinkConfig;
use crate::state::AppState;
use anyhow::{Context, Result};
use pw_core::DashboardView;
use std::path::Path;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Trait for output sinks
pub trait DashboardSink: Send {
    fn send(&mut self, view: &DashboardView) -> Result<()>;
}

/// Summary line per view through `tracing`
pub struct LogSink;

impl DashboardSink for LogSink {
    fn send(&mut self, view: &DashboardView) -> Result<()> {
        let (speed, rpm) = view
            .adjusted
            .as_ref()
            .map(|a| (a.speed, a.rpm))
            .unwrap_or_default();
        let alerts: Vec<&str> = view.alerts.iter().map(|a| a.id.as_str()).collect();

        info!(
            "[{}] t={:.1}s {} {} {:.1} km/h {:.0} rpm | tyre {:.1}% engine {:.1}C | alerts {:?}",
            view.generated_at.format("%H:%M:%S%.3f"),
            view.session_time,
            view.driver,
            view.parameters.compound,
            speed,
            rpm,
            view.degradation.tire_wear.0,
            view.degradation.engine_heat.0,
            alerts
        );
        Ok(())
    }
}

/// File sink (NDJSON)
pub struct FileSink {
    file: std::fs::File,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        use std::fs::OpenOptions;
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open sink file {}", path.display()))?;
        Ok(Self { file })
    }
}

impl DashboardSink for FileSink {
    fn send(&mut self, view: &DashboardView) -> Result<()> {
        use std::io::Write;
        let json = serde_json::to_string(view)?;
        writeln!(self.file, "{}", json)?;
        Ok(())
    }
}

/// Create a sink from configuration
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn DashboardSink>> {
    match config {
        SinkConfig::Log => Ok(Box::new(LogSink)),
        SinkConfig::File { path } => Ok(Box::new(FileSink::new(path)?)),
    }
}

/// Forward every view received on `rx` to `sinks` until shutdown
pub async fn run_sinks(
    state: AppState,
    mut rx: broadcast::Receiver<DashboardView>,
    mut sinks: Vec<Box<dyn DashboardSink>>,
) {
    loop {
        let view = tokio::select! {
            _ = state.shutdown.cancelled() => break,
            view = rx.recv() => view,
        };

        match view {
            Ok(view) => {
                for sink in sinks.iter_mut() {
                    if let Err(e) = sink.send(&view) {
                        warn!("Sink error: {:#}", e);
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Sinks lagging, skipped {} views", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
