//! PitWall telemetry sources
//!
//! Implementations of [`pw_core::TelemetrySource`]: a deterministic demo race
//! and a recorded time-series loaded from disk.

pub mod demo;
pub mod timeseries;

pub use demo::DemoSource;
pub use timeseries::TimeseriesSource;
