//! PitWall Core Library
//!
//! This crate provides the race snapshot model, the operator's strategy
//! parameters, and the engine that turns raw telemetry into adjusted
//! estimates, tyre/engine degradation, alerts and render-space positions.

pub mod adjustment;
pub mod alerts;
pub mod clock;
pub mod degradation;
pub mod error;
pub mod model;
pub mod normalize;
pub mod session;
pub mod source;
pub mod strategy;
pub mod units;

pub use error::ParameterError;
pub use model::{RaceState, RawTelemetrySnapshot, Weather};
pub use session::{DashboardView, FetchOutcome, FetchTicket, SessionContext};
pub use source::TelemetrySource;
pub use strategy::{Compound, EngineMode, PlaybackSpeed, StrategyParameters};
