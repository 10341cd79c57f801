//! Session context
//!
//! One object holds everything a dashboard session mutates: strategy
//! parameters, the clock, the degradation integrator, the latest applied
//! race snapshot, and the derived outputs. The engine functions stay pure;
//! this type decides when each of them runs:
//!
//! - clock tick: integrate degradation, re-evaluate alerts, request a fetch
//! - fetch completion: re-run adjustment and normalization (stale answers dropped)
//! - parameter change: re-run adjustment and alerts, never integration

use crate::adjustment::{adjust, sanitize_penalty, NO_PENALTY};
use crate::alerts::{evaluate, Alert};
use crate::clock::SimulationClock;
use crate::degradation::{DegradationIntegrator, DegradationState};
use crate::error::ParameterError;
use crate::model::{AdjustedTelemetrySnapshot, RaceState, RawTelemetrySnapshot, TrackPoint, Weather};
use crate::normalize::{is_valid_point, normalize, DriverPosition, RenderFrame};
use crate::strategy::{PlaybackSpeed, StrategyParameters};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag attached to an outstanding telemetry request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FetchTicket {
    /// Monotonic per session, issue order
    pub seq: u64,
    /// Session time the request targets
    pub session_time: f64,
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Snapshot became the current one
    Applied,
    /// A newer request already completed; response dropped
    Stale,
    /// Source had nothing for this time; previous snapshot kept
    Empty,
}

/// Serializable picture of the session for the rendering layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    pub session_time: f64,
    pub playing: bool,
    pub playback_speed: PlaybackSpeed,
    pub driver: String,
    pub parameters: StrategyParameters,
    pub performance_penalty: f64,
    pub raw: Option<RawTelemetrySnapshot>,
    pub adjusted: Option<AdjustedTelemetrySnapshot>,
    pub degradation: DegradationState,
    pub alerts: Vec<Alert>,
    pub render: RenderFrame,
    pub track_svg: Option<String>,
    pub weather: Option<Weather>,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    params: StrategyParameters,
    performance_penalty: f64,
    selected_driver: String,
    clock: SimulationClock,
    integrator: DegradationIntegrator,
    race_state: Option<RaceState>,
    track_outline: Option<Vec<TrackPoint>>,
    adjusted: Option<AdjustedTelemetrySnapshot>,
    alerts: Vec<Alert>,
    render: RenderFrame,
    next_seq: u64,
    applied_seq: Option<u64>,
}

impl SessionContext {
    pub fn new(driver: impl Into<String>, params: StrategyParameters, clock: SimulationClock) -> Self {
        let mut integrator = DegradationIntegrator::new();
        integrator.tick_for(clock.session_time(), false);
        let alerts = evaluate(&integrator.state());

        Self {
            params: params.sanitized(),
            performance_penalty: NO_PENALTY,
            selected_driver: driver.into(),
            clock,
            integrator,
            race_state: None,
            track_outline: None,
            adjusted: None,
            alerts,
            render: RenderFrame::default(),
            next_seq: 0,
            applied_seq: None,
        }
    }

    // === Accessors ===

    pub fn params(&self) -> &StrategyParameters {
        &self.params
    }

    pub fn performance_penalty(&self) -> f64 {
        self.performance_penalty
    }

    pub fn selected_driver(&self) -> &str {
        &self.selected_driver
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn degradation(&self) -> DegradationState {
        self.integrator.state()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn adjusted(&self) -> Option<&AdjustedTelemetrySnapshot> {
        self.adjusted.as_ref()
    }

    pub fn race_state(&self) -> Option<&RaceState> {
        self.race_state.as_ref()
    }

    pub fn render(&self) -> &RenderFrame {
        &self.render
    }

    /// Raw snapshot of the selected driver from the last applied fetch
    pub fn selected_snapshot(&self) -> Option<&RawTelemetrySnapshot> {
        self.race_state
            .as_ref()
            .and_then(|s| s.driver(&self.selected_driver))
    }

    // === Clock ===

    pub fn play(&mut self) {
        self.clock.play();
        // Paused time must not count once playback resumes
        self.integrator.tick_for(self.clock.session_time(), false);
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn set_playback_speed(&mut self, speed: PlaybackSpeed) {
        self.clock.set_speed(speed);
    }

    /// Advance the clock one step.
    ///
    /// When the clock moved, degradation is integrated over the elapsed
    /// simulated time, alerts are rebuilt, and a fetch ticket for the new
    /// time is returned.
    pub fn tick(&mut self) -> Option<FetchTicket> {
        let time = self.clock.advance()?;
        self.integrator.observe(time, true, &self.params);
        self.alerts = evaluate(&self.integrator.state());
        Some(self.begin_fetch(time))
    }

    /// Jump the clock to `time`.
    ///
    /// A seek is not elapsed time: the integrator only re-anchors on the new
    /// time, so scrubbing backward never replays wear and heat.
    pub fn seek(&mut self, time: f64) -> Result<FetchTicket, ParameterError> {
        let time = self.clock.seek(time)?;
        self.integrator.tick_for(time, false);
        Ok(self.begin_fetch(time))
    }

    // === Fetch sequencing ===

    /// Issue a ticket for a request targeting `session_time`
    pub fn begin_fetch(&mut self, session_time: f64) -> FetchTicket {
        let ticket = FetchTicket {
            seq: self.next_seq,
            session_time,
        };
        self.next_seq += 1;
        ticket
    }

    /// Apply the answer to `ticket` unless a newer request already completed.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, state: Option<RaceState>) -> FetchOutcome {
        if self.applied_seq.is_some_and(|applied| ticket.seq <= applied) {
            return FetchOutcome::Stale;
        }
        self.applied_seq = Some(ticket.seq);

        match state {
            Some(state) => {
                self.race_state = Some(state);
                self.recompute_snapshot_outputs();
                FetchOutcome::Applied
            }
            None => FetchOutcome::Empty,
        }
    }

    // === Operator parameters ===

    /// Replace the strategy parameters.
    ///
    /// Adjustment and alerts are recomputed immediately; degradation is not
    /// integrated.
    pub fn set_parameters(&mut self, params: StrategyParameters) {
        self.params = params.sanitized();
        self.recompute_snapshot_outputs();
        self.alerts = evaluate(&self.integrator.state());
    }

    /// Edit the parameters in place, keeping the old ones if `f` fails.
    pub fn update_parameters<F>(&mut self, f: F) -> Result<(), ParameterError>
    where
        F: FnOnce(&mut StrategyParameters) -> Result<(), ParameterError>,
    {
        let mut next = self.params;
        f(&mut next)?;
        self.set_parameters(next);
        Ok(())
    }

    pub fn set_performance_penalty(&mut self, penalty: f64) {
        self.performance_penalty = sanitize_penalty(penalty);
        self.recompute_snapshot_outputs();
    }

    /// Switch the focused driver. The old driver's track outline is dropped.
    pub fn select_driver(&mut self, driver: impl Into<String>) {
        self.selected_driver = driver.into();
        self.track_outline = None;
        self.recompute_snapshot_outputs();
    }

    pub fn set_track_outline(&mut self, outline: Option<Vec<TrackPoint>>) {
        self.track_outline = outline;
        self.recompute_snapshot_outputs();
    }

    /// Restart the session: clock rewound and paused, fresh tyres, cold
    /// engine, no snapshot. Requests issued before the reset are dropped
    /// when they complete.
    pub fn reset(&mut self) {
        self.clock.rewind();
        self.integrator.reset();
        self.integrator.tick_for(self.clock.session_time(), false);
        self.race_state = None;
        self.adjusted = None;
        self.alerts = evaluate(&self.integrator.state());
        self.render = RenderFrame::default();
        if self.next_seq > 0 {
            self.applied_seq = Some(self.next_seq - 1);
        }
    }

    // === Derived outputs ===

    fn recompute_snapshot_outputs(&mut self) {
        self.adjusted = adjust(self.selected_snapshot(), &self.params, self.performance_penalty);
        self.render = self.compute_render();
    }

    fn compute_render(&self) -> RenderFrame {
        let mut positions: Vec<DriverPosition> = self
            .race_state
            .iter()
            .flat_map(|s| s.drivers.iter())
            .map(|d| DriverPosition {
                label: d.driver.clone(),
                position: d.position,
                ghost: false,
                raw: TrackPoint::new(d.x, d.y),
            })
            .collect();

        // A driver without a reported position gets no ghost either
        if let (Some(adjusted), Some(raw)) = (&self.adjusted, self.selected_snapshot()) {
            if is_valid_point(&TrackPoint::new(raw.x, raw.y)) {
                positions.push(DriverPosition {
                    label: adjusted.driver.clone(),
                    position: raw.position,
                    ghost: true,
                    raw: TrackPoint::new(adjusted.x, adjusted.y),
                });
            }
        }

        normalize(&positions, self.track_outline.as_deref())
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            generated_at: Utc::now(),
            session_time: self.clock.session_time(),
            playing: self.clock.is_playing(),
            playback_speed: self.clock.speed(),
            driver: self.selected_driver.clone(),
            parameters: self.params,
            performance_penalty: self.performance_penalty,
            raw: self.selected_snapshot().cloned(),
            adjusted: self.adjusted.clone(),
            degradation: self.integrator.state(),
            alerts: self.alerts.clone(),
            render: self.render.clone(),
            track_svg: self.render.track.as_ref().map(|t| t.to_svg_path()),
            weather: self.race_state.as_ref().and_then(|r| r.weather.clone()),
        }
    }
}
