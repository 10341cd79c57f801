//! Tyre wear and engine heat integration
//!
//! [`integrate`] is a pure reducer `(DegradationState, Tick) -> DegradationState`.
//! [`DegradationIntegrator`] wraps it with the last observed session time so
//! callers can feed raw clock readings; a backward jump or a paused clock
//! produces a zero-length tick.

use crate::strategy::StrategyParameters;
use crate::units::{Celsius, Percentage};
use serde::{Deserialize, Serialize};

pub const TIRE_WEAR_MIN: f64 = 0.0;
pub const TIRE_WEAR_MAX: f64 = 100.0;
pub const ENGINE_HEAT_MIN: f64 = 70.0;
pub const ENGINE_HEAT_MAX: f64 = 130.0;

/// Tyre percentage lost per simulated second before modifiers
pub const BASE_WEAR_RATE: f64 = 0.05;
const FUEL_WEAR_FACTOR: f64 = 0.4;
const FUEL_CAPACITY: f64 = 110.0;

/// Remaining tyre life and engine temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradationState {
    /// Remaining tyre life, 100 = fresh
    pub tire_wear: Percentage,
    pub engine_heat: Celsius,
}

impl Default for DegradationState {
    fn default() -> Self {
        Self::fresh()
    }
}

impl DegradationState {
    /// Fresh tyres and a cold engine, the state at session start
    pub fn fresh() -> Self {
        Self {
            tire_wear: Percentage(TIRE_WEAR_MAX),
            engine_heat: Celsius(ENGINE_HEAT_MIN),
        }
    }

    /// Build a state from arbitrary values, clamped into bounds.
    pub fn new(tire_wear: f64, engine_heat: f64) -> Self {
        Self {
            tire_wear: Percentage(clamp_or(tire_wear, TIRE_WEAR_MIN, TIRE_WEAR_MAX, TIRE_WEAR_MAX)),
            engine_heat: Celsius(clamp_or(
                engine_heat,
                ENGINE_HEAT_MIN,
                ENGINE_HEAT_MAX,
                ENGINE_HEAT_MIN,
            )),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::fresh();
    }
}

/// Elapsed simulated time to integrate over
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub delta_time: f64,
}

impl Tick {
    pub fn new(delta_time: f64) -> Self {
        Self { delta_time }
    }

    /// A tick that integrates nothing
    pub fn idle() -> Self {
        Self { delta_time: 0.0 }
    }

    pub fn is_idle(&self) -> bool {
        !self.delta_time.is_finite() || self.delta_time <= 0.0
    }
}

/// Tyre percentage lost per simulated second for these parameters
pub fn wear_rate(params: &StrategyParameters) -> f64 {
    let fuel = params.fuel_load.0.clamp(0.0, FUEL_CAPACITY);
    let fuel_modifier = 1.0 + (fuel / FUEL_CAPACITY) * FUEL_WEAR_FACTOR;
    BASE_WEAR_RATE * params.compound.wear_modifier() * fuel_modifier
}

/// Advance `state` by one tick under `params`.
///
/// Ticks with a non-positive or non-finite delta return the state unchanged.
pub fn integrate(state: DegradationState, tick: Tick, params: &StrategyParameters) -> DegradationState {
    if tick.is_idle() {
        return state;
    }
    let dt = tick.delta_time;

    let tire_wear = (state.tire_wear.0 - dt * wear_rate(params)).clamp(TIRE_WEAR_MIN, TIRE_WEAR_MAX);
    let engine_heat = (state.engine_heat.0 + dt * params.engine_mode.heat_rate())
        .clamp(ENGINE_HEAT_MIN, ENGINE_HEAT_MAX);

    DegradationState {
        tire_wear: Percentage(tire_wear),
        engine_heat: Celsius(engine_heat),
    }
}

/// Owns the degradation state and the last session time it observed
#[derive(Debug, Clone, Default)]
pub struct DegradationIntegrator {
    state: DegradationState,
    last_time: Option<f64>,
}

impl DegradationIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DegradationState {
        self.state
    }

    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    /// Turn a clock reading into a tick.
    ///
    /// The first reading, a backward jump, or a reading taken while the
    /// clock is not running yields an idle tick. The reading always becomes
    /// the new reference time.
    pub fn tick_for(&mut self, session_time: f64, running: bool) -> Tick {
        if !session_time.is_finite() {
            return Tick::idle();
        }
        let previous = self.last_time.replace(session_time);
        match previous {
            Some(prev) if running && session_time > prev => Tick::new(session_time - prev),
            _ => Tick::idle(),
        }
    }

    /// Observe a clock reading and integrate the elapsed time.
    pub fn observe(
        &mut self,
        session_time: f64,
        running: bool,
        params: &StrategyParameters,
    ) -> DegradationState {
        let tick = self.tick_for(session_time, running);
        self.state = integrate(self.state, tick, params);
        self.state
    }

    /// Session restart: fresh tyres, cold engine, no reference time.
    ///
    /// This is the only way tyre life goes back up; pit stops are not modelled.
    pub fn reset(&mut self) {
        self.state.reset();
        self.last_time = None;
    }
}

fn clamp_or(v: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v.clamp(min, max)
    } else {
        fallback
    }
}
