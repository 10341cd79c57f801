//! Strategy delta adjustment
//!
//! Layers the operator's what-if parameters over one raw snapshot. The
//! performance penalty scales the speed, RPM and position terms only;
//! throttle and tyre life are never penalised.

use crate::model::{AdjustedTelemetrySnapshot, RawTelemetrySnapshot};
use crate::strategy::{StrategyParameters, BASELINE_FUEL, BASELINE_PRESSURE};

/// Nominal performance, no penalty active
pub const NO_PENALTY: f64 = 1.0;

const FUEL_SPEED_GAIN: f64 = 0.4;
const FUEL_RPM_GAIN: f64 = 0.2;
const FUEL_THROTTLE_GAIN: f64 = 0.3;
const PRESSURE_SPEED_COST: f64 = 1.5;
const PRESSURE_WEAR_COST: f64 = 1.0;
const RPM_PER_PACE_UNIT: f64 = 20.0;
const X_PER_PACE_UNIT: f64 = 0.15;
const Y_PER_PACE_UNIT: f64 = 0.09;

/// Compute the adjusted estimate for `raw` under `params`.
///
/// Returns `None` when there is no raw snapshot to adjust.
pub fn adjust(
    raw: Option<&RawTelemetrySnapshot>,
    params: &StrategyParameters,
    performance_penalty: f64,
) -> Option<AdjustedTelemetrySnapshot> {
    let raw = raw?;
    let penalty = sanitize_penalty(performance_penalty);

    let pressure_diff = params.tire_pressure.0 - BASELINE_PRESSURE;
    // Positive means a lighter car than baseline
    let fuel_diff = BASELINE_FUEL - params.fuel_load.0;
    let effect = params.compound.effect();

    // Shared pace term behind the RPM and position deltas
    let pace = effect.speed + fuel_diff * FUEL_RPM_GAIN;

    let speed = (finite(raw.speed) + effect.speed + fuel_diff * FUEL_SPEED_GAIN
        - pressure_diff.abs() * PRESSURE_SPEED_COST)
        * penalty;
    let rpm = (finite(raw.rpm) + pace * RPM_PER_PACE_UNIT) * penalty;
    let throttle = (finite(raw.throttle) + fuel_diff * FUEL_THROTTLE_GAIN).clamp(0.0, 100.0);
    let tire_life = finite(raw.tire_life) + effect.wear - pressure_diff.abs() * PRESSURE_WEAR_COST;
    let x = finite(raw.x) + pace * X_PER_PACE_UNIT * penalty;
    let y = finite(raw.y) + pace * Y_PER_PACE_UNIT * penalty;

    Some(AdjustedTelemetrySnapshot {
        driver: raw.driver.clone(),
        speed,
        rpm,
        gear: raw.gear,
        throttle,
        brake: raw.brake,
        drs: raw.drs,
        compound: params.compound,
        tire_life,
        x,
        y,
    })
}

/// Penalties outside [0, 1] or non-finite collapse to sane values
pub fn sanitize_penalty(penalty: f64) -> f64 {
    if penalty.is_finite() {
        penalty.clamp(0.0, NO_PENALTY)
    } else {
        NO_PENALTY
    }
}

fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
