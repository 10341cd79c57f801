//! Operator-controlled "what-if" strategy parameters
//!
//! Enum labels parse leniently when they come from telemetry or config
//! (unknown compounds fall back to MEDIUM, unknown engine modes to
//! [`EngineMode::Unrecognized`]) and strictly when they come from an operator
//! command via [`FromStr`].

use crate::error::ParameterError;
use crate::units::{snap_to_step, Kilograms, Psi};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PRESSURE_MIN: f64 = 19.0;
pub const PRESSURE_MAX: f64 = 27.0;
pub const PRESSURE_STEP: f64 = 0.5;
/// Reference tyre pressure; deviation in either direction costs pace
pub const BASELINE_PRESSURE: f64 = 23.0;

pub const FUEL_MIN: f64 = 0.0;
pub const FUEL_MAX: f64 = 110.0;
pub const FUEL_STEP: f64 = 5.0;
/// Reference fuel load; lighter than this is faster
pub const BASELINE_FUEL: f64 = 65.0;

/// Tyre compound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Compound {
    Soft,
    #[default]
    Medium,
    Hard,
}

/// Per-compound pace and tyre-life offsets applied by the adjustment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundEffect {
    pub speed: f64,
    pub wear: f64,
}

impl Compound {
    /// Parse a telemetry or config label, falling back to MEDIUM.
    ///
    /// Accepts full names and the single-letter abbreviations used on timing
    /// screens ("S", "M", "H").
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Compound::Medium)
    }

    pub fn effect(self) -> CompoundEffect {
        match self {
            Compound::Soft => CompoundEffect { speed: 5.0, wear: -2.0 },
            Compound::Medium => CompoundEffect { speed: 0.0, wear: 0.0 },
            Compound::Hard => CompoundEffect { speed: -3.0, wear: 1.0 },
        }
    }

    /// Multiplier on the base tyre wear rate
    pub fn wear_modifier(self) -> f64 {
        match self {
            Compound::Soft => 1.6,
            Compound::Medium => 1.0,
            Compound::Hard => 0.7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Compound::Soft => "SOFT",
            Compound::Medium => "MEDIUM",
            Compound::Hard => "HARD",
        }
    }
}

impl FromStr for Compound {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SOFT" | "S" => Ok(Compound::Soft),
            "MEDIUM" | "M" => Ok(Compound::Medium),
            "HARD" | "H" => Ok(Compound::Hard),
            _ => Err(ParameterError::UnknownCompound(s.to_string())),
        }
    }
}

impl From<String> for Compound {
    fn from(label: String) -> Self {
        Compound::from_label(&label)
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum EngineMode {
    Eco,
    #[default]
    Normal,
    Power,
    /// A mode label that did not match any known mode. Cools slowly.
    Unrecognized,
}

impl EngineMode {
    /// Parse a config label, falling back to [`EngineMode::Unrecognized`].
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(EngineMode::Unrecognized)
    }

    /// Engine temperature change in °C per simulated second
    pub fn heat_rate(self) -> f64 {
        match self {
            EngineMode::Eco => -0.8,
            EngineMode::Normal => 1.1,
            EngineMode::Power => 1.5,
            EngineMode::Unrecognized => -0.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EngineMode::Eco => "ECO",
            EngineMode::Normal => "NORMAL",
            EngineMode::Power => "POWER",
            EngineMode::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl FromStr for EngineMode {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ECO" => Ok(EngineMode::Eco),
            "NORMAL" => Ok(EngineMode::Normal),
            "POWER" => Ok(EngineMode::Power),
            _ => Err(ParameterError::UnknownEngineMode(s.to_string())),
        }
    }
}

impl From<String> for EngineMode {
    fn from(label: String) -> Self {
        EngineMode::from_label(&label)
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback speed multiplier offered to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PlaybackSpeed {
    #[default]
    X1,
    X2,
    X5,
    X10,
}

impl PlaybackSpeed {
    pub fn multiplier(self) -> f64 {
        u32::from(self) as f64
    }
}

impl TryFrom<u32> for PlaybackSpeed {
    type Error = ParameterError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlaybackSpeed::X1),
            2 => Ok(PlaybackSpeed::X2),
            5 => Ok(PlaybackSpeed::X5),
            10 => Ok(PlaybackSpeed::X10),
            other => Err(ParameterError::UnsupportedSpeed(other)),
        }
    }
}

impl From<PlaybackSpeed> for u32 {
    fn from(speed: PlaybackSpeed) -> Self {
        match speed {
            PlaybackSpeed::X1 => 1,
            PlaybackSpeed::X2 => 2,
            PlaybackSpeed::X5 => 5,
            PlaybackSpeed::X10 => 10,
        }
    }
}

/// The what-if inputs layered over raw telemetry.
///
/// Defaults are the baseline setup, for which the adjustment step is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParameters {
    pub compound: Compound,
    pub tire_pressure: Psi,
    pub fuel_load: Kilograms,
    pub engine_mode: EngineMode,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        Self {
            compound: Compound::Medium,
            tire_pressure: Psi(BASELINE_PRESSURE),
            fuel_load: Kilograms(BASELINE_FUEL),
            engine_mode: EngineMode::Normal,
        }
    }
}

impl StrategyParameters {
    /// Set tyre pressure, snapped to the slider step.
    pub fn set_tire_pressure(&mut self, psi: f64) -> Result<(), ParameterError> {
        check_range("tire pressure", psi, PRESSURE_MIN, PRESSURE_MAX)?;
        self.tire_pressure = Psi(snap_to_step(
            psi,
            PRESSURE_MIN,
            PRESSURE_MAX,
            PRESSURE_STEP,
            BASELINE_PRESSURE,
        ));
        Ok(())
    }

    /// Set fuel load, snapped to the slider step.
    pub fn set_fuel_load(&mut self, kg: f64) -> Result<(), ParameterError> {
        check_range("fuel load", kg, FUEL_MIN, FUEL_MAX)?;
        self.fuel_load = Kilograms(snap_to_step(kg, FUEL_MIN, FUEL_MAX, FUEL_STEP, BASELINE_FUEL));
        Ok(())
    }

    /// Force loaded values back inside the operator bounds.
    pub fn sanitized(self) -> Self {
        Self {
            tire_pressure: Psi(snap_to_step(
                self.tire_pressure.0,
                PRESSURE_MIN,
                PRESSURE_MAX,
                PRESSURE_STEP,
                BASELINE_PRESSURE,
            )),
            fuel_load: Kilograms(snap_to_step(
                self.fuel_load.0,
                FUEL_MIN,
                FUEL_MAX,
                FUEL_STEP,
                BASELINE_FUEL,
            )),
            ..self
        }
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ParameterError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange { name, value, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_from_label_falls_back_to_medium() {
        assert_eq!(Compound::from_label("soft"), Compound::Soft);
        assert_eq!(Compound::from_label("H"), Compound::Hard);
        assert_eq!(Compound::from_label("INTERMEDIATE"), Compound::Medium);
        assert_eq!(Compound::from_label(""), Compound::Medium);
    }

    #[test]
    fn test_compound_strict_parse_rejects_unknown() {
        assert!(matches!(
            "wet".parse::<Compound>(),
            Err(ParameterError::UnknownCompound(_))
        ));
    }

    #[test]
    fn test_compound_deserializes_leniently() {
        let c: Compound = serde_json::from_str("\"WET\"").unwrap();
        assert_eq!(c, Compound::Medium);
        let c: Compound = serde_json::from_str("\"SOFT\"").unwrap();
        assert_eq!(c, Compound::Soft);
        assert_eq!(serde_json::to_string(&Compound::Hard).unwrap(), "\"HARD\"");
    }

    #[test]
    fn test_engine_mode_heat_rates() {
        assert_eq!(EngineMode::Eco.heat_rate(), -0.8);
        assert_eq!(EngineMode::Normal.heat_rate(), 1.1);
        assert_eq!(EngineMode::Power.heat_rate(), 1.5);
        assert_eq!(EngineMode::from_label("QUALI").heat_rate(), -0.2);
    }

    #[test]
    fn test_playback_speed_only_accepts_offered_values() {
        assert_eq!(PlaybackSpeed::try_from(5).unwrap(), PlaybackSpeed::X5);
        assert_eq!(PlaybackSpeed::X10.multiplier(), 10.0);
        assert_eq!(
            PlaybackSpeed::try_from(3),
            Err(ParameterError::UnsupportedSpeed(3))
        );
        assert!(serde_json::from_str::<PlaybackSpeed>("4").is_err());
    }

    #[test]
    fn test_set_tire_pressure_snaps_and_rejects_out_of_range() {
        let mut params = StrategyParameters::default();
        params.set_tire_pressure(24.3).unwrap();
        assert_eq!(params.tire_pressure, Psi(24.5));
        assert!(params.set_tire_pressure(30.0).is_err());
        assert!(params.set_tire_pressure(f64::NAN).is_err());
        assert_eq!(params.tire_pressure, Psi(24.5));
    }

    #[test]
    fn test_set_fuel_load_snaps_to_five_kg() {
        let mut params = StrategyParameters::default();
        params.set_fuel_load(42.0).unwrap();
        assert_eq!(params.fuel_load, Kilograms(40.0));
        assert!(params.set_fuel_load(-5.0).is_err());
    }

    #[test]
    fn test_sanitized_clamps_config_values() {
        let params = StrategyParameters {
            tire_pressure: Psi(35.0),
            fuel_load: Kilograms(-10.0),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.tire_pressure, Psi(27.0));
        assert_eq!(params.fuel_load, Kilograms(0.0));
    }

    #[test]
    fn test_parameters_deserialize_with_defaults() {
        let params: StrategyParameters =
            serde_json::from_str(r#"{"compound":"SOFT","engine_mode":"TURBO"}"#).unwrap();
        assert_eq!(params.compound, Compound::Soft);
        assert_eq!(params.engine_mode, EngineMode::Unrecognized);
        assert_eq!(params.tire_pressure, Psi(BASELINE_PRESSURE));
    }
}
