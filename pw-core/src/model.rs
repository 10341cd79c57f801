//! Race telemetry data model
//!
//! Defines the snapshot structures exchanged with telemetry sources and
//! handed to the rendering layer.
//!
//! Input field names accept both the recorded time-series column names
//! (`SessionTime`, `TyreLife`, `nGear`, ...) and snake_case. Any field that is
//! missing, null, or not a number deserializes to zero/false/empty rather
//! than failing the whole snapshot.
//!
//! Coordinate system: raw track coordinates as reported by the timing feed,
//! arbitrary units. See [`crate::normalize`] for render space.

use crate::strategy::Compound;
use serde::{Deserialize, Serialize};

/// One driver's instantaneous measured state at a given session time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTelemetrySnapshot {
    /// Elapsed session time in seconds
    #[serde(alias = "SessionTime", deserialize_with = "lenient::f64")]
    pub session_time: f64,

    /// Three-letter driver code (e.g. "NOR")
    #[serde(alias = "Driver", deserialize_with = "lenient::string")]
    pub driver: String,

    #[serde(alias = "Team", deserialize_with = "lenient::string")]
    pub team: String,

    #[serde(alias = "LapNumber", deserialize_with = "lenient::u32")]
    pub lap_number: u32,

    /// Race position (1 = leader, 0 = unknown)
    #[serde(alias = "Position", deserialize_with = "lenient::u32")]
    pub position: u32,

    #[serde(alias = "Stint", deserialize_with = "lenient::u32")]
    pub stint: u32,

    /// Compound label as reported, not yet interpreted
    #[serde(alias = "Compound", deserialize_with = "lenient::string")]
    pub compound: String,

    /// Tyre age in laps
    #[serde(alias = "TyreLife", deserialize_with = "lenient::f64")]
    pub tire_life: f64,

    /// Speed in km/h
    #[serde(alias = "Speed", deserialize_with = "lenient::f64")]
    pub speed: f64,

    #[serde(alias = "RPM", deserialize_with = "lenient::f64")]
    pub rpm: f64,

    /// Current gear (0 = neutral)
    #[serde(alias = "nGear", deserialize_with = "lenient::i32")]
    pub gear: i32,

    /// Throttle input (0 - 100)
    #[serde(alias = "Throttle", deserialize_with = "lenient::f64")]
    pub throttle: f64,

    #[serde(alias = "Brake", deserialize_with = "lenient::bool")]
    pub brake: bool,

    #[serde(alias = "DRS", deserialize_with = "lenient::bool")]
    pub drs: bool,

    #[serde(alias = "X", deserialize_with = "lenient::f64")]
    pub x: f64,

    #[serde(alias = "Y", deserialize_with = "lenient::f64")]
    pub y: f64,

    #[serde(alias = "Z", deserialize_with = "lenient::f64")]
    pub z: f64,

    /// Gap to the car ahead in seconds
    #[serde(alias = "GapAhead", deserialize_with = "lenient::f64")]
    pub gap_ahead: f64,

    /// Safety car / VSC / red flag active
    #[serde(alias = "IsRaceNeutralized", deserialize_with = "lenient::bool")]
    pub race_neutralized: bool,
}

/// Snapshot of every driver at (approximately) one session time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    /// Session time the snapshot was requested for
    pub time: f64,
    pub drivers: Vec<RawTelemetrySnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
}

/// Track-side conditions reported alongside a race snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weather {
    /// Track surface temperature in °C
    #[serde(alias = "TrackTemp", alias = "trackTemp", deserialize_with = "lenient::f64")]
    pub track_temp: f64,

    #[serde(alias = "AirTemp", alias = "airTemp", deserialize_with = "lenient::f64")]
    pub air_temp: f64,

    /// Wind speed in km/h
    #[serde(alias = "WindSpeed", alias = "windSpeed", deserialize_with = "lenient::f64")]
    pub wind_speed: f64,

    /// Compass label, e.g. "NE"
    #[serde(alias = "WindDirection", alias = "windDirection", deserialize_with = "lenient::string")]
    pub wind_direction: String,

    #[serde(alias = "Rainfall", deserialize_with = "lenient::bool")]
    pub rainfall: bool,

    /// Relative humidity (0 - 100)
    #[serde(alias = "Humidity", deserialize_with = "lenient::f64")]
    pub humidity: f64,

    /// One-word summary such as "Sunny"
    #[serde(alias = "weather", alias = "Summary", deserialize_with = "lenient::string")]
    pub summary: String,
}

impl RaceState {
    pub fn driver(&self, code: &str) -> Option<&RawTelemetrySnapshot> {
        self.drivers.iter().find(|d| d.driver.eq_ignore_ascii_case(code))
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

/// Strategy-adjusted estimate of one driver's telemetry.
///
/// Always recomputed from a raw snapshot and the current parameters; never
/// carries state of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustedTelemetrySnapshot {
    pub driver: String,
    pub speed: f64,
    pub rpm: f64,
    pub gear: i32,
    pub throttle: f64,
    pub brake: bool,
    pub drs: bool,
    /// Compound the estimate was computed for
    pub compound: Compound,
    pub tire_life: f64,
    pub x: f64,
    pub y: f64,
}

/// A point in raw track coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackPoint {
    #[serde(alias = "X", deserialize_with = "lenient::f64")]
    pub x: f64,
    #[serde(alias = "Y", deserialize_with = "lenient::f64")]
    pub y: f64,
}

impl TrackPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Static metadata for one driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub driver: String,
    pub team: String,
    pub total_laps: u32,
}

// === Scenario prediction exchange ===

/// Request sent to the external scenario prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub current_lap: u32,
    pub modifications: ScenarioModifications,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioModifications {
    pub next_compound: Compound,
    pub pit_lap: u32,
}

/// Narrative answer from the scenario prediction service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioPrediction {
    pub predicted_position_change: i32,
    pub predicted_time_gain: f64,
    pub notes: String,
}

/// The service wraps its prediction in a `scenario` envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResponse {
    pub scenario: ScenarioPrediction,
}

/// Deserializers that turn missing or malformed values into defaults
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_f64(value: &Value) -> f64 {
        let v = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse().unwrap_or(0.0),
            Value::Bool(b) => f64::from(u8::from(*b)),
            _ => 0.0,
        };
        if v.is_finite() {
            v
        } else {
            0.0
        }
    }

    pub fn f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(as_f64(&Value::deserialize(d)?))
    }

    pub fn u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let v = as_f64(&Value::deserialize(d)?);
        Ok(if v > 0.0 { v.min(u32::MAX as f64) as u32 } else { 0 })
    }

    pub fn i32<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
        let v = as_f64(&Value::deserialize(d)?);
        Ok(v.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
    }

    pub fn bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
            other => as_f64(&other) != 0.0,
        })
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_accepts_timeseries_column_names() {
        let json = r#"{
            "SessionTime": 3847.5, "Driver": "NOR", "Team": "McLaren",
            "LapNumber": 42, "Position": 3, "Stint": 2, "Compound": "MEDIUM",
            "TyreLife": 18, "Speed": 287.0, "RPM": 11200, "nGear": 7,
            "Throttle": 87, "Brake": false, "DRS": 12, "X": -1520.3, "Y": 2210.0,
            "Z": 12.0, "IsRaceNeutralized": false
        }"#;
        let snap: RawTelemetrySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.session_time, 3847.5);
        assert_eq!(snap.driver, "NOR");
        assert_eq!(snap.lap_number, 42);
        assert_eq!(snap.gear, 7);
        assert_eq!(snap.tire_life, 18.0);
        assert!(snap.drs);
        assert!(!snap.brake);
        assert_eq!(snap.x, -1520.3);
    }

    #[test]
    fn test_snapshot_defaults_missing_and_malformed_fields() {
        let json = r#"{"Driver": "VER", "Speed": null, "RPM": "n/a", "nGear": "6", "Brake": "True"}"#;
        let snap: RawTelemetrySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.driver, "VER");
        assert_eq!(snap.speed, 0.0);
        assert_eq!(snap.rpm, 0.0);
        assert_eq!(snap.gear, 6);
        assert!(snap.brake);
        assert_eq!(snap.throttle, 0.0);
        assert_eq!(snap.compound, "");
    }

    #[test]
    fn test_snapshot_empty_object() {
        let snap: RawTelemetrySnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snap, RawTelemetrySnapshot::default());
    }

    #[test]
    fn test_race_state_driver_lookup_is_case_insensitive() {
        let state = RaceState {
            time: 10.0,
            drivers: vec![
                RawTelemetrySnapshot { driver: "HAM".into(), ..Default::default() },
                RawTelemetrySnapshot { driver: "NOR".into(), ..Default::default() },
            ],
            weather: None,
        };
        assert_eq!(state.driver("nor").map(|d| d.driver.as_str()), Some("NOR"));
        assert!(state.driver("LEC").is_none());
    }

    #[test]
    fn test_race_state_weather_is_optional_and_lenient() {
        let bare: RaceState = serde_json::from_str(r#"{"time": 5.0, "drivers": []}"#).unwrap();
        assert!(bare.weather.is_none());

        let json = r#"{"time": 5.0, "drivers": [], "weather": {
            "trackTemp": "41.5", "airTemp": 27, "windSpeed": null,
            "windDirection": "SW", "Rainfall": "False", "humidity": 52, "weather": "Sunny"
        }}"#;
        let state: RaceState = serde_json::from_str(json).unwrap();
        let weather = state.weather.unwrap();
        assert_eq!(weather.track_temp, 41.5);
        assert_eq!(weather.air_temp, 27.0);
        assert_eq!(weather.wind_speed, 0.0);
        assert_eq!(weather.wind_direction, "SW");
        assert!(!weather.rainfall);
        assert_eq!(weather.humidity, 52.0);
        assert_eq!(weather.summary, "Sunny");
    }

    #[test]
    fn test_scenario_response_shape() {
        let json = r#"{"scenario": {"predicted_position_change": -1,
            "predicted_time_gain": -15.2, "notes": "Pitting on lap 28 for SOFTs"}}"#;
        let resp: ScenarioResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.scenario.predicted_position_change, -1);
        assert!(resp.scenario.notes.contains("SOFT"));

        let req = ScenarioRequest {
            current_lap: 25,
            modifications: ScenarioModifications {
                next_compound: Compound::Soft,
                pit_lap: 28,
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["modifications"]["next_compound"], "SOFT");
        assert_eq!(value["modifications"]["pit_lap"], 28);
    }
}
