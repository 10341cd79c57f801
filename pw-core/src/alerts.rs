//! Threshold alerts over the degradation state
//!
//! Each track (tyre, engine) yields at most one alert; critical wins over
//! warning. The list is rebuilt from scratch on every evaluation.

use crate::degradation::DegradationState;
use serde::{Deserialize, Serialize};

pub const TIRE_CRITICAL: f64 = 20.0;
pub const TIRE_WARNING: f64 = 40.0;
pub const ENGINE_CRITICAL: f64 = 115.0;
pub const ENGINE_WARNING: f64 = 105.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// Which degradation track raised an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTrack {
    TireWear,
    EngineHeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Stable identifier, e.g. `tire_wear_critical`
    pub id: String,
    pub track: AlertTrack,
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Alert {
    fn new(track: AlertTrack, severity: Severity, title: &str, description: String) -> Self {
        let track_id = match track {
            AlertTrack::TireWear => "tire_wear",
            AlertTrack::EngineHeat => "engine_heat",
        };
        let severity_id = match severity {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        Self {
            id: format!("{}_{}", track_id, severity_id),
            track,
            severity,
            title: title.to_string(),
            description,
        }
    }
}

/// Evaluate `state` against the fixed thresholds.
///
/// The tyre alert, if any, precedes the engine alert.
pub fn evaluate(state: &DegradationState) -> Vec<Alert> {
    tire_alert(state.tire_wear.0)
        .into_iter()
        .chain(engine_alert(state.engine_heat.0))
        .collect()
}

fn tire_alert(wear: f64) -> Option<Alert> {
    if wear <= TIRE_CRITICAL {
        Some(Alert::new(
            AlertTrack::TireWear,
            Severity::Critical,
            "Critical tyre wear",
            format!("Tyre life at {:.1}%. Box this lap.", wear),
        ))
    } else if wear <= TIRE_WARNING {
        Some(Alert::new(
            AlertTrack::TireWear,
            Severity::Warning,
            "High tyre wear",
            format!("Tyre life at {:.1}%. Plan the pit window.", wear),
        ))
    } else {
        None
    }
}

fn engine_alert(heat: f64) -> Option<Alert> {
    if heat >= ENGINE_CRITICAL {
        Some(Alert::new(
            AlertTrack::EngineHeat,
            Severity::Critical,
            "Engine overheating",
            format!("Engine at {:.1}°C. Switch to ECO mode now.", heat),
        ))
    } else if heat >= ENGINE_WARNING {
        Some(Alert::new(
            AlertTrack::EngineHeat,
            Severity::Warning,
            "Engine running hot",
            format!("Engine at {:.1}°C. Consider a cooler engine mode.", heat),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_alerts_in_healthy_state() {
        assert!(evaluate(&DegradationState::new(40.1, 104.9)).is_empty());
        assert!(evaluate(&DegradationState::fresh()).is_empty());
    }

    #[test]
    fn test_critical_tire_wins_over_warning() {
        let alerts = evaluate(&DegradationState::new(15.0, 90.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "tire_wear_critical");
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].track, AlertTrack::TireWear);
    }

    #[test]
    fn test_tire_thresholds_are_inclusive() {
        let alerts = evaluate(&DegradationState::new(40.0, 70.0));
        assert_eq!(alerts[0].severity, Severity::Warning);
        let alerts = evaluate(&DegradationState::new(20.0, 70.0));
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn test_engine_thresholds_are_inclusive() {
        let alerts = evaluate(&DegradationState::new(100.0, 105.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "engine_heat_warning");
        let alerts = evaluate(&DegradationState::new(100.0, 115.0));
        assert_eq!(alerts[0].id, "engine_heat_critical");
    }

    #[test]
    fn test_tire_alert_precedes_engine_alert() {
        let alerts = evaluate(&DegradationState::new(30.0, 120.0));
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["tire_wear_warning", "engine_heat_critical"]);
    }

    #[test]
    fn test_alert_serialization() {
        let alerts = evaluate(&DegradationState::new(10.0, 70.0));
        let value = serde_json::to_value(&alerts[0]).unwrap();
        assert_eq!(value["severity"], "critical");
        assert_eq!(value["track"], "tire_wear");
        assert!(value["description"].as_str().unwrap().contains("10.0%"));
    }
}
