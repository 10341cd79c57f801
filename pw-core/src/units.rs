//! Type-safe wrappers for the physical units used by strategy parameters
//! and the degradation model
//!
//! All unit types serialize with 4 decimal places to reduce JSON payload size.

use serde::{Deserialize, Serialize};

/// Round f64 to 4 decimal places for compact JSON serialization
fn round4<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((*val * 10000.0).round() / 10000.0)
}

/// Tyre pressure in PSI
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Psi(#[serde(serialize_with = "round4")] pub f64);

/// Kilograms (fuel mass)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Kilograms(#[serde(serialize_with = "round4")] pub f64);

/// Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Celsius(#[serde(serialize_with = "round4")] pub f64);

/// Percentage (0.0 to 100.0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Percentage(#[serde(serialize_with = "round4")] pub f64);

/// Snap `value` to the nearest multiple of `step` inside `[min, max]`.
///
/// Non-finite input lands on `fallback`.
pub fn snap_to_step(value: f64, min: f64, max: f64, step: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    let clamped = value.clamp(min, max);
    let steps = ((clamped - min) / step).round();
    (min + steps * step).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round4_serialization() {
        let json = serde_json::to_string(&Celsius(104.123456)).unwrap();
        assert_eq!(json, "104.1235");
    }

    #[test]
    fn test_snap_to_step() {
        assert_eq!(snap_to_step(23.2, 19.0, 27.0, 0.5, 23.0), 23.0);
        assert_eq!(snap_to_step(23.3, 19.0, 27.0, 0.5, 23.0), 23.5);
        assert_eq!(snap_to_step(40.0, 19.0, 27.0, 0.5, 23.0), 27.0);
        assert_eq!(snap_to_step(f64::NAN, 0.0, 110.0, 5.0, 65.0), 65.0);
        assert_eq!(snap_to_step(62.4, 0.0, 110.0, 5.0, 65.0), 60.0);
    }
}
