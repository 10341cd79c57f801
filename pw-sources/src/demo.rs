//! Demo source that generates a synthetic race for testing
//!
//! Simulates a field of cars lapping a circuit with straights, braking
//! zones, corners, and acceleration phases. Every value is a pure function
//! of session time, so the same request always yields the same snapshot.

use anyhow::Result;
use pw_core::model::{DriverInfo, RaceState, RawTelemetrySnapshot, TrackPoint, Weather};
use pw_core::source::TelemetrySource;
use std::f64::consts::TAU;

// =============================================================================
// Track definition: a sequence of segments that form a lap
// =============================================================================

#[derive(Clone, Copy)]
enum SegmentKind {
    Straight,   // Full throttle, top speed
    Braking,    // Heavy braking into a corner
    Corner,     // Constant-ish speed cornering
    Accel,      // Accelerating out of a corner
}

#[derive(Clone, Copy)]
struct TrackSegment {
    kind: SegmentKind,
    duration: f64,       // seconds to traverse at representative pace
    target_speed: f64,   // km/h at end of segment
}

/// A simple circuit: ~85s lap, mix of corners and straights
fn demo_track() -> Vec<TrackSegment> {
    use SegmentKind::*;
    vec![
        // Start/finish straight
        TrackSegment { kind: Straight, duration: 8.0,  target_speed: 310.0 },
        // T1: heavy braking into slow right-hander
        TrackSegment { kind: Braking,  duration: 3.0,  target_speed: 110.0 },
        TrackSegment { kind: Corner,   duration: 4.0,  target_speed: 95.0 },
        TrackSegment { kind: Accel,    duration: 3.5,  target_speed: 215.0 },
        // Short straight
        TrackSegment { kind: Straight, duration: 4.0,  target_speed: 250.0 },
        // T2: medium braking into fast left-hander
        TrackSegment { kind: Braking,  duration: 2.0,  target_speed: 180.0 },
        TrackSegment { kind: Corner,   duration: 3.5,  target_speed: 165.0 },
        TrackSegment { kind: Accel,    duration: 3.0,  target_speed: 230.0 },
        // Back straight
        TrackSegment { kind: Straight, duration: 10.0, target_speed: 320.0 },
        // T3: chicane, quick right-left
        TrackSegment { kind: Braking,  duration: 2.5,  target_speed: 135.0 },
        TrackSegment { kind: Corner,   duration: 2.0,  target_speed: 125.0 },
        TrackSegment { kind: Corner,   duration: 2.0,  target_speed: 118.0 },
        TrackSegment { kind: Accel,    duration: 3.0,  target_speed: 200.0 },
        // Medium straight
        TrackSegment { kind: Straight, duration: 6.0,  target_speed: 270.0 },
        // T4: long sweeping right
        TrackSegment { kind: Braking,  duration: 1.5,  target_speed: 205.0 },
        TrackSegment { kind: Corner,   duration: 5.0,  target_speed: 195.0 },
        TrackSegment { kind: Accel,    duration: 3.0,  target_speed: 235.0 },
        // T5: tight hairpin left
        TrackSegment { kind: Braking,  duration: 3.5,  target_speed: 85.0 },
        TrackSegment { kind: Corner,   duration: 4.5,  target_speed: 75.0 },
        TrackSegment { kind: Accel,    duration: 4.0,  target_speed: 215.0 },
        // Run to start/finish
        TrackSegment { kind: Straight, duration: 6.0,  target_speed: 290.0 },
    ]
}

/// Driver code, team, pace offset per lap (s), starting gap to leader (s)
const FIELD: [(&str, &str, f64, f64); 8] = [
    ("VER", "Red Bull Racing", 0.00, 0.0),
    ("NOR", "McLaren", 0.12, 1.6),
    ("HAM", "Mercedes", 0.25, 3.1),
    ("LEC", "Ferrari", 0.30, 4.0),
    ("PIA", "McLaren", 0.35, 5.8),
    ("RUS", "Mercedes", 0.42, 7.2),
    ("SAI", "Ferrari", 0.50, 8.9),
    ("ALO", "Aston Martin", 0.61, 10.5),
];

const RACE_LAPS: u32 = 58;
const STINT_LAPS: u32 = 22;
const TRACK_RADIUS_X: f64 = 8000.0;
const TRACK_RADIUS_Y: f64 = 4500.0;
const OUTLINE_SAMPLES: usize = 240;
const DRS_GAP: f64 = 1.0;

// =============================================================================
// Interpolation state derived from track position
// =============================================================================

struct LapState {
    speed: f64,
    throttle: f64,
    brake: bool,
    gear: i32,
    rpm: f64,
    on_straight: bool,
}

fn compute_lap_state(track: &[TrackSegment], lap_time: f64) -> LapState {
    let lap_duration: f64 = track.iter().map(|s| s.duration).sum();
    let t = lap_time.rem_euclid(lap_duration);

    // Find current segment
    let mut elapsed = 0.0_f64;
    let mut seg_idx = track.len() - 1;
    for (i, seg) in track.iter().enumerate() {
        if elapsed + seg.duration > t {
            seg_idx = i;
            break;
        }
        elapsed += seg.duration;
    }
    if seg_idx == track.len() - 1 {
        elapsed = lap_duration - track[seg_idx].duration;
    }

    let seg = track[seg_idx];
    let seg_t = ((t - elapsed) / seg.duration).clamp(0.0, 1.0);

    // Previous segment's target speed (for interpolation start)
    let prev_target_speed = if seg_idx > 0 {
        track[seg_idx - 1].target_speed
    } else {
        track[track.len() - 1].target_speed
    };

    let smooth_t = smoothstep(seg_t);
    let speed = lerp(prev_target_speed, seg.target_speed, smooth_t);

    let (throttle, brake) = match seg.kind {
        SegmentKind::Straight => (95.0 + 5.0 * (1.0 - seg_t), false),
        SegmentKind::Braking => (0.0, true),
        SegmentKind::Corner => (20.0 + 30.0 * seg_t, false),
        SegmentKind::Accel => (50.0 + 50.0 * smooth_t, false),
    };

    let gear = speed_to_gear(speed);

    LapState {
        speed,
        throttle,
        brake,
        gear,
        rpm: speed_to_rpm(speed, gear),
        on_straight: matches!(seg.kind, SegmentKind::Straight),
    }
}

fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn speed_to_gear(kph: f64) -> i32 {
    match kph {
        x if x < 90.0 => 2,
        x if x < 130.0 => 3,
        x if x < 170.0 => 4,
        x if x < 210.0 => 5,
        x if x < 250.0 => 6,
        x if x < 290.0 => 7,
        _ => 8,
    }
}

fn speed_to_rpm(kph: f64, gear: i32) -> f64 {
    // Each gear spans roughly 40 km/h of the rev range
    let gear_floor = match gear {
        2 => 50.0,
        3 => 90.0,
        4 => 130.0,
        5 => 170.0,
        6 => 210.0,
        7 => 250.0,
        _ => 290.0,
    };
    let frac = ((kph - gear_floor) / 40.0).clamp(0.0, 1.2);
    (9500.0 + frac * 2500.0).clamp(4000.0, 12_500.0)
}

/// Simple deterministic noise from a seed
fn noise(seed: f64) -> f64 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

/// Small jitter centered around 0
fn jitter(seed: f64, amplitude: f64) -> f64 {
    (noise(seed) - 0.5) * 2.0 * amplitude
}

/// Raw map position for a fraction of the lap
fn circuit_point(lap_fraction: f64) -> TrackPoint {
    let theta = lap_fraction * TAU;
    TrackPoint::new(
        TRACK_RADIUS_X * theta.cos() + 1200.0 * (3.0 * theta).cos(),
        TRACK_RADIUS_Y * theta.sin() + 600.0 * (2.0 * theta).sin(),
    )
}

/// Dry afternoon race: the track warms slowly while the breeze wanders
fn conditions(session_time: f64) -> Weather {
    let round1 = |v: f64| (v * 10.0).round() / 10.0;
    Weather {
        track_temp: round1(42.0 + 3.0 * (session_time / 1800.0).sin()),
        air_temp: round1(28.0 + (session_time / 2400.0).sin()),
        wind_speed: round1(12.0 + jitter(session_time.floor() * 0.01, 2.0)),
        wind_direction: "NE".to_string(),
        rainfall: false,
        humidity: round1(45.0 - 2.0 * (session_time / 3600.0).sin()),
        summary: "Sunny".to_string(),
    }
}

// =============================================================================
// DemoSource
// =============================================================================

pub struct DemoSource {
    track: Vec<TrackSegment>,
    lap_duration: f64,
}

impl DemoSource {
    pub fn new() -> Self {
        let track = demo_track();
        let lap_duration: f64 = track.iter().map(|s| s.duration).sum();
        Self {
            track,
            lap_duration,
        }
    }

    pub fn lap_duration(&self) -> f64 {
        self.lap_duration
    }

    pub fn drivers(&self) -> impl Iterator<Item = &'static str> {
        FIELD.iter().map(|(code, ..)| *code)
    }

    /// Laps each car has covered, including the fractional current lap
    fn progress(&self, index: usize, session_time: f64) -> f64 {
        let (_, _, pace_offset, start_gap) = FIELD[index];
        let lap_time = self.lap_duration + pace_offset;
        ((session_time - start_gap) / lap_time).max(0.0)
    }

    fn generate_state(&self, session_time: f64) -> RaceState {
        let progress: Vec<f64> = (0..FIELD.len()).map(|i| self.progress(i, session_time)).collect();

        // Race order by distance covered
        let mut order: Vec<usize> = (0..FIELD.len()).collect();
        order.sort_by(|a, b| progress[*b].total_cmp(&progress[*a]));

        let drivers = order
            .iter()
            .enumerate()
            .map(|(rank, &i)| {
                let (code, team, pace_offset, _) = FIELD[i];
                let laps_done = progress[i];
                let lap_fraction = laps_done.fract();
                let lap_number = (laps_done.floor() as u32 + 1).min(RACE_LAPS);
                let n = session_time * 7.0 + i as f64; // noise seed

                let gap_ahead = if rank == 0 {
                    0.0
                } else {
                    let ahead = progress[order[rank - 1]];
                    (ahead - laps_done) * (self.lap_duration + pace_offset)
                };

                let state = compute_lap_state(&self.track, lap_fraction * self.lap_duration);
                let speed = (state.speed + jitter(n, 1.5)).max(0.0);
                let pos = circuit_point(lap_fraction);
                let stint = (lap_number - 1) / STINT_LAPS + 1;

                RawTelemetrySnapshot {
                    session_time,
                    driver: code.to_string(),
                    team: team.to_string(),
                    lap_number,
                    position: rank as u32 + 1,
                    stint,
                    compound: if stint % 2 == 1 { "MEDIUM" } else { "HARD" }.to_string(),
                    tire_life: f64::from((lap_number - 1) % STINT_LAPS + 1),
                    speed,
                    rpm: (state.rpm + jitter(n * 1.1, 40.0)).clamp(4000.0, 12_500.0),
                    gear: state.gear,
                    throttle: (state.throttle + jitter(n * 1.2, 2.0)).clamp(0.0, 100.0),
                    brake: state.brake,
                    drs: state.on_straight && rank > 0 && gap_ahead < DRS_GAP,
                    x: pos.x + jitter(n * 1.3, 15.0),
                    y: pos.y + jitter(n * 1.4, 15.0),
                    z: 0.0,
                    gap_ahead,
                    race_neutralized: false,
                }
            })
            .collect();

        RaceState {
            time: session_time,
            drivers,
            weather: Some(conditions(session_time)),
        }
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for DemoSource {
    fn name(&self) -> &str {
        "Demo"
    }

    fn race_state_at(&self, session_time: f64) -> Result<Option<RaceState>> {
        match self.session_bounds() {
            Some((start, end)) if session_time.is_finite() && (start..=end).contains(&session_time) => {
                Ok(Some(self.generate_state(session_time)))
            }
            _ => Ok(None),
        }
    }

    fn track_outline(&self, driver: &str) -> Result<Option<Vec<TrackPoint>>> {
        if self.driver_info(driver).is_none() {
            return Ok(None);
        }
        let outline = (0..OUTLINE_SAMPLES)
            .map(|i| circuit_point(i as f64 / OUTLINE_SAMPLES as f64))
            .collect();
        Ok(Some(outline))
    }

    fn driver_info(&self, driver: &str) -> Option<DriverInfo> {
        FIELD
            .iter()
            .find(|(code, ..)| code.eq_ignore_ascii_case(driver))
            .map(|(code, team, ..)| DriverInfo {
                driver: code.to_string(),
                team: team.to_string(),
                total_laps: RACE_LAPS,
            })
    }

    fn session_bounds(&self) -> Option<(f64, f64)> {
        Some((0.0, f64::from(RACE_LAPS) * self.lap_duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lap_duration_matches_segments() {
        let source = DemoSource::new();
        assert!((source.lap_duration() - 84.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_lap_state_braking_zone() {
        let track = demo_track();
        // 9.5s into the lap is the T1 braking zone
        let state = compute_lap_state(&track, 9.5);
        assert!(state.brake);
        assert_eq!(state.throttle, 0.0);
        assert!(state.speed < 310.0 && state.speed > 110.0);
    }

    #[test]
    fn test_speed_to_gear_is_monotonic() {
        let gears: Vec<i32> = [60.0, 100.0, 150.0, 200.0, 240.0, 280.0, 320.0]
            .iter()
            .map(|s| speed_to_gear(*s))
            .collect();
        assert!(gears.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_circuit_point_is_closed() {
        let start = circuit_point(0.0);
        let end = circuit_point(1.0);
        assert!((start.x - end.x).abs() < 1e-6);
        assert!((start.y - end.y).abs() < 1e-6);
    }
}
