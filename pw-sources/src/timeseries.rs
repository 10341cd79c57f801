//! Source backed by a recorded race time-series
//!
//! The recording is a JSON array, newline-delimited JSON, or a CSV export of
//! per-driver samples using the timing feed's column names: `SessionTime`,
//! `Driver`, `LapNumber`, `X`, `Y` and so on. Columns the model does not know
//! (such as `Date`) are ignored. Samples are grouped by driver and sorted by
//! session time once at load; lookups are binary searches.

use anyhow::{Context, Result};
use pw_core::model::{DriverInfo, RaceState, RawTelemetrySnapshot, TrackPoint};
use pw_core::source::TelemetrySource;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub struct TimeseriesSource {
    /// Samples per driver code, sorted by session time
    traces: BTreeMap<String, Vec<RawTelemetrySnapshot>>,
    bounds: Option<(f64, f64)>,
}

impl TimeseriesSource {
    /// Load a recording from disk.
    ///
    /// A `.csv` extension selects CSV; otherwise content starting with `[` or
    /// `{` is read as JSON and anything else as CSV.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read time-series {}", path.display()))?;

        let is_csv = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.eq_ignore_ascii_case("csv"),
            None => false,
        };
        let looks_like_json = matches!(contents.trim_start().chars().next(), None | Some('[') | Some('{'));

        let parsed = if is_csv || !looks_like_json {
            debug!("Reading {} as CSV", path.display());
            Self::from_csv(contents.as_bytes())
        } else {
            Self::from_json(&contents)
        };
        let source = parsed.with_context(|| format!("Failed to parse time-series {}", path.display()))?;

        info!(
            "Loaded time-series {} ({} drivers, session {:?})",
            path.display(),
            source.traces.len(),
            source.bounds
        );
        Ok(source)
    }

    /// Parse either a JSON array of samples or one sample per line
    pub fn from_json(contents: &str) -> Result<Self> {
        let trimmed = contents.trim_start();
        let records: Vec<RawTelemetrySnapshot> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed)?
        } else {
            trimmed
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| {
                    serde_json::from_str(line).with_context(|| format!("Invalid sample on line {}", i + 1))
                })
                .collect::<Result<_>>()?
        };
        Ok(Self::from_records(records))
    }

    /// Parse a CSV export with a header row of column names
    pub fn from_csv(reader: impl Read) -> Result<Self> {
        let mut rows = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let records = rows
            .deserialize::<RawTelemetrySnapshot>()
            .enumerate()
            // Row 1 is the header
            .map(|(i, row)| row.with_context(|| format!("Invalid sample on row {}", i + 2)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<RawTelemetrySnapshot>) -> Self {
        let mut traces: BTreeMap<String, Vec<RawTelemetrySnapshot>> = BTreeMap::new();
        let mut skipped = 0usize;
        for record in records {
            if record.driver.trim().is_empty() {
                skipped += 1;
                continue;
            }
            traces
                .entry(record.driver.trim().to_ascii_uppercase())
                .or_default()
                .push(record);
        }
        if skipped > 0 {
            warn!("Skipped {} samples without a driver code", skipped);
        }

        for trace in traces.values_mut() {
            trace.sort_by(|a, b| a.session_time.total_cmp(&b.session_time));
        }

        let bounds = traces
            .values()
            .filter_map(|t| Some((t.first()?.session_time, t.last()?.session_time)))
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)));

        Self { traces, bounds }
    }

    pub fn driver_count(&self) -> usize {
        self.traces.len()
    }

    fn trace(&self, driver: &str) -> Option<&Vec<RawTelemetrySnapshot>> {
        self.traces.get(&driver.trim().to_ascii_uppercase())
    }
}

/// Sample in `trace` whose session time is closest to `time`
fn nearest(trace: &[RawTelemetrySnapshot], time: f64) -> Option<&RawTelemetrySnapshot> {
    let idx = trace.partition_point(|s| s.session_time < time);
    let after = trace.get(idx);
    let before = idx.checked_sub(1).and_then(|i| trace.get(i));
    match (before, after) {
        (Some(b), Some(a)) => {
            if time - b.session_time <= a.session_time - time {
                Some(b)
            } else {
                Some(a)
            }
        }
        (b, a) => b.or(a),
    }
}

fn valid_coordinate(v: f64) -> bool {
    v.is_finite() && v != 0.0
}

impl TelemetrySource for TimeseriesSource {
    fn name(&self) -> &str {
        "Timeseries"
    }

    fn race_state_at(&self, session_time: f64) -> Result<Option<RaceState>> {
        let Some((start, end)) = self.bounds else {
            return Ok(None);
        };
        if !session_time.is_finite() || session_time < start || session_time > end {
            debug!("Session time {} outside recording {:?}", session_time, self.bounds);
            return Ok(None);
        }

        let mut drivers: Vec<RawTelemetrySnapshot> = self
            .traces
            .values()
            .filter_map(|trace| nearest(trace, session_time).cloned())
            .collect();
        // Unknown positions (0) sort last
        drivers.sort_by_key(|d| if d.position == 0 { u32::MAX } else { d.position });

        Ok(Some(RaceState {
            time: session_time,
            drivers,
            weather: None,
        }))
    }

    fn track_outline(&self, driver: &str) -> Result<Option<Vec<TrackPoint>>> {
        let Some(trace) = self.trace(driver) else {
            return Ok(None);
        };

        let points = |lap: Option<u32>| -> Vec<TrackPoint> {
            trace
                .iter()
                .filter(|s| lap.map_or(true, |l| s.lap_number == l))
                .filter(|s| valid_coordinate(s.x) && valid_coordinate(s.y))
                .map(|s| TrackPoint::new(s.x, s.y))
                .collect()
        };

        // First lap the driver went on to finish
        let last_lap = trace.iter().map(|s| s.lap_number).max().unwrap_or(0);
        let complete_lap = trace
            .iter()
            .map(|s| s.lap_number)
            .filter(|lap| *lap > 0 && *lap < last_lap)
            .min();

        let mut outline = points(complete_lap);
        if outline.is_empty() {
            outline = points(None);
        }
        Ok((!outline.is_empty()).then_some(outline))
    }

    fn driver_info(&self, driver: &str) -> Option<DriverInfo> {
        let trace = self.trace(driver)?;
        let first = trace.first()?;
        Some(DriverInfo {
            driver: first.driver.clone(),
            team: first.team.clone(),
            total_laps: trace.iter().map(|s| s.lap_number).max().unwrap_or(0),
        })
    }

    fn session_bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(driver: &str, time: f64, lap: u32) -> RawTelemetrySnapshot {
        RawTelemetrySnapshot {
            session_time: time,
            driver: driver.to_string(),
            lap_number: lap,
            x: time * 10.0 + 1.0,
            y: time * 5.0 + 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_nearest_picks_closest_sample() {
        let trace = vec![sample("NOR", 10.0, 1), sample("NOR", 12.0, 1), sample("NOR", 20.0, 2)];
        assert_eq!(nearest(&trace, 11.2).map(|s| s.session_time), Some(12.0));
        assert_eq!(nearest(&trace, 10.9).map(|s| s.session_time), Some(10.0));
        assert_eq!(nearest(&trace, 5.0).map(|s| s.session_time), Some(10.0));
        assert_eq!(nearest(&trace, 99.0).map(|s| s.session_time), Some(20.0));
        assert!(nearest(&[], 1.0).is_none());
    }

    #[test]
    fn test_nearest_tie_prefers_earlier() {
        let trace = vec![sample("NOR", 10.0, 1), sample("NOR", 12.0, 1)];
        assert_eq!(nearest(&trace, 11.0).map(|s| s.session_time), Some(10.0));
    }

    #[test]
    fn test_bounds_span_all_drivers() {
        let source = TimeseriesSource::from_records(vec![
            sample("NOR", 5.0, 1),
            sample("VER", 2.0, 1),
            sample("VER", 40.0, 3),
        ]);
        assert_eq!(source.session_bounds(), Some((2.0, 40.0)));
        assert_eq!(source.driver_count(), 2);
    }

    #[test]
    fn test_empty_recording_has_no_bounds() {
        let source = TimeseriesSource::from_records(Vec::new());
        assert!(source.session_bounds().is_none());
        assert!(source.race_state_at(0.0).unwrap().is_none());
    }
}
