//! Integration tests for the TimeseriesSource

use pw_core::source::TelemetrySource;
use pw_sources::TimeseriesSource;
use std::io::Write;

// ============================================================================
// Helper functions
// ============================================================================

fn record(driver: &str, time: f64, lap: u32, position: u32, x: f64, y: f64) -> String {
    format!(
        r#"{{"SessionTime": {time}, "Driver": "{driver}", "Team": "Team {driver}", "LapNumber": {lap},
            "Position": {position}, "Compound": "SOFT", "TyreLife": 3, "Speed": 280.5,
            "RPM": 11000, "nGear": 7, "Throttle": 99, "Brake": false, "DRS": 0,
            "X": {x}, "Y": {y}, "Z": 0}}"#
    )
}

fn recording() -> String {
    let mut rows = Vec::new();
    for i in 0..30 {
        let t = 100.0 + f64::from(i);
        let lap = i / 10 + 1;
        rows.push(record("VER", t, lap, 1, 100.0 + f64::from(i), 50.0 + f64::from(i % 10)));
        rows.push(record("NOR", t + 0.5, lap, 2, 90.0 + f64::from(i), 40.0));
    }
    format!("[{}]", rows.join(","))
}

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_json_array() {
    let file = write_temp(&recording());
    let source = TimeseriesSource::load(file.path()).expect("load should succeed");
    assert_eq!(source.name(), "Timeseries");
    assert_eq!(source.driver_count(), 2);
    assert_eq!(source.session_bounds(), Some((100.0, 129.5)));
}

#[test]
fn test_load_ndjson() {
    let contents = format!(
        "{}\n\n{}\n",
        record("LEC", 5.0, 1, 1, 10.0, 10.0).replace('\n', " "),
        record("LEC", 6.0, 1, 1, 11.0, 10.0).replace('\n', " ")
    );
    let source = TimeseriesSource::from_json(&contents).expect("ndjson should parse");
    assert_eq!(source.session_bounds(), Some((5.0, 6.0)));
}

#[test]
fn test_load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = TimeseriesSource::load(dir.path().join("missing.json"));
    assert!(result.is_err());
}

#[test]
fn test_load_malformed_json_fails() {
    assert!(TimeseriesSource::from_json("[{\"Driver\": ").is_err());
}

#[test]
fn test_malformed_values_default_instead_of_failing() {
    let contents = r#"[{"SessionTime": 1.0, "Driver": "PIA", "Speed": "fast", "nGear": null}]"#;
    let source = TimeseriesSource::from_json(contents).unwrap();
    let state = source.race_state_at(1.0).unwrap().unwrap();
    let pia = state.driver("PIA").unwrap();
    assert_eq!(pia.speed, 0.0);
    assert_eq!(pia.gear, 0);
}

const CSV_HEADER: &str = "Date,SessionTime,Driver,Team,LapNumber,Position,Stint,Compound,TyreLife,\
Speed,RPM,nGear,Throttle,Brake,DRS,X,Y,Z,IsRaceNeutralized";

fn csv_recording() -> String {
    [
        CSV_HEADER,
        "2024-06-30 14:05:01,3600.0,VER,Red Bull Racing,41.0,1,2,HARD,19.0,301.2,11650,8,100,False,12,-1520.3,2210.0,12.0,False",
        "2024-06-30 14:05:01,3600.4,NOR,McLaren,41.0,2,2,MEDIUM,12.0,,11400,7,87,True,0,-1610.8,2180.5,11.0,False",
        "2024-06-30 14:05:02,3601.0,VER,Red Bull Racing,41.0,1,2,HARD,19.0,298.7,11500,8,100,False,12,-1490.1,2230.4,12.0,False",
    ]
    .join("\n")
}

#[test]
fn test_load_csv_by_extension() {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp file");
    file.write_all(csv_recording().as_bytes()).expect("write temp file");

    let source = TimeseriesSource::load(file.path()).expect("csv should load");
    assert_eq!(source.driver_count(), 2);
    assert_eq!(source.session_bounds(), Some((3600.0, 3601.0)));

    let state = source.race_state_at(3600.4).unwrap().expect("inside bounds");
    assert_eq!(state.drivers[0].driver, "VER", "ordered by position");

    let nor = state.driver("NOR").unwrap();
    assert_eq!(nor.team, "McLaren");
    assert_eq!(nor.lap_number, 41);
    assert_eq!(nor.compound, "MEDIUM");
    assert_eq!(nor.tire_life, 12.0);
    assert_eq!(nor.speed, 0.0, "empty cell defaults to zero");
    assert_eq!(nor.gear, 7);
    assert!(nor.brake);
    assert!(!nor.drs);
    assert_eq!(nor.x, -1610.8);

    let ver = state.driver("VER").unwrap();
    assert!(!ver.brake);
    assert!(ver.drs);
    assert!(!ver.race_neutralized);
}

#[test]
fn test_load_csv_detected_from_content() {
    let file = write_temp(&csv_recording());
    let source = TimeseriesSource::load(file.path()).expect("csv content should load");
    assert_eq!(source.driver_count(), 2);
    assert_eq!(source.driver_info("VER").unwrap().team, "Red Bull Racing");
}

#[test]
fn test_csv_with_ragged_row_fails() {
    let contents = format!("{}\n3600.0,VER", CSV_HEADER);
    assert!(TimeseriesSource::from_csv(contents.as_bytes()).is_err());
}

// ============================================================================
// Race state lookup
// ============================================================================

#[test]
fn test_race_state_uses_nearest_sample_per_driver() {
    let source = TimeseriesSource::from_json(&recording()).unwrap();
    let state = source.race_state_at(110.3).unwrap().expect("inside bounds");

    assert_eq!(state.time, 110.3);
    assert_eq!(state.drivers.len(), 2);
    assert_eq!(state.drivers[0].driver, "VER", "ordered by position");
    assert_eq!(state.driver("VER").unwrap().session_time, 110.0);
    assert_eq!(state.driver("NOR").unwrap().session_time, 110.5);
}

#[test]
fn test_race_state_outside_bounds_is_none() {
    let source = TimeseriesSource::from_json(&recording()).unwrap();
    assert!(source.race_state_at(50.0).unwrap().is_none());
    assert!(source.race_state_at(500.0).unwrap().is_none());
}

// ============================================================================
// Outline and metadata
// ============================================================================

#[test]
fn test_track_outline_uses_first_complete_lap() {
    let source = TimeseriesSource::from_json(&recording()).unwrap();
    let outline = source.track_outline("VER").unwrap().expect("VER has a trace");
    // Lap 1 covers samples 0..10
    assert_eq!(outline.len(), 10);
    assert_eq!(outline[0].x, 100.0);
    assert_eq!(outline[9].x, 109.0);
}

#[test]
fn test_track_outline_skips_zero_coordinates() {
    let contents = format!(
        "[{},{},{}]",
        record("ALO", 1.0, 1, 1, 0.0, 5.0),
        record("ALO", 2.0, 1, 1, 3.0, 4.0),
        record("ALO", 3.0, 2, 1, 6.0, 7.0)
    );
    let source = TimeseriesSource::from_json(&contents).unwrap();
    let outline = source.track_outline("ALO").unwrap().unwrap();
    assert_eq!(outline.len(), 1);
    assert_eq!((outline[0].x, outline[0].y), (3.0, 4.0));
}

#[test]
fn test_track_outline_unknown_driver() {
    let source = TimeseriesSource::from_json(&recording()).unwrap();
    assert!(source.track_outline("HAM").unwrap().is_none());
}

#[test]
fn test_driver_info_reports_laps_and_team() {
    let source = TimeseriesSource::from_json(&recording()).unwrap();
    let info = source.driver_info("nor").expect("NOR is recorded");
    assert_eq!(info.driver, "NOR");
    assert_eq!(info.team, "Team NOR");
    assert_eq!(info.total_laps, 3);
}
