//! Simulated session clock
//!
//! The clock owns session time and play/pause state. Each call to
//! [`SimulationClock::advance`] moves session time forward by one nominal
//! step; the playback speed shortens the wall-clock interval between steps
//! rather than lengthening the step, so wear and heat scale linearly with
//! speed.

use crate::error::ParameterError;
use crate::strategy::PlaybackSpeed;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Nominal simulated seconds per clock step
pub const DEFAULT_STEP_SECS: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationClock {
    session_time: f64,
    start_time: f64,
    end_time: Option<f64>,
    playing: bool,
    speed: PlaybackSpeed,
    step_secs: f64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl SimulationClock {
    /// A paused clock at `start_time`
    pub fn new(start_time: f64) -> Self {
        let start_time = if start_time.is_finite() { start_time.max(0.0) } else { 0.0 };
        Self {
            session_time: start_time,
            start_time,
            end_time: None,
            playing: false,
            speed: PlaybackSpeed::X1,
            step_secs: DEFAULT_STEP_SECS,
        }
    }

    /// Stop playback once session time reaches `end_time`
    pub fn with_end_time(mut self, end_time: Option<f64>) -> Self {
        self.end_time = end_time.filter(|t| t.is_finite() && *t > self.start_time);
        self
    }

    pub fn with_step(mut self, step_secs: f64) -> Self {
        if step_secs.is_finite() && step_secs > 0.0 {
            self.step_secs = step_secs;
        }
        self
    }

    pub fn session_time(&self) -> f64 {
        self.session_time
    }

    pub fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn step_secs(&self) -> f64 {
        self.step_secs
    }

    pub fn play(&mut self) {
        if !self.is_finished() {
            self.playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    pub fn set_speed_value(&mut self, value: u32) -> Result<(), ParameterError> {
        self.speed = PlaybackSpeed::try_from(value)?;
        Ok(())
    }

    /// Jump to `time`, clamped to the session bounds. Does not change play state.
    pub fn seek(&mut self, time: f64) -> Result<f64, ParameterError> {
        if !time.is_finite() || time < 0.0 {
            return Err(ParameterError::OutOfRange {
                name: "seek time",
                value: time,
                min: 0.0,
                max: self.end_time.unwrap_or(f64::MAX),
            });
        }
        self.session_time = match self.end_time {
            Some(end) => time.min(end),
            None => time,
        };
        Ok(self.session_time)
    }

    /// Back to the start, paused
    pub fn rewind(&mut self) {
        self.session_time = self.start_time;
        self.playing = false;
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some_and(|end| self.session_time >= end)
    }

    /// Wall-clock time between steps at the current playback speed
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.step_secs / self.speed.multiplier())
    }

    /// Move forward one step if playing.
    ///
    /// Returns the new session time, or `None` when paused or finished.
    /// Reaching the end time pauses the clock.
    pub fn advance(&mut self) -> Option<f64> {
        if !self.playing {
            return None;
        }
        if self.is_finished() {
            self.playing = false;
            return None;
        }

        let next = self.session_time + self.step_secs;
        self.session_time = match self.end_time {
            Some(end) if next >= end => {
                self.playing = false;
                end
            }
            _ => next,
        };
        Some(self.session_time)
    }
}
