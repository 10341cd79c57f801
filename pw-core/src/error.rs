//! Errors for operator input that cannot be applied to a session

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid number for {name}: {input:?}")]
    InvalidNumber { name: &'static str, input: String },

    #[error("unknown tyre compound: {0:?}")]
    UnknownCompound(String),

    #[error("unknown engine mode: {0:?}")]
    UnknownEngineMode(String),

    #[error("unsupported playback speed {0}, expected one of 1, 2, 5, 10")]
    UnsupportedSpeed(u32),

    #[error("unknown driver: {0:?}")]
    UnknownDriver(String),

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("missing value for {0}")]
    MissingValue(&'static str),
}
