//! Operator commands
//!
//! One command per line, e.g. `speed 5`, `compound soft`, `seek 1800`.
//! Parameter commands recompute the adjusted snapshot and alerts on the spot
//! without advancing degradation.

use crate::fetch;
use crate::playback::start_playback_task;
use crate::state::AppState;
use pw_core::strategy::{Compound, EngineMode, PlaybackSpeed};
use pw_core::ParameterError;
use serde_json::json;
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    Play,
    Pause,
    Speed(PlaybackSpeed),
    Seek(f64),
    Compound(Compound),
    Pressure(f64),
    Fuel(f64),
    Mode(EngineMode),
    Penalty(f64),
    Driver(String),
    Reset,
    Status,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

fn number(name: &'static str, value: Option<&str>) -> Result<f64, ParameterError> {
    let input = value.ok_or(ParameterError::MissingValue(name))?;
    input
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParameterError::InvalidNumber {
            name,
            input: input.to_string(),
        })
}

impl FromStr for OperatorCommand {
    type Err = ParameterError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let action = words.next().unwrap_or_default().to_ascii_lowercase();
        let value = words.next();

        match action.as_str() {
            "play" => Ok(OperatorCommand::Play),
            "pause" => Ok(OperatorCommand::Pause),
            "reset" => Ok(OperatorCommand::Reset),
            "status" => Ok(OperatorCommand::Status),
            "speed" => {
                let input = value.ok_or(ParameterError::MissingValue("speed"))?;
                let raw = input.trim_end_matches(['x', 'X']);
                let speed = raw.parse::<u32>().map_err(|_| ParameterError::InvalidNumber {
                    name: "speed",
                    input: input.to_string(),
                })?;
                Ok(OperatorCommand::Speed(PlaybackSpeed::try_from(speed)?))
            }
            "seek" => Ok(OperatorCommand::Seek(number("seek", value)?)),
            "compound" => {
                let label = value.ok_or(ParameterError::MissingValue("compound"))?;
                Ok(OperatorCommand::Compound(label.parse()?))
            }
            "pressure" => Ok(OperatorCommand::Pressure(number("pressure", value)?)),
            "fuel" => Ok(OperatorCommand::Fuel(number("fuel", value)?)),
            "mode" => {
                let label = value.ok_or(ParameterError::MissingValue("mode"))?;
                Ok(OperatorCommand::Mode(label.parse()?))
            }
            "penalty" => Ok(OperatorCommand::Penalty(number("penalty", value)?)),
            "driver" => {
                let code = value.ok_or(ParameterError::MissingValue("driver"))?;
                Ok(OperatorCommand::Driver(code.to_ascii_uppercase()))
            }
            _ => Err(ParameterError::UnknownCommand(line.trim().to_string())),
        }
    }
}

/// Apply a command to the running session.
///
/// Returns a short JSON status for the operator.
pub async fn apply_command(
    state: &AppState,
    command: OperatorCommand,
) -> Result<serde_json::Value, CommandError> {
    let reply = match command {
        OperatorCommand::Play => {
            let finished_at = {
                let mut session = state.session.write().await;
                if session.clock().is_finished() {
                    Some(session.clock().session_time())
                } else {
                    session.play();
                    None
                }
            };
            match finished_at {
                // Nothing left to replay until the operator seeks or resets
                Some(time) => json!({"status": "finished", "session_time": time}),
                None => {
                    start_playback_task(state.clone()).await;
                    json!({"status": "playing"})
                }
            }
        }
        OperatorCommand::Pause => {
            state.session.write().await.pause();
            state.cancel_playback().await;
            json!({"status": "paused"})
        }
        OperatorCommand::Speed(speed) => {
            state.session.write().await.set_playback_speed(speed);
            json!({"status": "speed_set", "speed": speed})
        }
        OperatorCommand::Seek(time) => {
            let ticket = state.session.write().await.seek(time)?;
            fetch::dispatch(state, ticket);
            json!({"status": "seeked", "session_time": ticket.session_time})
        }
        OperatorCommand::Compound(compound) => {
            state
                .session
                .write()
                .await
                .update_parameters(|p| {
                    p.compound = compound;
                    Ok(())
                })?;
            json!({"status": "parameters_set", "compound": compound})
        }
        OperatorCommand::Pressure(psi) => {
            let mut session = state.session.write().await;
            session.update_parameters(|p| p.set_tire_pressure(psi))?;
            json!({"status": "parameters_set", "tire_pressure": session.params().tire_pressure})
        }
        OperatorCommand::Fuel(kg) => {
            let mut session = state.session.write().await;
            session.update_parameters(|p| p.set_fuel_load(kg))?;
            json!({"status": "parameters_set", "fuel_load": session.params().fuel_load})
        }
        OperatorCommand::Mode(mode) => {
            state
                .session
                .write()
                .await
                .update_parameters(|p| {
                    p.engine_mode = mode;
                    Ok(())
                })?;
            json!({"status": "parameters_set", "engine_mode": mode})
        }
        OperatorCommand::Penalty(factor) => {
            let mut session = state.session.write().await;
            session.set_performance_penalty(factor);
            json!({"status": "penalty_set", "performance_penalty": session.performance_penalty()})
        }
        OperatorCommand::Driver(code) => {
            let info = state
                .source
                .driver_info(&code)
                .ok_or_else(|| ParameterError::UnknownDriver(code.clone()))?;
            state.session.write().await.select_driver(info.driver.clone());
            fetch::load_outline(state, info.driver.clone()).await?;
            json!({"status": "driver_selected", "driver": info.driver, "team": info.team, "total_laps": info.total_laps})
        }
        OperatorCommand::Reset => {
            state.cancel_playback().await;
            let ticket = {
                let mut session = state.session.write().await;
                session.reset();
                let start = session.clock().session_time();
                session.begin_fetch(start)
            };
            fetch::dispatch(state, ticket);
            json!({"status": "reset", "session_time": ticket.session_time})
        }
        OperatorCommand::Status => {
            let view = state.session.read().await.view();
            return Ok(serde_json::to_value(view).unwrap_or_default());
        }
    };

    info!("Applied operator command: {}", reply);
    state.publish().await;
    Ok(reply)
}

/// Load the selected driver's outline and the snapshot at the clock's
/// current time
pub async fn prime(state: &AppState) {
    let (driver, ticket) = {
        let mut session = state.session.write().await;
        let time = session.clock().session_time();
        (session.selected_driver().to_string(), session.begin_fetch(time))
    };
    fetch::dispatch(state, ticket);
    if let Err(e) = fetch::load_outline(state, driver).await {
        error!("{:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("play".parse::<OperatorCommand>(), Ok(OperatorCommand::Play));
        assert_eq!(" PAUSE ".parse::<OperatorCommand>(), Ok(OperatorCommand::Pause));
        assert_eq!("reset".parse::<OperatorCommand>(), Ok(OperatorCommand::Reset));
        assert_eq!("status".parse::<OperatorCommand>(), Ok(OperatorCommand::Status));
    }

    #[test]
    fn test_parse_speed() {
        assert_eq!(
            "speed 5".parse::<OperatorCommand>(),
            Ok(OperatorCommand::Speed(PlaybackSpeed::X5))
        );
        assert_eq!(
            "speed 10x".parse::<OperatorCommand>(),
            Ok(OperatorCommand::Speed(PlaybackSpeed::X10))
        );
        assert_eq!(
            "speed 3".parse::<OperatorCommand>(),
            Err(ParameterError::UnsupportedSpeed(3))
        );
        assert!(matches!(
            "speed fast".parse::<OperatorCommand>(),
            Err(ParameterError::InvalidNumber { name: "speed", .. })
        ));
    }

    #[test]
    fn test_parse_parameter_commands() {
        assert_eq!(
            "compound soft".parse::<OperatorCommand>(),
            Ok(OperatorCommand::Compound(Compound::Soft))
        );
        assert_eq!(
            "mode power".parse::<OperatorCommand>(),
            Ok(OperatorCommand::Mode(EngineMode::Power))
        );
        assert_eq!(
            "pressure 21.5".parse::<OperatorCommand>(),
            Ok(OperatorCommand::Pressure(21.5))
        );
        assert_eq!("fuel 40".parse::<OperatorCommand>(), Ok(OperatorCommand::Fuel(40.0)));
        assert_eq!(
            "driver nor".parse::<OperatorCommand>(),
            Ok(OperatorCommand::Driver("NOR".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            "seek".parse::<OperatorCommand>(),
            Err(ParameterError::MissingValue("seek"))
        );
        assert!(matches!(
            "fuel NaN".parse::<OperatorCommand>(),
            Err(ParameterError::InvalidNumber { name: "fuel", .. })
        ));
        assert!(matches!(
            "compound wet".parse::<OperatorCommand>(),
            Err(ParameterError::UnknownCompound(_))
        ));
        assert!(matches!(
            "boost 3".parse::<OperatorCommand>(),
            Err(ParameterError::UnknownCommand(_))
        ));
    }
}
