//! PitWall Runner
//!
//! Replays a race through the strategy engine, reading operator commands
//! from stdin and writing dashboard views to the configured sinks.

use anyhow::Result;
use clap::Parser;
use pw_core::PlaybackSpeed;
use pw_runner::config::{RunnerConfig, SourceConfig};
use pw_runner::control::{self, OperatorCommand};
use pw_runner::state::AppState;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pitwall", version, about = "Race strategy telemetry runner")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// `demo` or a path to a recorded time-series
    #[arg(short, long)]
    source: Option<String>,

    /// Driver code to evaluate, e.g. NOR
    #[arg(short, long)]
    driver: Option<String>,

    /// Playback speed (1, 2, 5 or 10)
    #[arg(long)]
    speed: Option<u32>,

    /// Play immediately and exit after this many clock ticks
    #[arg(long)]
    ticks: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::load(path)?,
            None => RunnerConfig::default(),
        };

        if let Some(source) = self.source {
            config.source = if source.eq_ignore_ascii_case("demo") {
                SourceConfig::Demo
            } else {
                SourceConfig::Timeseries {
                    path: PathBuf::from(source),
                }
            };
        }
        if let Some(driver) = self.driver {
            config.driver = driver.to_ascii_uppercase();
        }
        if let Some(speed) = self.speed {
            config.playback_speed = PlaybackSpeed::try_from(speed)?;
        }
        if let Some(ticks) = self.ticks {
            config.max_ticks = Some(ticks);
            config.autoplay = true;
        }
        Ok(config)
    }
}

async fn handle_line(state: &AppState, line: &str) {
    let command = match line.parse::<OperatorCommand>() {
        Ok(command) => command,
        Err(e) => {
            warn!("Rejected command {:?}: {}", line.trim(), e);
            return;
        }
    };

    match control::apply_command(state, command).await {
        Ok(reply) => println!("{}", reply),
        Err(e) => warn!("Command {:?} failed: {}", line.trim(), e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting PitWall Runner");

    let config = Args::parse().into_config()?;
    let source = config.build_source()?;
    let state = pw_runner::launch(&config, source).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => handle_line(&state, &line).await,
                None if config.max_ticks.is_some() => stdin_open = false,
                None => break,
            },
        }
    }

    state.cancel_playback().await;
    state.shutdown.cancel();
    info!("PitWall Runner stopped");
    Ok(())
}
