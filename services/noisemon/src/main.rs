//! Noise monitor
//!
//! Runs the alert session against a simulated decibel feed and redraws the terminal
//! dashboard on every state change. Commands are read line by line from stdin.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use common::{init_with_config, set_log_level, wait_for_shutdown, LogConfig};
use noise_clients::{build_source, FixedPosition, GenAiClient, NominatimResolver, PlaceholderImages};
use noise_core::{DecibelSource, RandomWalkSimulator};
use noisemon::args::Args;
use noisemon::console::{self, ConsoleCommand};
use noisemon::dashboard::{self, CLEAR, HELP};
use noisemon::{Collaborators, Monitor, MonitorHandle, MonitorSettings, NoisemonConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = NoisemonConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.no_color {
        colored::control::set_override(false);
    }

    init_with_config(LogConfig {
        service_name: "noisemon".to_string(),
        level: config.logging.level.clone(),
        enable_json: config.logging.json,
        ansi: !args.no_color,
        log_dir: config.logging.dir.clone(),
    })
    .context("Failed to initialize logging")?;

    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    info!(
        "Starting noise monitor v{} ({} area)",
        env!("CARGO_PKG_VERSION"),
        config.monitor.environment
    );
    if config.genai.api_key.is_none() {
        warn!("No genai.api_key configured; suggestions and classification will fail");
    }

    let handle = start(&config)?;
    let result = run_console(&handle, args.no_color).await;

    info!("Shutting down noise monitor");
    handle.shutdown().await?;
    result
}

fn start(config: &NoisemonConfig) -> Result<MonitorHandle> {
    let genai = Arc::new(GenAiClient::new(config.genai.clone())?);
    let position = Arc::new(FixedPosition::new(config.location.coordinates()));
    let location = Arc::new(NominatimResolver::new(&config.location, position)?);

    let collaborators = Collaborators {
        suggestions: genai.clone(),
        classifier: genai,
        images: Arc::new(PlaceholderImages::new(config.images.clone())),
        location,
        audio: build_source(&config.audio)?,
    };

    let walk = match config.monitor.seed {
        Some(seed) => RandomWalkSimulator::seeded(seed),
        None => RandomWalkSimulator::new(),
    };
    let source: Box<dyn DecibelSource> =
        Box::new(walk.with_max_step(config.monitor.max_step_db));

    let settings = MonitorSettings::from(&config.monitor);
    Ok(Monitor::new(settings, source, collaborators).spawn())
}

/// Dashboard redraws, notices and stdin commands until quit or a shutdown signal
async fn run_console(handle: &MonitorHandle, plain: bool) -> Result<()> {
    let mut snapshots = handle.subscribe();
    let mut notices = handle.notices();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut stdout = std::io::stdout();

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                info!("Received {}", signal);
                return Ok(());
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    error!("Monitor stopped unexpectedly");
                    return Ok(());
                }
                let frame = dashboard::render(&snapshots.borrow_and_update());
                if plain {
                    writeln!(stdout, "{}", frame)?;
                } else {
                    write!(stdout, "{}{}", CLEAR, frame)?;
                }
                stdout.flush()?;
            }

            notice = notices.recv() => match notice {
                Ok(notice) => writeln!(stdout, "{}", dashboard::render_notice(&notice))?,
                Err(RecvError::Lagged(skipped)) => warn!("Dropped {} notices", skipped),
                Err(RecvError::Closed) => return Ok(()),
            },

            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    // Keep running headless once stdin closes
                    stdin_open = false;
                    continue;
                };
                match console::parse(&line) {
                    Ok(None) => {},
                    Ok(Some(ConsoleCommand::Quit)) => return Ok(()),
                    Ok(Some(ConsoleCommand::Help)) => writeln!(stdout, "{}", HELP)?,
                    Ok(Some(ConsoleCommand::SetEnvironment(environment))) => {
                        handle.set_environment(environment).await?;
                    },
                    Ok(Some(ConsoleCommand::Classify)) => handle.classify_now().await?,
                    Ok(Some(ConsoleCommand::LogLevel(level))) => {
                        if let Err(e) = set_log_level(&level) {
                            warn!("Log level unchanged: {}", e);
                        }
                    },
                    Err(message) => writeln!(stdout, "{} ({})", message, HELP)?,
                }
            }
        }
    }
}
