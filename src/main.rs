//! league-pad - gamepad to mouse/keyboard bridge
//!
//! Reads a controller (or a replay file), turns stick motion into cursor and
//! champion movement on a fixed tick and maps buttons to keys.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use league_pad::actuator::{ConsoleActuator, SharedActuator};
use league_pad::bindings::{BindingsProcessor, ButtonBindings};
use league_pad::config::{AppConfig, SourceConfig, SourceKind};
use league_pad::input::gamepad::{
    ControllerStateMonitor, MonitorSettings, ReplaySource, SamplerHandle, SamplerStatus,
    SnapshotSource, SourceError, SourceFactory,
};
use league_pad::movement::{stick_router, ArbiterSettings, MovementArbiter, MovementSlots};
use league_pad::paths::{AppPaths, PathMode};

/// league-pad - play a top-down game with a gamepad
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Play back recorded frames instead of reading a controller
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.log_json)?;

    info!("Starting league-pad v{}...", env!("CARGO_PKG_VERSION"));

    let paths = AppPaths::detect(args.config.as_deref());
    info!("Configuration file: {} ({:?})", paths.config.display(), paths.mode);

    // An explicit path must exist; the fallbacks may be absent
    let mut config = if paths.mode == PathMode::Explicit {
        AppConfig::load(&paths.config).await?
    } else {
        AppConfig::load_or_default(&paths.config).await?
    };

    if let Some(replay) = args.replay {
        config.source.kind = SourceKind::Replay;
        config.source.replay_file = Some(replay);
    }
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    run_app(config, shutdown_signal()).await?;

    info!("league-pad shutdown complete");
    Ok(())
}

async fn run_app(config: AppConfig, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
    let factory = source_factory(&config.source).await?;

    let actuator = SharedActuator::new(Arc::new(ConsoleActuator::new("console")));
    info!("Actuator: {}", actuator.name());

    let slots = Arc::new(MovementSlots::new());
    let bindings = BindingsProcessor::spawn(ButtonBindings::new(&config.bindings), actuator.clone());

    let mut monitor = ControllerStateMonitor::new(MonitorSettings::from(&config.monitor));
    monitor.subscribe(stick_router(slots.clone(), config.movement.swap_sticks));
    monitor.subscribe(bindings.listener());

    let arbiter = MovementArbiter::new(slots, actuator, ArbiterSettings::from(&config.movement)).spawn();
    let mut sampler = SamplerHandle::spawn(factory, monitor, config.source.poll_interval());

    let mut status = WatchStream::new(sampler.status());
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            next = status.next() => match next {
                Some(SamplerStatus::Running) => info!("Sampler running"),
                Some(SamplerStatus::SourceLost(reason)) => {
                    warn!("Controller source lost: {}", reason);
                    // Let the arbiter flush the final release before stopping
                    tokio::time::sleep(config.movement.tick_interval() * 2).await;
                    break;
                }
                Some(SamplerStatus::Stopped) | None => break,
            },
        }
    }

    // Stopping the sampler drops the monitor and its listeners, which lets the
    // bindings processor drain and exit
    sampler.shutdown().await;
    bindings.shutdown().await;
    let stats = arbiter.shutdown().await;

    info!(
        "Movement stats: {} ticks, {} cursor moves, {} champion commands ({} throttled), {} failures",
        stats.ticks, stats.cursor_issued, stats.champion_issued, stats.champion_throttled, stats.failed
    );

    Ok(())
}

/// Build the factory that opens the configured source on the sampling thread
async fn source_factory(config: &SourceConfig) -> Result<SourceFactory> {
    match config.kind {
        SourceKind::Replay => {
            let path = config
                .replay_file
                .as_deref()
                .context("source.replay_file is not set")?;
            let source = ReplaySource::load(path).await?;
            info!("Replaying {} frame(s) from {}", source.len(), path.display());
            Ok(Box::new(move || -> Result<Box<dyn SnapshotSource>, SourceError> {
                Ok(Box::new(source))
            }))
        }
        #[cfg(windows)]
        SourceKind::Xinput => {
            let user_index = config.user_index;
            Ok(Box::new(move || {
                league_pad::input::gamepad::XInputSource::open(user_index)
                    .map(|source| Box::new(source) as Box<dyn SnapshotSource>)
            }))
        }
        #[cfg(windows)]
        SourceKind::Gilrs => Ok(Box::new(|| {
            league_pad::input::gamepad::GilrsSource::open()
                .map(|source| Box::new(source) as Box<dyn SnapshotSource>)
        })),
        #[cfg(not(windows))]
        kind @ (SourceKind::Xinput | SourceKind::Gilrs) => {
            anyhow::bail!("The {:?} source is only available on Windows; use --replay <file>", kind)
        }
    }
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .init();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
