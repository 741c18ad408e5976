//! # Headless clock
//!
//! Runs the full service stack against in-memory adapters and logs what the
//! panel and speaker would do.
//!
//! Usage:
//!   cargo run --example headless                          # defaults
//!   cargo run --example headless -- --alarm-in-minutes 2  # ring soon
//!   cargo run --example headless -- -c clock.toml -v      # config file, debug logs
//!
//! Stop with Ctrl-C; the panel is blanked before exit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use inkclock::testing::{
    FixedPresence, MemoryAudio, MemoryCalendar, MemoryCompositor, MemoryDisplay, PanelOp,
};
use inkclock::{
    AlarmController, CalendarService, Config, DisplayCoordinator, LogTap, Scheduler,
    SchedulerExit, SysfsInterfaces, SystemClock,
};

#[derive(Parser)]
#[command(name = "headless", version, about = "E-paper alarm clock without hardware")]
struct Cli {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed one calendar occurrence this many minutes from now
    #[arg(long, default_value_t = 1)]
    alarm_in_minutes: i64,

    /// Report the network icon from /sys/class/net instead of always online
    #[arg(long)]
    sysfs_network: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let cfg = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    }
    .with_env_overrides();
    tracing::info!(calendar = ?cfg.calendar, tick_ms = cfg.scheduler.tick_ms, "config loaded");

    let now = Utc::now();
    let bus = inkclock::Bus::new();

    let calendar = MemoryCalendar::with_calendar(&cfg.calendar.name);
    calendar.set_occurrences([now + TimeDelta::minutes(cli.alarm_in_minutes)]);

    let presence: Box<dyn inkclock::NetworkPresence> = if cli.sysfs_network {
        Box::new(SysfsInterfaces::new())
    } else {
        Box::new(FixedPresence::new(true))
    };

    let panel = MemoryDisplay::default();
    let mut display = DisplayCoordinator::new(
        Box::new(panel.clone()),
        Box::new(MemoryCompositor::default()),
        presence,
        &bus,
        &cfg.display,
        now,
    );
    display.power_on().await.context("panel power on")?;

    let mut scheduler = Scheduler::new(cfg.scheduler.quantum());
    scheduler.add(Box::new(LogTap::new(&bus)));
    scheduler.add(Box::new(CalendarService::new(
        Box::new(calendar),
        bus.clone(),
        &cfg.calendar,
    )));
    scheduler.add(Box::new(AlarmController::new(
        Box::new(MemoryAudio::default()),
        bus.clone(),
        &cfg.alarm,
    )));
    scheduler.add(Box::new(display));

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = termination().await {
            tracing::error!(error = %err, "signal handler failed");
        }
        trigger.cancel();
    });

    tracing::info!(tasks = ?scheduler.task_names(), "clock running");
    match scheduler.run(&SystemClock, shutdown).await {
        // cancellation already ran the display's blank-at-exit hook
        SchedulerExit::Cancelled => tracing::info!(
            panel_cleared = panel.ops().ends_with(&[PanelOp::Clear, PanelOp::Sleep]),
            "shutdown complete"
        ),
        SchedulerExit::Drained => tracing::warn!("every service stopped"),
    }
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it.
async fn termination() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = term.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
