#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays headless shooting gallery matches with a
//! scripted shooter.

mod shooter;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use shooting_gallery_core::{Command, Event, GradeResult, MatchStats, SessionConfig};
use shooting_gallery_session::{apply, query, Session};
use tracing::{debug, info, warn};

use crate::shooter::{Shooter, ShooterProfile};

/// Slack allowed past the configured match length before a run is abandoned.
const RUN_SLACK: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "shooting-gallery")]
#[command(about = "Plays a timed shooting gallery match with a simulated shooter")]
struct Cli {
    /// TOML file holding session tuning and an optional `[shooter]` table
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the spawn seed
    #[arg(long)]
    seed: Option<u64>,
    /// Length of one simulated frame in milliseconds
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Probability that an attempted shot lands
    #[arg(long)]
    accuracy: Option<f32>,
    /// Standard deviation of the aim jitter around the weak point
    #[arg(long)]
    aim_spread: Option<f32>,
    /// Plays a second match through a restart request once the first ends
    #[arg(long, default_value_t = false)]
    restart_after_end: bool,
}

/// On-disk layout: session tuning at the top level plus the shooter profile.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(flatten)]
    session: SessionConfig,
    shooter: ShooterProfile,
}

/// Entry point for the shooting gallery command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConfigFile::default(),
    };
    let mut session_config = file.session;
    if let Some(seed) = cli.seed {
        session_config.spawning.seed = seed;
    }
    let mut session = Session::new(session_config);
    if let Some(error) = query::configuration_error(&session) {
        bail!("invalid session configuration: {error}");
    }

    let mut profile = file.shooter;
    if let Some(accuracy) = cli.accuracy {
        profile.accuracy = accuracy;
    }
    if let Some(aim_spread) = cli.aim_spread {
        profile.aim_spread = aim_spread;
    }
    if cli.tick_ms == 0 {
        bail!("--tick-ms must be greater than zero");
    }

    let frame = Duration::from_millis(cli.tick_ms);
    let config = query::config(&session);
    let frame_budget = frame_budget(config, frame);
    let mut shooter = Shooter::new(
        &profile,
        config.targets.weak_point_radius,
        config.spawning.seed,
    )?;

    let rounds = if cli.restart_after_end { 2 } else { 1 };
    for round in 1..=rounds {
        let opening = if round == 1 {
            Command::RequestStart
        } else {
            Command::RequestRestart
        };
        let (result, stats) = play(&mut session, &mut shooter, opening, frame, frame_budget)
            .with_context(|| format!("match {round} did not complete"))?;
        print_report(round, &result, &stats);
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse configuration at {}", path.display()))
}

/// Number of frames a single match may take before the run is abandoned.
fn frame_budget(config: &SessionConfig, frame: Duration) -> u64 {
    let timing = &config.timing;
    let countdown = timing.countdown_step() * 3 + timing.go_hold();
    let total = countdown + timing.duration() + timing.end_report_delay() + RUN_SLACK;
    let frames = total.as_nanos() / frame.as_nanos();
    u64::try_from(frames).unwrap_or(u64::MAX).saturating_add(1)
}

fn play(
    session: &mut Session,
    shooter: &mut Shooter,
    opening: Command,
    frame: Duration,
    frame_budget: u64,
) -> Result<(GradeResult, MatchStats)> {
    let mut events = Vec::new();
    let mut shots = Vec::new();
    apply(session, opening, &mut events);
    if let Some(report) = observe(shooter, &mut events)? {
        return Ok(report);
    }

    for _ in 0..frame_budget {
        apply(session, Command::Tick { dt: frame }, &mut events);
        if let Some(report) = observe(shooter, &mut events)? {
            return Ok(report);
        }

        if query::phase(session).is_active() {
            shooter.aim(frame, &mut shots);
            for shot in shots.drain(..) {
                apply(session, shot, &mut events);
            }
            if let Some(report) = observe(shooter, &mut events)? {
                return Ok(report);
            }
        }
    }

    bail!(
        "no end report after {frame_budget} frames (phase {:?})",
        query::phase(session)
    )
}

/// Forwards drained events to the shooter, returning the end report if one
/// was published.
fn observe(
    shooter: &mut Shooter,
    events: &mut Vec<Event>,
) -> Result<Option<(GradeResult, MatchStats)>> {
    let mut report = None;
    for event in events.drain(..) {
        shooter.observe(&event);
        match event {
            Event::ConfigurationRejected { error } => {
                bail!("session rejected its configuration: {error}");
            }
            Event::PhaseChanged { phase, .. } => info!(?phase, "phase changed"),
            Event::CountdownStep { step } => info!(step = step.label(), "countdown"),
            Event::TargetResolved { target, resolution } => {
                debug!(target_id = target.get(), ?resolution, "target resolved");
            }
            Event::ComboChanged {
                combo_count,
                intensity,
            } if combo_count > 1 => debug!(combo_count, intensity, "combo"),
            Event::EndReport { result, stats } => report = Some((result, stats)),
            _ => {}
        }
    }
    Ok(report)
}

fn print_report(round: u32, result: &GradeResult, stats: &MatchStats) {
    if stats.total_targets == 0 {
        warn!(round, "match ended without spawning a target");
    }
    println!(
        "match {round}: grade {} | score {} | accuracy {:.1}% ({}/{}) | weak points {} | best combo {}",
        result.grade.label(),
        result.final_score,
        result.accuracy_percent,
        stats.targets_hit,
        stats.total_targets,
        stats.weak_points_hit,
        stats.max_combo,
    );
}
