//! main.rs — Regatta simulator host
//!
//! Two ways to drive the core:
//!   1. Headless (default): fixed-step ticks as fast as possible, whole series
//!      back to back, results and standings printed as JSON lines
//!   2. Realtime (--realtime): wall-clock ticks on a tokio interval, control
//!      commands read from stdin as JSON lines ({"cmd": "turn", ...})
//!
//! stdout carries JSON only; logs go to stderr.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use regatta_sim::{SimConfig, Simulation};
use regatta_types::ControlCommand;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::interval;
use tracing::{info, warn};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "regatta-sim", about = "Small-boat sailing race simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Fixed RNG seed (overrides the config)
    #[arg(long)]
    seed: Option<u64>,
    /// Races in the series (overrides the config)
    #[arg(long)]
    races: Option<u32>,
    /// Laps per race (overrides the config)
    #[arg(long)]
    laps: Option<u32>,
    /// Drive ticks from the wall clock and accept commands on stdin
    #[arg(long)]
    realtime: bool,
    /// Tick length in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,
    /// Emit a snapshot every N ticks (0 = never)
    #[arg(long, default_value_t = 0)]
    telemetry_every: u64,
    /// Call results after this much race time regardless of who has finished
    #[arg(long)]
    max_race_seconds: Option<f64>,
    /// Realtime speed multiplier (1.0 = real-time)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regatta_sim=info".into()),
        )
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;

    info!(
        "⛵ Regatta simulator starting — {} boat(s), {} race(s), {} lap(s)",
        cfg.boat_count(),
        cfg.race.total_races,
        cfg.race.total_laps
    );

    let mut sim = Simulation::new(cfg).context("Invalid simulation config")?;
    emit(&json!({ "type": "course", "race": sim.race_index(), "data": sim.course().telemetry() }))?;

    if args.realtime {
        run_realtime(&mut sim, &args).await
    } else {
        run_headless(&mut sim, &args)
    }
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let raw = match std::fs::read_to_string(&args.config) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not read {} ({e}), using bundled config", args.config);
            include_str!("../config.toml").to_string()
        }
    };
    let mut cfg = SimConfig::from_toml(&raw).with_context(|| format!("Invalid config {}", args.config))?;

    if let Some(seed) = args.seed {
        cfg.race.seed = Some(seed);
    }
    if let Some(races) = args.races {
        cfg.race.total_races = races;
    }
    if let Some(laps) = args.laps {
        cfg.race.total_laps = laps;
    }
    if let Some(limit) = args.max_race_seconds {
        cfg.scoring.results_timeout_s = Some(match cfg.scoring.results_timeout_s {
            Some(existing) => existing.min(limit),
            None => limit,
        });
    }
    // humans never finish a headless race on their own
    if !args.realtime && cfg.race.human_boats > 0 && cfg.scoring.results_timeout_s.is_none() {
        warn!("Headless run with human boats and no results timeout, calling results at 600s");
        cfg.scoring.results_timeout_s = Some(600.0);
    }
    Ok(cfg)
}

// ── Headless series ───────────────────────────────────────────────────────────

fn run_headless(sim: &mut Simulation, args: &Args) -> Result<()> {
    let mut ticks: u64 = 0;
    loop {
        sim.tick(args.dt);
        ticks += 1;
        if args.telemetry_every > 0 && ticks % args.telemetry_every == 0 {
            emit(&json!({ "type": "tick", "data": sim.snapshot() }))?;
        }
        if !sim.is_concluded() {
            continue;
        }
        emit_results(sim)?;
        if !sim.next_race() {
            break;
        }
        emit(&json!({ "type": "course", "race": sim.race_index(), "data": sim.course().telemetry() }))?;
    }
    emit(&json!({ "type": "standings", "data": sim.standings() }))?;
    info!("🏆 Series complete after {ticks} ticks");
    Ok(())
}

// ── Realtime loop ─────────────────────────────────────────────────────────────

async fn run_realtime(sim: &mut Simulation, args: &Args) -> Result<()> {
    let mut ticker = interval(Duration::from_secs_f64(args.dt.max(0.001)));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut paused = false;
    let mut speed = args.speed;
    let mut last = Instant::now();
    let mut ticks: u64 = 0;
    let mut results_sent = false;

    info!("⚓ Realtime loop at {:.0} Hz", 1.0 / args.dt);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last).as_secs_f64();
                last = now;
                // paused ticks are skipped outright
                if paused { continue; }

                sim.tick(elapsed * speed);
                ticks += 1;
                if args.telemetry_every > 0 && ticks % args.telemetry_every == 0 {
                    emit(&json!({ "type": "tick", "data": sim.snapshot() }))?;
                }
                if sim.is_concluded() && !results_sent {
                    emit_results(sim)?;
                    results_sent = true;
                    if sim.is_series_complete() {
                        emit(&json!({ "type": "standings", "data": sim.standings() }))?;
                        info!("🏆 Series complete");
                        return Ok(());
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("stdin read failed")? {
                    Some(raw) => {
                        if raw.trim().is_empty() { continue; }
                        match ControlCommand::parse(&raw) {
                            Ok(ControlCommand::Pause) => { paused = true; info!("⏸ Paused"); }
                            Ok(ControlCommand::Resume) => { paused = false; info!("▶ Resumed"); }
                            Ok(ControlCommand::SetSpeed { speed: s }) => {
                                speed = s.clamp(0.1, 20.0);
                                info!("⚡ Speed set to {speed}×");
                            }
                            Ok(cmd) => {
                                if sim.apply(&cmd) && cmd == ControlCommand::NextRace {
                                    results_sent = false;
                                    emit(&json!({
                                        "type": "course",
                                        "race": sim.race_index(),
                                        "data": sim.course().telemetry(),
                                    }))?;
                                }
                            }
                            Err(e) => warn!("Unknown control command {raw:?}: {e}"),
                        }
                    }
                    None => {
                        stdin_open = false;
                        info!("stdin closed, running without commands");
                    }
                }
            }
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn emit_results(sim: &Simulation) -> Result<()> {
    emit(&json!({
        "type": "results",
        "race": sim.race_index(),
        "data": sim.last_results(),
        "standings": sim.standings(),
    }))
}

fn emit(value: &serde_json::Value) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}
