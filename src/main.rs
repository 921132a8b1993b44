//! mesh2prod entry point
//!
//! Runs one level headless at the fixed timestep with a simple autopilot at
//! the controls and reports the final score.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use mesh2prod::consts::*;
use mesh2prod::sim::{EntityKind, Level, TickInput, tick};
use mesh2prod::{CloudSize, Settings, SpriteSheet, Viewport};

/// Ticks between autopilot shots
const FIRE_EVERY: u64 = 20;
/// Vertical error (world units) that maps to a full stick
const STEER_RANGE: f32 = 50.0;

/// Side-scrolling block-clearing arcade core, run headless.
#[derive(Debug, Parser)]
#[command(name = "mesh2prod", version)]
struct Args {
    /// Settings file (JSON). Defaults are used when not set.
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Sprite sheet description (JSON). Uses the stock sizes when not set.
    #[arg(long, value_name = "FILE")]
    sprites: Option<PathBuf>,

    /// Map seed; overrides the settings file.
    #[arg(long)]
    seed: Option<u64>,

    /// Run length: local, startup, corp or public.
    #[arg(short, long, value_parser = parse_cloud)]
    cloud: Option<CloudSize>,

    /// Give up after this many simulated seconds.
    #[arg(long, default_value = "600")]
    max_seconds: f32,

    /// Print the generated map before playing.
    #[arg(long)]
    dump_map: bool,
}

fn parse_cloud(s: &str) -> std::result::Result<CloudSize, String> {
    CloudSize::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = CloudSize::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown cloud size '{s}' (expected one of: {})", names.join(", "))
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(cloud) = args.cloud {
        settings.cloud = cloud;
    }

    let sheet = match &args.sprites {
        Some(path) => SpriteSheet::load(path)
            .with_context(|| format!("reading sprite sheet from {}", path.display()))?,
        None => SpriteSheet::builtin(),
    };

    let seed = args.seed.or(settings.seed).unwrap_or_else(rand::random);
    let mut level = Level::new(&settings, Viewport::default(), &sheet, seed)
        .context("building level")?;
    log::info!("mesh2prod starting: seed {seed}, cloud {}", settings.cloud.as_str());

    if args.dump_map {
        print!("{}", level.map.grid());
    }

    let max_ticks = (args.max_seconds / SIM_DT) as u64;
    while !level.is_ended() && level.time_ticks < max_ticks {
        let input = autopilot(&level);
        tick(&mut level, &input, SIM_DT)?;
        for (cue, volume) in level.sound_requests() {
            log::trace!("play {} at {volume:.2}", cue.file());
        }
    }

    match level.final_score() {
        Some(total) => println!(
            "Delivered to prod in {:.1}s: {} points (seed {seed})",
            level.time_ticks as f32 * SIM_DT,
            total
        ),
        None => println!(
            "Gave up after {:.1}s at {:.0}% progress: {} points (seed {seed})",
            level.time_ticks as f32 * SIM_DT,
            level.progress() * 100.0,
            level.score.total()
        ),
    }
    Ok(())
}

/// Chase the nearest block ahead and shoot whenever something is locked
fn autopilot(level: &Level) -> TickInput {
    let gun = level.map.gun();
    let width = level.viewport().play_width();
    let ahead = level
        .world
        .of_kind(EntityKind::Block)
        .filter(|b| b.pos.x > gun.x + TARGET_GAP_X && b.pos.x < width)
        .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x));

    let steer = match ahead {
        Some(block) => ((block.pos.y - gun.y) / STEER_RANGE).clamp(-1.0, 1.0),
        None => 0.0,
    };
    TickInput {
        steer,
        fire: level.map.lock().is_some() && level.time_ticks % FIRE_EVERY == 0,
    }
}
