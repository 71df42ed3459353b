/*
 * Flocking Simulation Runner
 *
 * Headless driver for the flocking core: loads parameters (defaults, an
 * optional YAML file, then command-line overrides), runs a fixed number of
 * frames and logs flock statistics along the way.
 *
 * Set RUST_LOG=debug for parameter changes, RUST_LOG=info for progress.
 */

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use flocking_sim::{Flock, Regime, SimulationParams};

// 24 frames per second for 45 seconds
const DEFAULT_FRAMES: u64 = 24 * 45;

#[derive(Parser, Debug)]
#[command(about = "Self-propelled particle flocking in a periodic cube")]
struct Args {
    /// YAML parameter file; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = DEFAULT_FRAMES)]
    frames: u64,

    /// Seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Neighbor count override
    #[arg(short = 'k', long)]
    neighbors: Option<usize>,

    /// Noise magnitude override
    #[arg(short, long)]
    noise: Option<f32>,

    /// Run every step on the calling thread
    #[arg(long)]
    sequential: bool,

    /// Frames between progress reports
    #[arg(long, default_value_t = 24)]
    report_every: u64,
}

// load here to keep main clean
fn load_params(args: &Args) -> Result<SimulationParams> {
    let mut params = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open config {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_yaml::from_reader::<_, SimulationParams>(reader)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => SimulationParams::default(),
    };

    if args.seed.is_some() {
        params.seed = args.seed;
    }
    if let Some(k) = args.neighbors {
        params.neighbor_count = k;
    }
    if let Some(noise) = args.noise {
        params.noise = noise;
    }
    if args.sequential {
        params.enable_parallel = false;
    }
    params.start_running = true;

    Ok(params)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let params = load_params(&args)?;
    let mut flock = Flock::new(params).context("invalid simulation parameters")?;

    info!("{}", flock.status_text().replace('\n', " "));

    let report_every = args.report_every.max(1);
    for _ in 0..args.frames {
        flock.tick();

        let stats = flock.stats();
        if stats.frame % report_every == 0 {
            let counts = &stats.regime_counts;
            info!(
                "frame {:>5} | polarization {:.3} | hard-core {} soft {} constant {} none {} | {:?}",
                stats.frame,
                stats.polarization,
                counts.get(Regime::HardCore),
                counts.get(Regime::SoftRepulsion) + counts.get(Regime::SoftAttraction),
                counts.get(Regime::ConstantForce),
                counts.get(Regime::OutOfRange),
                stats.tick_time
            );
        }
    }

    let stats = flock.stats();
    println!(
        "Simulated {} frames of {} boids, final polarization {:.3}",
        stats.frame,
        flock.len(),
        stats.polarization
    );

    Ok(())
}
