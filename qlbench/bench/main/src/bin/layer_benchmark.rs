use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use qlbench_bench::{BenchOptions, Benchmark, SeedPolicy, SweepGrid};
use qlbench_core::{CpuRuntime, RuntimeConfig};

/// Time int4, int8 and FP linear layers over a sweep of shapes and dtypes.
#[derive(Parser)]
#[command(name = "layer-benchmark", version, about)]
struct Cli {
    /// Size of the input sequence (batch rows per forward).
    #[arg(long, default_value_t = 2048)]
    input_size: usize,

    /// Bracket each timed loop with profiler start/stop.
    #[arg(long)]
    profile: bool,

    /// Worker threads (0 = all cores).
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// JSON file overriding the built-in sweep grid.
    #[arg(long)]
    grid: Option<PathBuf>,

    /// Generator seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Reseed the generator before every configuration.
    #[arg(long)]
    seed_per_config: bool,

    /// Timed trials per layer variant.
    #[arg(long, default_value_t = 10)]
    repeats: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    RuntimeConfig::with_threads(cli.threads)
        .apply()
        .context("Failed to configure runtime")?;

    let grid = match &cli.grid {
        Some(path) => SweepGrid::load(path)
            .with_context(|| format!("Failed to load grid: {}", path.display()))?,
        None => SweepGrid::default(),
    };

    let opts = BenchOptions {
        input_size: cli.input_size,
        profile: cli.profile,
        repeats: cli.repeats,
        seed: cli.seed,
        seed_policy: if cli.seed_per_config { SeedPolicy::PerConfig } else { SeedPolicy::Shared },
        ..BenchOptions::default()
    };

    let runtime = CpuRuntime::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    Benchmark::new(grid, opts, &runtime)
        .run(&mut out)
        .context("Benchmark failed")?;
    out.flush()?;
    Ok(())
}
