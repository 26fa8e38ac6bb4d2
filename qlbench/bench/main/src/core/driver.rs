//! Sweep driver: build each configuration's layers, time them, report.

use crate::api::error::BenchResult;
use crate::api::types::{BenchOptions, ConfigReport, ExperimentConfig, SeedPolicy, Variant};
use crate::core::grid::SweepGrid;
use crate::core::report::{header_line, time_line};
use crate::core::stats::summarize;
use crate::core::timer::run_trials;
use qlbench_core::{DeviceRuntime, Generator, Tensor};
use qlbench_qlinear::{Linear, MixedQLinear, Module};
use std::io::Write;
use std::time::Instant;

/// Weight values are drawn from `[WEIGHT_LOW, WEIGHT_HIGH)`.
const WEIGHT_LOW: i64 = -8;
const WEIGHT_HIGH: i64 = 7;

/// Layers and input for one configuration.
#[derive(Debug)]
pub struct PreparedConfig {
    /// `[input_size, in_features]` in the configuration dtype.
    pub input: Tensor,
    pub baseline: Linear,
    pub int4: MixedQLinear,
    pub int8: MixedQLinear,
}

impl PreparedConfig {
    /// The layer timed for `variant`.
    pub fn module(&self, variant: Variant) -> &dyn Module {
        match variant {
            Variant::Int4 => &self.int4,
            Variant::Int8 => &self.int8,
            Variant::Fp16 => &self.baseline,
        }
    }
}

/// Runs a [`SweepGrid`] against a device runtime.
pub struct Benchmark<'a> {
    grid: SweepGrid,
    opts: BenchOptions,
    runtime: &'a dyn DeviceRuntime,
}

impl<'a> Benchmark<'a> {
    pub fn new(grid: SweepGrid, opts: BenchOptions, runtime: &'a dyn DeviceRuntime) -> Self {
        Self { grid, opts, runtime }
    }

    pub fn grid(&self) -> &SweepGrid {
        &self.grid
    }

    pub fn options(&self) -> &BenchOptions {
        &self.opts
    }

    /// Run every configuration in sweep order, writing the report to `out`.
    ///
    /// Stops at the first failing configuration.
    pub fn run<W: Write>(&self, out: &mut W) -> BenchResult<Vec<ConfigReport>> {
        self.grid.validate()?;
        self.opts.validate()?;

        let start = Instant::now();
        let mut gen = Generator::manual_seed(self.opts.seed);
        let configs = self.grid.configurations();
        let mut reports = Vec::with_capacity(configs.len());
        for config in &configs {
            if self.opts.seed_policy == SeedPolicy::PerConfig {
                gen.reseed(self.opts.seed.wrapping_add(config.index as u64));
            }
            reports.push(self.run_config(config, &mut gen, out)?);
        }

        log::info!("[bench] {} configurations in {:.1}s", configs.len(), start.elapsed().as_secs_f64());
        Ok(reports)
    }

    /// Draw the input and build the three layers of `config` from `gen`.
    ///
    /// Draw order: input, baseline init, baseline weights, retained columns.
    pub fn prepare(&self, config: &ExperimentConfig, gen: &mut Generator) -> BenchResult<PreparedConfig> {
        let dtype = config.dtype;
        let (d_in, d_out) = (config.in_features, config.out_features);

        let input = Tensor::rand(vec![self.opts.input_size, d_in], gen).to_dtype(dtype)?;

        let mut baseline = Linear::new(d_in, d_out, false, dtype, gen)?;
        let weight = Tensor::randint(vec![d_out, d_in], WEIGHT_LOW, WEIGHT_HIGH, dtype, gen)?;
        baseline.set_weight(&weight)?;

        let mut fp_indices = gen.randperm(d_in);
        fp_indices.truncate(config.fp_features);
        let weight_scale = Tensor::ones(vec![d_out, 1]).to_dtype(dtype)?;

        let int4 = MixedQLinear::from_float(
            &baseline,
            baseline.weight(),
            &weight_scale,
            None,
            Some(&fp_indices),
            4,
        )?;
        let int8 = MixedQLinear::from_float(&baseline, baseline.weight(), &weight_scale, None, None, 8)?;

        Ok(PreparedConfig { input, baseline, int4, int8 })
    }

    fn run_config<W: Write>(
        &self,
        config: &ExperimentConfig,
        gen: &mut Generator,
        out: &mut W,
    ) -> BenchResult<ConfigReport> {
        log::info!(
            "[bench] config {}/{}: {} [{}, {}] fp_features={} input_size={}",
            config.index + 1,
            self.grid.len(),
            config.dtype,
            config.out_features,
            config.in_features,
            config.fp_features,
            self.opts.input_size
        );

        let prepared = self.prepare(config, gen)?;
        writeln!(out, "{}", header_line(config))?;

        let mut results = Vec::with_capacity(Variant::ALL.len());
        for variant in Variant::ALL {
            let samples = run_trials(prepared.module(variant), &prepared.input, self.runtime, &self.opts)?;
            let stats = summarize(samples);
            writeln!(out, "{}", time_line(variant, &stats))?;
            results.push((variant, stats));
        }
        out.flush()?;

        Ok(ConfigReport { config: *config, results })
    }
}
