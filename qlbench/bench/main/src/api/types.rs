//! Sweep configuration, options and results

use crate::api::error::{BenchError, BenchResult};
use qlbench_core::DType;
use std::fmt;

/// One point of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentConfig {
    /// Position in sweep order, starting at 0.
    pub index: usize,
    /// Input columns kept in full precision by the int4 layer.
    pub fp_features: usize,
    pub in_features: usize,
    pub out_features: usize,
    pub dtype: DType,
}

/// Layer variant timed for each configuration, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Int4,
    Int8,
    Fp16,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Int4, Variant::Int8, Variant::Fp16];

    /// Report label. The baseline reads `FP16` whatever its dtype.
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Int4 => "Int4",
            Variant::Int8 => "Int8",
            Variant::Fp16 => "FP16",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the generator is seeded across configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Seed once; every configuration continues the same stream.
    #[default]
    Shared,
    /// Reseed with `seed + config.index` before each configuration.
    PerConfig,
}

/// Knobs for a sweep.
#[derive(Debug, Clone)]
pub struct BenchOptions {
    /// Batch dimension of the input.
    pub input_size: usize,
    /// Bracket each timed loop with profiler start/stop.
    pub profile: bool,
    /// Timed trials per variant.
    pub repeats: usize,
    /// Untimed forwards before each trial.
    pub warmup_steps: usize,
    /// Timed forwards per trial.
    pub bench_steps: usize,
    pub seed: u64,
    pub seed_policy: SeedPolicy,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            input_size: 2048,
            profile: false,
            repeats: 10,
            warmup_steps: 10,
            bench_steps: 100,
            seed: 0,
            seed_policy: SeedPolicy::Shared,
        }
    }
}

impl BenchOptions {
    pub fn validate(&self) -> BenchResult<()> {
        if self.input_size == 0 {
            return Err(BenchError::InvalidConfig("input_size must be > 0".into()));
        }
        if self.repeats == 0 {
            return Err(BenchError::InvalidConfig("repeats must be > 0".into()));
        }
        if self.bench_steps == 0 {
            return Err(BenchError::InvalidConfig("bench_steps must be > 0".into()));
        }
        Ok(())
    }
}

/// Latency samples of one variant and their summary.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialStats {
    /// Milliseconds per forward, one per trial.
    pub samples: Vec<f64>,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Half-width of the 95% interval, `1.96 * std`.
    pub ci: f64,
}

/// Everything measured for one configuration.
#[derive(Debug, Clone)]
pub struct ConfigReport {
    pub config: ExperimentConfig,
    /// One entry per variant, in [`Variant::ALL`] order.
    pub results: Vec<(Variant, TrialStats)>,
}

impl ConfigReport {
    pub fn stats(&self, variant: Variant) -> Option<&TrialStats> {
        self.results.iter().find(|(v, _)| *v == variant).map(|(_, s)| s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_and_order() {
        let labels: Vec<&str> = Variant::ALL.iter().map(Variant::label).collect();
        assert_eq!(labels, ["Int4", "Int8", "FP16"]);
    }

    #[test]
    fn test_default_options() {
        let opts = BenchOptions::default();
        assert_eq!(opts.input_size, 2048);
        assert_eq!((opts.repeats, opts.warmup_steps, opts.bench_steps), (10, 10, 100));
        assert!(!opts.profile);
        assert_eq!(opts.seed_policy, SeedPolicy::Shared);
        opts.validate().unwrap();
    }

    #[test]
    fn test_options_validate() {
        let opts = BenchOptions { bench_steps: 0, ..BenchOptions::default() };
        assert!(matches!(opts.validate(), Err(BenchError::InvalidConfig(_))));
        let opts = BenchOptions { input_size: 0, ..BenchOptions::default() };
        assert!(opts.validate().is_err());
    }
}
