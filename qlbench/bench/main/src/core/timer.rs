//! One timed trial of a layer.

use crate::api::error::BenchResult;
use crate::api::types::BenchOptions;
use qlbench_core::{DeviceRuntime, Tensor};
use qlbench_qlinear::Module;
use std::hint::black_box;
use std::time::Instant;

/// Run `module` on `x` and return the mean latency per forward in ms.
///
/// `warmup_steps` untimed forwards come first. The clock then brackets a
/// synchronization barrier, `bench_steps` forwards and a second barrier.
/// With `profile` set, the profiler range covers only the timed forwards.
pub fn run_benchmark(
    module: &dyn Module,
    x: &Tensor,
    runtime: &dyn DeviceRuntime,
    opts: &BenchOptions,
) -> BenchResult<f64> {
    for _ in 0..opts.warmup_steps {
        black_box(module.forward(x)?);
    }

    let start = Instant::now();
    runtime.synchronize()?;
    if opts.profile {
        runtime.profiler_start()?;
    }
    for _ in 0..opts.bench_steps {
        black_box(module.forward(x)?);
    }
    runtime.synchronize()?;
    let elapsed = start.elapsed();
    if opts.profile {
        runtime.profiler_stop()?;
    }

    Ok(elapsed.as_secs_f64() * 1000.0 / opts.bench_steps.max(1) as f64)
}

/// Run [`run_benchmark`] `opts.repeats` times.
pub fn run_trials(
    module: &dyn Module,
    x: &Tensor,
    runtime: &dyn DeviceRuntime,
    opts: &BenchOptions,
) -> BenchResult<Vec<f64>> {
    (0..opts.repeats)
        .map(|trial| {
            let ms = run_benchmark(module, x, runtime, opts)?;
            log::debug!("[bench] {} trial {} {:.3}ms", module.name(), trial, ms);
            Ok(ms)
        })
        .collect()
}
