//! # qlbench Bench
//!
//! Latency sweep over quantized linear layers.
//!
//! For every configuration of a [`SweepGrid`] the driver builds an FP
//! reference layer with integer-valued weights, derives an int4 layer (with a
//! random set of full-precision columns) and an int8 layer from it, then times
//! repeated forwards of all three on one shared input and prints the mean
//! latency with a 95% interval.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qlbench_bench::{BenchOptions, Benchmark, SweepGrid};
//! use qlbench_core::CpuRuntime;
//!
//! let runtime = CpuRuntime::new();
//! let bench = Benchmark::new(SweepGrid::default(), BenchOptions::default(), &runtime);
//! let reports = bench.run(&mut std::io::stdout())?;
//! assert_eq!(reports.len(), 24);
//! # Ok::<(), qlbench_bench::BenchError>(())
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
