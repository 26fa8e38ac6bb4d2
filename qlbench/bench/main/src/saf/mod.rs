//! Facade re-exports for qlbench-bench

pub use crate::api::error::*;
pub use crate::api::types::*;
pub use crate::core::driver::{Benchmark, PreparedConfig};
pub use crate::core::grid::SweepGrid;
pub use crate::core::report::{header_line, time_line};
pub use crate::core::stats::{summarize, Z_95};
pub use crate::core::timer::{run_benchmark, run_trials};
