//! # qlbench Core
//!
//! Tensor storage and device plumbing shared by the qlbench crates.
//!
//! This crate provides:
//! - A byte-backed `Tensor` holding F32, F16 or BF16 elements
//! - A seeded `Generator` so a whole sweep draws from one reproducible stream
//! - The `DeviceRuntime` trait (synchronization barrier + profiler range) and
//!   its CPU implementation
//! - `RuntimeConfig` for thread-pool setup
//!
//! ## Example
//!
//! ```rust
//! use qlbench_core::{DType, Generator, Tensor};
//!
//! let mut gen = Generator::manual_seed(0);
//! let x = Tensor::rand(vec![4, 8], &mut gen).to_dtype(DType::F16).unwrap();
//! assert_eq!(x.shape(), &[4, 8]);
//! assert_eq!(x.dtype(), DType::F16);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
