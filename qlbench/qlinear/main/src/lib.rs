//! # qlbench QLinear
//!
//! Mixed-precision linear layers for latency benchmarking.
//!
//! This crate provides:
//! - The `Module` trait every benchmarked layer implements
//! - `Linear`, the floating-point reference layer
//! - `MixedQLinear::from_float`, which derives an int4 or int8 layer from a
//!   reference weight, optionally keeping a subset of input columns in full
//!   precision
//! - `SharedInput`, a hint that lets sibling layers reuse one activation split
//!
//! ## Example
//!
//! ```rust,no_run
//! use qlbench_core::{DType, Generator, Tensor};
//! use qlbench_qlinear::{Linear, MixedQLinear, Module};
//!
//! let mut gen = Generator::manual_seed(0);
//! let reference = Linear::new(256, 128, false, DType::F16, &mut gen)?;
//! let scale = Tensor::ones(vec![128, 1]);
//! let int4 = MixedQLinear::from_float(&reference, reference.weight(), &scale, None, Some(&[0, 5]), 4)?;
//! let y = int4.forward(&Tensor::rand(vec![8, 256], &mut gen))?;
//! assert_eq!(y.shape(), &[8, 128]);
//! # Ok::<(), qlbench_qlinear::QLinearError>(())
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
