//! Error types for the benchmark harness

use qlbench_core::TensorError;
use qlbench_qlinear::QLinearError;
use thiserror::Error;

/// Result type for benchmark operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Errors that abort a sweep
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Tensor error: {0}")]
    TensorError(#[from] TensorError),

    #[error("Layer error: {0}")]
    LayerError(#[from] QLinearError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Grid parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
