//! Error types for quantized linear layers

use qlbench_core::TensorError;
use thiserror::Error;

/// Result type for quantized linear layer operations
pub type QLinearResult<T> = Result<T, QLinearError>;

/// Errors that can occur while building or running a layer
#[derive(Error, Debug)]
pub enum QLinearError {
    #[error("Tensor error: {0}")]
    TensorError(#[from] TensorError),

    #[error("Unsupported bit-width {0}: expected 4 or 8")]
    InvalidBits(u32),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid full-precision indices: {0}")]
    InvalidIndices(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
