//! Error types for tensor and device operations

use thiserror::Error;

/// Result type for tensor operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Errors that can occur in tensor and device operations
#[derive(Debug, Error)]
pub enum TensorError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },

    #[error("Matmul dimension mismatch: left inner dim {left}, right inner dim {right}")]
    MatmulDimensionMismatch { left: usize, right: usize },

    #[error("DType mismatch: expected {expected}, got {actual}")]
    DTypeMismatch { expected: String, actual: String },

    #[error("Unknown dtype: {0}")]
    UnknownDType(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Device error: {0}")]
    Device(String),
}
