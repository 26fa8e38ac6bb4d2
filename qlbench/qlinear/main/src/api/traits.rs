//! Layer traits

use crate::api::error::QLinearResult;
use qlbench_core::Tensor;

/// A layer that maps `[..., in_features]` to `[..., out_features]`.
pub trait Module: Send + Sync {
    fn forward(&self, x: &Tensor) -> QLinearResult<Tensor>;

    /// Short label used in logs.
    fn name(&self) -> String;
}
