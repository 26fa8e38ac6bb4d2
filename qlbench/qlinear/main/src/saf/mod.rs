//! Facade re-exports for qlbench-qlinear

pub use crate::api::error::*;
pub use crate::api::traits::*;
pub use crate::api::types::*;
pub use crate::core::linear::Linear;
pub use crate::core::mixed::MixedQLinear;
pub use crate::core::shared::SharedInput;

pub mod simd {
    pub use crate::core::simd::*;
}
