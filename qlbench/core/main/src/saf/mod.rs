//! Facade re-exports for qlbench-core

pub use crate::api::error::*;
pub use crate::api::traits::*;
pub use crate::api::types::*;
pub use crate::core::device::CpuRuntime;
pub use crate::core::random::Generator;
pub use crate::core::runtime::RuntimeConfig;
pub use crate::core::shape::Shape;
pub use crate::core::tensor::{f32_vec_to_bytes, Tensor};
