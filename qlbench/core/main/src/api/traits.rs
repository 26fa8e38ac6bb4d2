//! Device runtime trait

use crate::api::error::TensorResult;
use crate::api::types::Device;

/// Host-side handle on the runtime that executes tensor work.
///
/// Kernels may run asynchronously with respect to the caller; timing code
/// brackets measured regions with [`synchronize`](DeviceRuntime::synchronize)
/// so that wall-clock time reflects completed work rather than queued work.
pub trait DeviceRuntime {
    /// Device this runtime dispatches to.
    fn device(&self) -> Device;

    /// Block until every previously dispatched piece of work has completed.
    fn synchronize(&self) -> TensorResult<()>;

    /// Open a profiler capture range.
    fn profiler_start(&self) -> TensorResult<()>;

    /// Close the profiler capture range opened by `profiler_start`.
    fn profiler_stop(&self) -> TensorResult<()>;
}
