//! CPU implementation of the device runtime.

use crate::api::error::{TensorError, TensorResult};
use crate::api::traits::DeviceRuntime;
use crate::api::types::Device;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Runtime for kernels dispatched onto the rayon global pool.
///
/// `synchronize` broadcasts an empty job to every worker and waits for all of
/// them, so it returns only once each worker has drained the work it picked
/// up before the barrier.
#[derive(Debug, Default)]
pub struct CpuRuntime {
    capture: Mutex<Option<Instant>>,
    captures: AtomicUsize,
}

impl CpuRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed profiler captures.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::Relaxed)
    }
}

impl DeviceRuntime for CpuRuntime {
    fn device(&self) -> Device {
        Device::Cpu
    }

    fn synchronize(&self) -> TensorResult<()> {
        let _ = rayon::broadcast(|_| ());
        Ok(())
    }

    fn profiler_start(&self) -> TensorResult<()> {
        let mut capture = self
            .capture
            .lock()
            .map_err(|e| TensorError::Device(format!("profiler lock poisoned: {}", e)))?;
        if capture.is_some() {
            return Err(TensorError::Device("profiler capture already running".into()));
        }
        *capture = Some(Instant::now());
        log::debug!("[profile] capture started");
        Ok(())
    }

    fn profiler_stop(&self) -> TensorResult<()> {
        let mut capture = self
            .capture
            .lock()
            .map_err(|e| TensorError::Device(format!("profiler lock poisoned: {}", e)))?;
        let started = capture
            .take()
            .ok_or_else(|| TensorError::Device("profiler stop without start".into()))?;
        let n = self.captures.fetch_add(1, Ordering::Relaxed) + 1;
        log::info!("[profile] capture #{} {:.3}ms", n, started.elapsed().as_secs_f64() * 1000.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synchronize() {
        let rt = CpuRuntime::new();
        assert_eq!(rt.device(), Device::Cpu);
        rt.synchronize().unwrap();
    }

    #[test]
    fn test_profiler_range() {
        let rt = CpuRuntime::new();
        rt.profiler_start().unwrap();
        assert!(rt.profiler_start().is_err());
        rt.profiler_stop().unwrap();
        assert_eq!(rt.capture_count(), 1);
    }

    #[test]
    fn test_profiler_stop_without_start() {
        let rt = CpuRuntime::new();
        assert!(matches!(rt.profiler_stop(), Err(TensorError::Device(_))));
        assert_eq!(rt.capture_count(), 0);
    }
}
