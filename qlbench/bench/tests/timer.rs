//! Timed-trial protocol against instrumented collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use qlbench_bench::{run_benchmark, run_trials, BenchOptions};
use qlbench_core::{Device, DeviceRuntime, Tensor, TensorError, TensorResult};
use qlbench_qlinear::{Module, QLinearError, QLinearResult};

/// Returns its input and counts calls.
#[derive(Default)]
struct CountingModule {
    calls: AtomicUsize,
}

impl Module for CountingModule {
    fn forward(&self, x: &Tensor) -> QLinearResult<Tensor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(x.clone())
    }

    fn name(&self) -> String {
        "counting".into()
    }
}

struct FailingModule;

impl Module for FailingModule {
    fn forward(&self, _x: &Tensor) -> QLinearResult<Tensor> {
        Err(QLinearError::ShapeMismatch("boom".into()))
    }

    fn name(&self) -> String {
        "failing".into()
    }
}

/// Records runtime calls in order.
#[derive(Default)]
struct RecordingRuntime {
    events: Mutex<Vec<&'static str>>,
}

impl RecordingRuntime {
    fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

impl DeviceRuntime for RecordingRuntime {
    fn device(&self) -> Device {
        Device::Cpu
    }

    fn synchronize(&self) -> TensorResult<()> {
        self.events.lock().unwrap().push("sync");
        Ok(())
    }

    fn profiler_start(&self) -> TensorResult<()> {
        self.events.lock().unwrap().push("start");
        Ok(())
    }

    fn profiler_stop(&self) -> TensorResult<()> {
        self.events.lock().unwrap().push("stop");
        Ok(())
    }
}

fn small_opts(profile: bool) -> BenchOptions {
    BenchOptions { warmup_steps: 3, bench_steps: 7, repeats: 4, profile, ..BenchOptions::default() }
}

#[test]
fn trial_runs_warmup_plus_timed_steps() {
    let module = CountingModule::default();
    let runtime = RecordingRuntime::default();
    let x = Tensor::ones(vec![2, 2]);

    let ms = run_benchmark(&module, &x, &runtime, &small_opts(false)).unwrap();
    assert!(ms >= 0.0);
    assert_eq!(module.calls.load(Ordering::SeqCst), 3 + 7);
    assert_eq!(runtime.events(), ["sync", "sync"]);
}

#[test]
fn profile_brackets_only_timed_loop() {
    let module = CountingModule::default();
    let runtime = RecordingRuntime::default();
    let x = Tensor::ones(vec![2, 2]);

    run_benchmark(&module, &x, &runtime, &small_opts(true)).unwrap();
    assert_eq!(runtime.events(), ["sync", "start", "sync", "stop"]);
}

#[test]
fn default_protocol_is_ten_trials_of_110_forwards() {
    let module = CountingModule::default();
    let runtime = RecordingRuntime::default();
    let x = Tensor::ones(vec![1, 1]);

    let samples = run_trials(&module, &x, &runtime, &BenchOptions::default()).unwrap();
    assert_eq!(samples.len(), 10);
    assert!(samples.iter().all(|&ms| ms >= 0.0));
    assert_eq!(module.calls.load(Ordering::SeqCst), 10 * (10 + 100));
    assert_eq!(runtime.events().len(), 10 * 2);
}

#[test]
fn forward_error_propagates() {
    let runtime = RecordingRuntime::default();
    let x = Tensor::ones(vec![1, 1]);
    assert!(run_benchmark(&FailingModule, &x, &runtime, &small_opts(false)).is_err());
}

#[test]
fn runtime_error_propagates() {
    struct BrokenRuntime;
    impl DeviceRuntime for BrokenRuntime {
        fn device(&self) -> Device {
            Device::Cpu
        }
        fn synchronize(&self) -> TensorResult<()> {
            Err(TensorError::Device("lost".into()))
        }
        fn profiler_start(&self) -> TensorResult<()> {
            Ok(())
        }
        fn profiler_stop(&self) -> TensorResult<()> {
            Ok(())
        }
    }

    let module = CountingModule::default();
    let x = Tensor::ones(vec![1, 1]);
    assert!(run_benchmark(&module, &x, &BrokenRuntime, &small_opts(false)).is_err());
}
