//! Activation split cache shared between sibling layers.

use crate::api::error::QLinearResult;
use crate::api::types::Bits;
use qlbench_core::Tensor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Input rows split into quantized integer columns and f32 retained columns.
#[derive(Debug)]
pub(crate) struct SplitInput {
    /// Quantized integer columns, `rows * padded_k`, zero-padded per row.
    pub(crate) q: Vec<i8>,
    /// One activation scale per row.
    pub(crate) scales: Vec<f32>,
    /// Retained columns, `rows * n_fp`.
    pub(crate) fp: Vec<f32>,
}

#[derive(Debug)]
struct CacheEntry {
    // Holding the tensor keeps its storage alive, so the id cannot be reused.
    input: Tensor,
    bits: Bits,
    fp_indices: Vec<usize>,
    split: Arc<SplitInput>,
}

impl CacheEntry {
    fn matches(&self, x: &Tensor, bits: Bits, fp_indices: &[usize]) -> bool {
        self.input.storage_id() == x.storage_id()
            && self.input.shape() == x.shape()
            && self.input.dtype() == x.dtype()
            && self.bits == bits
            && self.fp_indices == fp_indices
    }
}

/// Hint passed to [`MixedQLinear::from_float`](crate::MixedQLinear::from_float)
/// for layers that consume the same input with the same column split.
///
/// Clones share one cache. The most recent split is kept, so siblings
/// evaluated back to back on one input quantize it only once.
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    entry: Arc<Mutex<Option<CacheEntry>>>,
    hits: Arc<AtomicUsize>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of forwards that reused a cached split.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub(crate) fn get_or_compute(
        &self,
        x: &Tensor,
        bits: Bits,
        fp_indices: &[usize],
        compute: impl FnOnce() -> QLinearResult<SplitInput>,
    ) -> QLinearResult<Arc<SplitInput>> {
        // Entries are replaced wholesale, so a poisoned lock is still usable.
        let mut guard = self.entry.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = guard.as_ref() {
            if entry.matches(x, bits, fp_indices) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&entry.split));
            }
        }

        let split = Arc::new(compute()?);
        *guard = Some(CacheEntry {
            input: x.clone(),
            bits,
            fp_indices: fp_indices.to_vec(),
            split: Arc::clone(&split),
        });
        Ok(split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy() -> QLinearResult<SplitInput> {
        Ok(SplitInput { q: vec![1; 32], scales: vec![1.0], fp: vec![] })
    }

    #[test]
    fn test_same_input_hits() {
        let shared = SharedInput::new();
        let x = Tensor::ones(vec![1, 8]);
        shared.get_or_compute(&x, Bits::Int4, &[1], dummy).unwrap();
        shared.get_or_compute(&x.clone(), Bits::Int4, &[1], || panic!("recomputed")).unwrap();
        assert_eq!(shared.hits(), 1);
    }

    #[test]
    fn test_different_key_misses() {
        let shared = SharedInput::new();
        let x = Tensor::ones(vec![1, 8]);
        let y = Tensor::ones(vec![1, 8]);
        shared.get_or_compute(&x, Bits::Int4, &[1], dummy).unwrap();
        shared.get_or_compute(&y, Bits::Int4, &[1], dummy).unwrap();
        shared.get_or_compute(&y, Bits::Int8, &[1], dummy).unwrap();
        shared.get_or_compute(&y, Bits::Int8, &[2], dummy).unwrap();
        assert_eq!(shared.hits(), 0);
    }

    #[test]
    fn test_clones_share_cache() {
        let shared = SharedInput::new();
        let sibling = shared.clone();
        let x = Tensor::ones(vec![2, 8]);
        shared.get_or_compute(&x, Bits::Int8, &[], dummy).unwrap();
        sibling.get_or_compute(&x, Bits::Int8, &[], dummy).unwrap();
        assert_eq!(shared.hits(), 1);
        assert_eq!(sibling.hits(), 1);
    }
}
