//! Mixed-precision linear layer: int4/int8 weights with optional f32 columns.

use crate::api::error::{QLinearError, QLinearResult};
use crate::api::traits::Module;
use crate::api::types::{Bits, BLOCK_SIZE, SMALL_M, TILE_N};
use crate::core::linear::Linear;
use crate::core::pack;
use crate::core::shared::{SharedInput, SplitInput};
use qlbench_core::Tensor;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Linear layer whose weight is quantized per output row, except for a set
/// of input columns kept in full precision.
///
/// Built with [`MixedQLinear::from_float`]. Forward quantizes each input row
/// symmetrically to the same bit range, runs integer block dot products over
/// the quantized columns and adds the f32 dot product over the retained ones.
#[derive(Debug, Clone)]
pub struct MixedQLinear {
    in_features: usize,
    out_features: usize,
    bits: Bits,
    /// Quantized input columns, ascending.
    int_indices: Vec<usize>,
    /// Retained input columns, in the order given at construction.
    fp_indices: Vec<usize>,
    /// `out_features * row_bytes` packed weight bytes.
    packed: Vec<u8>,
    row_bytes: usize,
    weight_scale: Vec<f32>,
    /// `[out_features, fp_indices.len()]`
    fp_weight: Vec<f32>,
    bias: Option<Vec<f32>>,
    shared_input: Option<SharedInput>,
}

impl MixedQLinear {
    /// Derive a quantized layer from `reference`.
    ///
    /// `weight` is `[out, in]` and replaces the reference values; `weight_scale`
    /// is one scale per output row, shaped `[out, 1]` or `[out]`. Columns in
    /// `fp_indices` stay in f32. `bits` must be 4 or 8.
    pub fn from_float(
        reference: &Linear,
        weight: &Tensor,
        weight_scale: &Tensor,
        shared_input: Option<SharedInput>,
        fp_indices: Option<&[usize]>,
        bits: u32,
    ) -> QLinearResult<Self> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };
        let bits = Bits::try_from(bits)?;
        let in_features = reference.in_features;
        let out_features = reference.out_features;
        if in_features == 0 || out_features == 0 {
            return Err(QLinearError::InvalidConfig(format!(
                "layer dims must be non-zero, got [{}, {}]",
                out_features, in_features
            )));
        }

        if weight.shape() != [out_features, in_features] {
            return Err(QLinearError::ShapeMismatch(format!(
                "weight shape {:?} doesn't match layer [{}, {}]",
                weight.shape(),
                out_features,
                in_features
            )));
        }

        let scale_shape = weight_scale.shape();
        if scale_shape != [out_features, 1] && scale_shape != [out_features] {
            return Err(QLinearError::ShapeMismatch(format!(
                "weight_scale shape {:?}, expected [{}, 1] or [{}]",
                scale_shape, out_features, out_features
            )));
        }

        let fp_indices = fp_indices.map(<[usize]>::to_vec).unwrap_or_default();
        let is_fp = validate_fp_indices(&fp_indices, in_features)?;
        let int_indices: Vec<usize> = (0..in_features).filter(|&i| !is_fp[i]).collect();
        let n_int = int_indices.len();
        let n_fp = fp_indices.len();

        let values = weight.to_f32_values();
        let weight_scale = weight_scale.to_vec();

        let mut int_weight = Vec::with_capacity(out_features * n_int);
        let mut fp_weight = Vec::with_capacity(out_features * n_fp);
        for row in values.chunks_exact(in_features) {
            int_weight.extend(int_indices.iter().map(|&i| row[i]));
            fp_weight.extend(fp_indices.iter().map(|&i| row[i]));
        }

        let packed = pack::quantize_weight_rows(&int_weight, out_features, n_int, &weight_scale, bits);
        let row_bytes = pack::row_bytes(n_int, bits);
        let bias = reference.bias.as_ref().map(Tensor::to_vec);

        if let Some(t) = _t {
            log::trace!("[perf] qlinear::from_float {} [{}x{}] fp={} {:.3}ms",
                bits, out_features, in_features, n_fp, t.elapsed().as_secs_f64() * 1000.0);
        }

        Ok(Self {
            in_features,
            out_features,
            bits,
            int_indices,
            fp_indices,
            packed,
            row_bytes,
            weight_scale,
            fp_weight,
            bias,
            shared_input,
        })
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn bits(&self) -> Bits {
        self.bits
    }

    pub fn fp_indices(&self) -> &[usize] {
        &self.fp_indices
    }

    pub fn int_indices(&self) -> &[usize] {
        &self.int_indices
    }

    /// Bytes held by the packed integer weight.
    pub fn packed_bytes(&self) -> usize {
        self.packed.len()
    }

    /// Reconstruct the effective `[out, in]` F32 weight.
    pub fn dequantized_weight(&self) -> QLinearResult<Tensor> {
        let n_int = self.int_indices.len();
        let n_fp = self.fp_indices.len();
        let int_part = pack::dequantize_weight_rows(
            &self.packed,
            self.out_features,
            n_int,
            &self.weight_scale,
            self.bits,
        );

        let mut full = vec![0.0f32; self.out_features * self.in_features];
        for (r, row) in full.chunks_exact_mut(self.in_features).enumerate() {
            for (j, &col) in self.int_indices.iter().enumerate() {
                row[col] = int_part[r * n_int + j];
            }
            for (j, &col) in self.fp_indices.iter().enumerate() {
                row[col] = self.fp_weight[r * n_fp + j];
            }
        }
        Ok(Tensor::from_vec(full, vec![self.out_features, self.in_features])?)
    }

    fn padded_k(&self) -> usize {
        pack::blocks_for(self.int_indices.len()) * BLOCK_SIZE
    }

    /// Split `m` input rows into quantized integer columns and f32 retained columns.
    fn split_input(&self, x: &Tensor, m: usize) -> SplitInput {
        let values = x.to_f32_values();
        let padded_k = self.padded_k();
        let n_fp = self.fp_indices.len();
        let bits = self.bits;

        let mut q = vec![0i8; m * padded_k];
        let mut scales = vec![0.0f32; m];
        q.par_chunks_mut(padded_k)
            .zip(scales.par_iter_mut())
            .zip(values.par_chunks(self.in_features))
            .for_each(|((q_row, scale), x_row)| {
                *scale = if n_fp == 0 {
                    pack::quantize_activation_row(x_row, q_row, bits)
                } else {
                    let gathered: Vec<f32> = self.int_indices.iter().map(|&i| x_row[i]).collect();
                    pack::quantize_activation_row(&gathered, q_row, bits)
                };
            });

        let mut fp = vec![0.0f32; m * n_fp];
        if n_fp > 0 {
            fp.par_chunks_mut(n_fp)
                .zip(values.par_chunks(self.in_features))
                .for_each(|(fp_row, x_row)| {
                    for (dst, &i) in fp_row.iter_mut().zip(&self.fp_indices) {
                        *dst = x_row[i];
                    }
                });
        }

        SplitInput { q, scales, fp }
    }

    /// Output value for input row `r` and output column `c`.
    #[inline]
    fn output_at(&self, split: &SplitInput, r: usize, c: usize) -> f32 {
        let padded_k = self.padded_k();
        let act = &split.q[r * padded_k..(r + 1) * padded_k];
        let w = &self.packed[c * self.row_bytes..(c + 1) * self.row_bytes];
        let int_dot = pack::dot_row(w, act, self.bits);
        let mut acc = int_dot as f32 * split.scales[r] * self.weight_scale[c];

        let n_fp = self.fp_indices.len();
        if n_fp > 0 {
            let x_fp = &split.fp[r * n_fp..(r + 1) * n_fp];
            let w_fp = &self.fp_weight[c * n_fp..(c + 1) * n_fp];
            acc += x_fp.iter().zip(w_fp).map(|(&a, &b)| a * b).sum::<f32>();
        }
        if let Some(ref bias) = self.bias {
            acc += bias[c];
        }
        acc
    }
}

/// Check retained columns and return a per-column membership mask.
fn validate_fp_indices(fp_indices: &[usize], in_features: usize) -> QLinearResult<Vec<bool>> {
    if fp_indices.len() >= in_features {
        return Err(QLinearError::InvalidIndices(format!(
            "{} retained columns leave no quantized columns out of {}",
            fp_indices.len(),
            in_features
        )));
    }
    let mut is_fp = vec![false; in_features];
    for &i in fp_indices {
        if i >= in_features {
            return Err(QLinearError::InvalidIndices(format!(
                "column {} out of range for in_features {}",
                i, in_features
            )));
        }
        if is_fp[i] {
            return Err(QLinearError::InvalidIndices(format!("column {} listed twice", i)));
        }
        is_fp[i] = true;
    }
    Ok(is_fp)
}

impl Module for MixedQLinear {
    fn forward(&self, x: &Tensor) -> QLinearResult<Tensor> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };
        let ndim = x.ndim();
        if ndim == 0 || x.shape()[ndim - 1] != self.in_features {
            return Err(QLinearError::ShapeMismatch(format!(
                "input shape {:?}, expected [..., {}]",
                x.shape(),
                self.in_features
            )));
        }
        let m = x.numel() / self.in_features;
        let n = self.out_features;

        let split = match self.shared_input {
            Some(ref shared) => shared.get_or_compute(x, self.bits, &self.fp_indices, || {
                Ok(self.split_input(x, m))
            })?,
            None => Arc::new(self.split_input(x, m)),
        };

        let mut output = vec![0.0f32; m * n];
        if m <= SMALL_M {
            // Small-M path: parallelize over output columns
            let col_chunk = (n / rayon::current_num_threads()).max(TILE_N);
            for (r, out_row) in output.chunks_exact_mut(n).enumerate() {
                out_row.par_chunks_mut(col_chunk)
                    .enumerate()
                    .for_each(|(chunk_idx, out_chunk)| {
                        let col_start = chunk_idx * col_chunk;
                        for (local_c, out_val) in out_chunk.iter_mut().enumerate() {
                            *out_val = self.output_at(&split, r, col_start + local_c);
                        }
                    });
            }
        } else {
            // Large-M path: parallelize over input rows
            output
                .par_chunks_mut(n)
                .enumerate()
                .for_each(|(r, out_row)| {
                    let mut col_idx = 0;
                    while col_idx < n {
                        let tile_end = (col_idx + TILE_N).min(n);
                        for c in col_idx..tile_end {
                            out_row[c] = self.output_at(&split, r, c);
                        }
                        col_idx = tile_end;
                    }
                });
        }

        let mut out_shape = x.shape().to_vec();
        out_shape[ndim - 1] = n;

        if let Some(t) = _t {
            log::trace!("[perf] qlinear::forward {} [{}x{}]x[{}x{}] fp={} {:.3}ms",
                self.bits, m, self.in_features, n, self.in_features,
                self.fp_indices.len(), t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(Tensor::from_f32(output, out_shape, x.dtype())?)
    }

    fn name(&self) -> String {
        format!(
            "{}[{}x{}, fp={}]",
            self.bits,
            self.out_features,
            self.in_features,
            self.fp_indices.len()
        )
    }
}
