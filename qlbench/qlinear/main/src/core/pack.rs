//! Per-row symmetric quantization and block packing.

use crate::api::types::{Bits, BLOCK_SIZE};
use crate::core::simd;

/// Number of 32-column blocks covering `cols` columns.
pub(crate) fn blocks_for(cols: usize) -> usize {
    cols.div_ceil(BLOCK_SIZE)
}

/// Packed bytes per row for `cols` columns at `bits`.
pub(crate) fn row_bytes(cols: usize, bits: Bits) -> usize {
    blocks_for(cols) * bits.block_bytes()
}

fn quantize_value(v: f32, inv_scale: f32, bits: Bits) -> i8 {
    (v * inv_scale).round().clamp(bits.qmin() as f32, bits.qmax() as f32) as i8
}

/// Quantize a row-major `[rows, cols]` weight with one scale per row and pack
/// it into `rows * row_bytes(cols, bits)` bytes.
///
/// int8 rows store one `i8` per column. int4 rows store 16 bytes per block,
/// byte `j` holding element `j` (low nibble) and element `j + 16` (high
/// nibble), biased by 8. Padding columns quantize to zero.
pub(crate) fn quantize_weight_rows(
    weight: &[f32],
    rows: usize,
    cols: usize,
    scales: &[f32],
    bits: Bits,
) -> Vec<u8> {
    debug_assert_eq!(weight.len(), rows * cols);
    debug_assert_eq!(scales.len(), rows);

    let stride = row_bytes(cols, bits);
    let padded = blocks_for(cols) * BLOCK_SIZE;
    let mut packed = vec![0u8; rows * stride];
    let mut q_row = vec![0i8; padded];

    for (r, out) in packed.chunks_exact_mut(stride.max(1)).enumerate().take(rows) {
        let scale = scales[r];
        let inv_scale = if scale == 0.0 { 0.0 } else { 1.0 / scale };
        let src = &weight[r * cols..(r + 1) * cols];
        q_row.iter_mut().for_each(|q| *q = 0);
        for (q, &v) in q_row.iter_mut().zip(src) {
            *q = quantize_value(v, inv_scale, bits);
        }

        match bits {
            Bits::Int8 => {
                for (dst, &q) in out.iter_mut().zip(&q_row) {
                    *dst = q as u8;
                }
            }
            Bits::Int4 => {
                for (block, dst) in q_row.chunks_exact(BLOCK_SIZE).zip(out.chunks_exact_mut(16)) {
                    for j in 0..16 {
                        let lo = (block[j] + 8) as u8;
                        let hi = (block[j + 16] + 8) as u8;
                        dst[j] = (hi << 4) | (lo & 0x0F);
                    }
                }
            }
        }
    }

    packed
}

/// Inverse of [`quantize_weight_rows`], dropping padding columns.
pub(crate) fn dequantize_weight_rows(
    packed: &[u8],
    rows: usize,
    cols: usize,
    scales: &[f32],
    bits: Bits,
) -> Vec<f32> {
    let stride = row_bytes(cols, bits);
    let mut out = Vec::with_capacity(rows * cols);

    for r in 0..rows {
        let row = &packed[r * stride..(r + 1) * stride];
        let scale = scales[r];
        let values: Vec<i8> = match bits {
            Bits::Int8 => row.iter().map(|&b| b as i8).collect(),
            Bits::Int4 => row
                .chunks_exact(16)
                .flat_map(|block| {
                    let mut unpacked = [0i8; BLOCK_SIZE];
                    for j in 0..16 {
                        unpacked[j] = (block[j] & 0x0F) as i8 - 8;
                        unpacked[j + 16] = ((block[j] >> 4) & 0x0F) as i8 - 8;
                    }
                    unpacked
                })
                .collect(),
        };
        out.extend(values.iter().take(cols).map(|&q| q as f32 * scale));
    }

    out
}

/// Quantize one activation row symmetrically into `out` (length padded to a
/// block multiple) and return its scale.
///
/// Values are clamped to `[-qmax, qmax]` so the int8 kernels never see -128
/// on the activation side.
pub(crate) fn quantize_activation_row(input: &[f32], out: &mut [i8], bits: Bits) -> f32 {
    debug_assert!(out.len() >= input.len());
    let qmax = bits.qmax() as f32;
    let amax = input.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
    let scale = if amax == 0.0 { 0.0 } else { amax / qmax };
    let inv_scale = if scale == 0.0 { 0.0 } else { 1.0 / scale };

    for (q, &v) in out.iter_mut().zip(input) {
        *q = (v * inv_scale).round().clamp(-qmax, qmax) as i8;
    }
    out[input.len()..].iter_mut().for_each(|q| *q = 0);

    scale
}

/// Integer dot product of one packed weight row with one quantized activation row.
pub(crate) fn dot_row(packed_row: &[u8], act: &[i8], bits: Bits) -> i32 {
    match bits {
        Bits::Int4 => packed_row
            .chunks_exact(16)
            .zip(act.chunks_exact(BLOCK_SIZE))
            .map(|(w, a)| simd::dot_i4_i8_block(w, a))
            .sum(),
        Bits::Int8 => {
            let weight: &[i8] = bytemuck::cast_slice(packed_row);
            weight
                .chunks_exact(BLOCK_SIZE)
                .zip(act.chunks_exact(BLOCK_SIZE))
                .map(|(w, a)| simd::dot_i8_i8_block(w, a))
                .sum()
        }
    }
}
