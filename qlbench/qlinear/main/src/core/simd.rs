//! SIMD integer dot-product kernels for packed int4/int8 weight blocks.
//!
//! Every kernel consumes one 32-column block and accumulates in i32.
//! Uses `std::arch` target-specific intrinsics with scalar fallbacks.
//!
//! Dispatch hierarchy:
//! - x86_64: AVX2 -> SSE2 -> scalar
//! - aarch64: NEON -> scalar
//! - Other: scalar fallback

/// Scalar int4 x i8 block dot product.
///
/// Byte `j` of `packed` holds element `j` in its low nibble and element
/// `j + 16` in its high nibble, both biased by 8.
fn dot_i4_i8_block_scalar(packed: &[u8], act: &[i8]) -> i32 {
    let mut sum = 0i32;
    for j in 0..16 {
        let lo = (packed[j] & 0x0F) as i32 - 8;
        let hi = ((packed[j] >> 4) & 0x0F) as i32 - 8;
        sum += lo * act[j] as i32;
        sum += hi * act[j + 16] as i32;
    }
    sum
}

/// Scalar i8 x i8 block dot product.
fn dot_i8_i8_block_scalar(weight: &[i8], act: &[i8]) -> i32 {
    weight[..32]
        .iter()
        .zip(&act[..32])
        .map(|(&w, &a)| w as i32 * a as i32)
        .sum()
}

// --- x86_64 SIMD implementations ---

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    #[target_feature(enable = "avx2")]
    unsafe fn hsum_epi32_avx2(v: __m256i) -> i32 {
        let hi128 = _mm256_extracti128_si256(v, 1);
        let lo128 = _mm256_castsi256_si128(v);
        let sum128 = _mm_add_epi32(lo128, hi128);
        let hi64 = _mm_srli_si128(sum128, 8);
        let sum64 = _mm_add_epi32(sum128, hi64);
        let hi32 = _mm_srli_si128(sum64, 4);
        let sum32 = _mm_add_epi32(sum64, hi32);
        _mm_cvtsi128_si32(sum32)
    }

    #[target_feature(enable = "sse2")]
    unsafe fn hsum_epi32_sse2(v: __m128i) -> i32 {
        let hi64 = _mm_srli_si128(v, 8);
        let sum64 = _mm_add_epi32(v, hi64);
        let hi32 = _mm_srli_si128(sum64, 4);
        let sum32 = _mm_add_epi32(sum64, hi32);
        _mm_cvtsi128_si32(sum32)
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn dot_i4_i8_block_avx2(packed: &[u8], act: &[i8]) -> i32 {
        let raw = _mm_loadu_si128(packed.as_ptr() as *const __m128i);
        let mask_0f = _mm_set1_epi8(0x0F);

        let lo = _mm_and_si128(raw, mask_0f);
        let hi = _mm_and_si128(_mm_srli_epi16(raw, 4), mask_0f);

        // Unsigned nibbles [0, 15] x signed activations, then remove the +8 bias.
        let nibbles = _mm256_set_m128i(hi, lo);
        let a = _mm256_loadu_si256(act.as_ptr() as *const __m256i);

        let ones_i16 = _mm256_set1_epi16(1);
        let biased = _mm256_madd_epi16(_mm256_maddubs_epi16(nibbles, a), ones_i16);

        let ones_u8 = _mm256_set1_epi8(1);
        let act_sum = _mm256_madd_epi16(_mm256_maddubs_epi16(ones_u8, a), ones_i16);

        hsum_epi32_avx2(biased) - 8 * hsum_epi32_avx2(act_sum)
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn dot_i8_i8_block_avx2(weight: &[i8], act: &[i8]) -> i32 {
        let w = _mm256_loadu_si256(weight.as_ptr() as *const __m256i);
        let a = _mm256_loadu_si256(act.as_ptr() as *const __m256i);

        // maddubs needs an unsigned lhs: move the weight sign onto the activation.
        let w_abs = _mm256_sign_epi8(w, w);
        let a_signed = _mm256_sign_epi8(a, w);

        let pairs = _mm256_maddubs_epi16(w_abs, a_signed);
        let quads = _mm256_madd_epi16(pairs, _mm256_set1_epi16(1));
        hsum_epi32_avx2(quads)
    }

    #[target_feature(enable = "sse2")]
    unsafe fn widen_dot_sse2(lhs: &[i8], rhs: &[i8]) -> i32 {
        let zero = _mm_setzero_si128();
        let mut acc = _mm_setzero_si128();

        for chunk in 0..4 {
            let base = chunk * 8;
            let l_raw = _mm_loadl_epi64(lhs.as_ptr().add(base) as *const __m128i);
            let l_i16 = _mm_unpacklo_epi8(l_raw, _mm_cmpgt_epi8(zero, l_raw));

            let r_raw = _mm_loadl_epi64(rhs.as_ptr().add(base) as *const __m128i);
            let r_i16 = _mm_unpacklo_epi8(r_raw, _mm_cmpgt_epi8(zero, r_raw));

            acc = _mm_add_epi32(acc, _mm_madd_epi16(l_i16, r_i16));
        }

        hsum_epi32_sse2(acc)
    }

    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn dot_i4_i8_block_sse2(packed: &[u8], act: &[i8]) -> i32 {
        let mut unpacked = [0i8; 32];
        for j in 0..16 {
            unpacked[j] = (packed[j] & 0x0F) as i8 - 8;
            unpacked[j + 16] = ((packed[j] >> 4) & 0x0F) as i8 - 8;
        }
        widen_dot_sse2(&unpacked, act)
    }

    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn dot_i8_i8_block_sse2(weight: &[i8], act: &[i8]) -> i32 {
        widen_dot_sse2(weight, act)
    }
}

// --- aarch64 SIMD implementations ---

#[cfg(target_arch = "aarch64")]
mod arm {
    use std::arch::aarch64::*;

    unsafe fn widen_dot_neon(l_lo: int8x16_t, l_hi: int8x16_t, act: &[i8]) -> i32 {
        let a_lo = vld1q_s8(act.as_ptr());
        let a_hi = vld1q_s8(act.as_ptr().add(16));

        let mut acc = vdupq_n_s32(0);
        acc = vpadalq_s16(acc, vmull_s8(vget_low_s8(l_lo), vget_low_s8(a_lo)));
        acc = vpadalq_s16(acc, vmull_s8(vget_high_s8(l_lo), vget_high_s8(a_lo)));
        acc = vpadalq_s16(acc, vmull_s8(vget_low_s8(l_hi), vget_low_s8(a_hi)));
        acc = vpadalq_s16(acc, vmull_s8(vget_high_s8(l_hi), vget_high_s8(a_hi)));

        vaddvq_s32(acc)
    }

    pub(super) unsafe fn dot_i4_i8_block_neon(packed: &[u8], act: &[i8]) -> i32 {
        let raw = vld1q_u8(packed.as_ptr());
        let mask_0f = vdupq_n_u8(0x0F);
        let offset_8 = vdupq_n_u8(8);

        let lo = vreinterpretq_s8_u8(vsubq_u8(vandq_u8(raw, mask_0f), offset_8));
        let hi = vreinterpretq_s8_u8(vsubq_u8(vshrq_n_u8(raw, 4), offset_8));

        widen_dot_neon(lo, hi, act)
    }

    pub(super) unsafe fn dot_i8_i8_block_neon(weight: &[i8], act: &[i8]) -> i32 {
        let w_lo = vld1q_s8(weight.as_ptr());
        let w_hi = vld1q_s8(weight.as_ptr().add(16));
        widen_dot_neon(w_lo, w_hi, act)
    }
}

// --- Public dispatch functions ---

/// Runtime-dispatched int4 x i8 dot product over one 32-column block.
pub fn dot_i4_i8_block(packed: &[u8], act: &[i8]) -> i32 {
    debug_assert!(packed.len() >= 16);
    debug_assert!(act.len() >= 32);

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { x86::dot_i4_i8_block_avx2(packed, act) };
        }
        unsafe { x86::dot_i4_i8_block_sse2(packed, act) }
    }

    #[cfg(target_arch = "aarch64")]
    {
        unsafe { arm::dot_i4_i8_block_neon(packed, act) }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        dot_i4_i8_block_scalar(packed, act)
    }
}

/// Runtime-dispatched i8 x i8 dot product over one 32-column block.
pub fn dot_i8_i8_block(weight: &[i8], act: &[i8]) -> i32 {
    debug_assert!(weight.len() >= 32);
    debug_assert!(act.len() >= 32);

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { x86::dot_i8_i8_block_avx2(weight, act) };
        }
        unsafe { x86::dot_i8_i8_block_sse2(weight, act) }
    }

    #[cfg(target_arch = "aarch64")]
    {
        unsafe { arm::dot_i8_i8_block_neon(weight, act) }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        dot_i8_i8_block_scalar(weight, act)
    }
}

/// Scalar-only int4 x i8 block dot product (for testing).
pub fn dot_i4_i8_block_scalar_ref(packed: &[u8], act: &[i8]) -> i32 {
    dot_i4_i8_block_scalar(packed, act)
}

/// Scalar-only i8 x i8 block dot product (for testing).
pub fn dot_i8_i8_block_scalar_ref(weight: &[i8], act: &[i8]) -> i32 {
    dot_i8_i8_block_scalar(weight, act)
}
