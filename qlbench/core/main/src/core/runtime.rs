/// Runtime configuration for parallelism and thread management.
/// Must be applied (via `apply()`) before any computation to take effect.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Number of threads for faer and rayon parallelism.
    /// 0 means auto-detect (use all available cores).
    pub num_threads: usize,
}

impl RuntimeConfig {
    pub fn with_threads(num_threads: usize) -> Self {
        Self { num_threads }
    }

    /// Apply this runtime configuration globally.
    ///
    /// Sets faer's global parallelism and optionally configures
    /// rayon's global thread pool. Must be called before any
    /// computation for settings to take effect.
    pub fn apply(&self) -> Result<(), crate::api::error::TensorError> {
        use faer::{set_global_parallelism, Parallelism};

        if self.num_threads == 0 {
            set_global_parallelism(Parallelism::Rayon(0));
        } else {
            set_global_parallelism(Parallelism::Rayon(self.num_threads));
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.num_threads)
                .build_global()
                .map_err(|e| crate::api::error::TensorError::Device(
                    format!("Failed to set rayon thread pool: {}", e)
                ))?;
        }

        log::info!("[runtime] SIMD: {}", Self::detect_simd());
        log::info!("[runtime] Rayon threads: {}", rayon::current_num_threads());

        Ok(())
    }

    /// Detect available SIMD instruction sets.
    pub fn detect_simd() -> &'static str {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return "AVX2";
            }
            if is_x86_feature_detected!("sse2") {
                return "SSE2";
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            return "NEON";
        }
        "scalar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.num_threads, 0);
        assert_eq!(RuntimeConfig::with_threads(4).num_threads, 4);
    }

    #[test]
    fn test_detect_simd() {
        let simd = RuntimeConfig::detect_simd();
        assert!(!simd.is_empty());
    }
}
