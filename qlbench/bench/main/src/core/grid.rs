//! The configuration sweep.

use crate::api::error::{BenchError, BenchResult};
use crate::api::types::ExperimentConfig;
use qlbench_core::DType;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Lists whose cartesian product is the sweep.
///
/// Loadable from JSON; missing fields keep their defaults:
///
/// ```json
/// { "fp_features_nums": [256], "model_sizes": [[4096, 4096]], "dtypes": ["f16"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepGrid {
    /// Input columns the int4 layer keeps in full precision.
    pub fp_features_nums: Vec<usize>,
    /// `(in_features, out_features)` weight shapes.
    pub model_sizes: Vec<(usize, usize)>,
    pub dtypes: Vec<DType>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            fp_features_nums: vec![256, 512, 1024, 2048],
            model_sizes: vec![(4096, 4096), (8192, 8192), (4096, 11088)],
            dtypes: vec![DType::F16, DType::BF16],
        }
    }
}

impl SweepGrid {
    pub fn load<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let grid: SweepGrid = serde_json::from_reader(reader)?;
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.fp_features_nums.is_empty() {
            return Err(BenchError::InvalidConfig("fp_features_nums must not be empty".into()));
        }
        if self.model_sizes.is_empty() {
            return Err(BenchError::InvalidConfig("model_sizes must not be empty".into()));
        }
        if self.dtypes.is_empty() {
            return Err(BenchError::InvalidConfig("dtypes must not be empty".into()));
        }
        for &(d_in, d_out) in &self.model_sizes {
            if d_in == 0 || d_out == 0 {
                return Err(BenchError::InvalidConfig(format!(
                    "model size ({}, {}) must be non-zero",
                    d_in, d_out
                )));
            }
            for &fp in &self.fp_features_nums {
                if fp >= d_in {
                    return Err(BenchError::InvalidConfig(format!(
                        "fp_features {} must be less than in_features {}",
                        fp, d_in
                    )));
                }
            }
        }
        Ok(())
    }

    /// Every configuration, fp count outermost, then shape, then dtype.
    pub fn configurations(&self) -> Vec<ExperimentConfig> {
        let mut configs = Vec::with_capacity(self.len());
        for &fp_features in &self.fp_features_nums {
            for &(in_features, out_features) in &self.model_sizes {
                for &dtype in &self.dtypes {
                    configs.push(ExperimentConfig {
                        index: configs.len(),
                        fp_features,
                        in_features,
                        out_features,
                        dtype,
                    });
                }
            }
        }
        configs
    }

    /// Number of configurations.
    pub fn len(&self) -> usize {
        self.fp_features_nums.len() * self.model_sizes.len() * self.dtypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_has_24_configs() {
        let grid = SweepGrid::default();
        grid.validate().unwrap();
        let configs = grid.configurations();
        assert_eq!(configs.len(), 24);
        assert_eq!(grid.len(), 24);
        assert!(configs.iter().enumerate().all(|(i, c)| c.index == i));
    }

    #[test]
    fn test_order_is_fp_then_shape_then_dtype() {
        let configs = SweepGrid::default().configurations();
        let first: Vec<_> = configs[..3]
            .iter()
            .map(|c| (c.fp_features, c.in_features, c.out_features, c.dtype))
            .collect();
        assert_eq!(
            first,
            vec![
                (256, 4096, 4096, DType::F16),
                (256, 4096, 4096, DType::BF16),
                (256, 8192, 8192, DType::F16),
            ]
        );
        assert_eq!(configs[6].fp_features, 512);
        let last = configs[23];
        assert_eq!((last.fp_features, last.in_features, last.out_features, last.dtype),
            (2048, 4096, 11088, DType::BF16));
    }

    #[test]
    fn test_validate_rejects() {
        let grid = SweepGrid { dtypes: vec![], ..SweepGrid::default() };
        assert!(grid.validate().is_err());
        let grid = SweepGrid { model_sizes: vec![(128, 0)], ..SweepGrid::default() };
        assert!(grid.validate().is_err());
        let grid = SweepGrid { fp_features_nums: vec![300], model_sizes: vec![(256, 64)], ..SweepGrid::default() };
        assert!(matches!(grid.validate(), Err(BenchError::InvalidConfig(_))));
        // every input column retained leaves nothing to quantize
        let grid = SweepGrid { fp_features_nums: vec![64], model_sizes: vec![(64, 32)], ..SweepGrid::default() };
        assert!(matches!(grid.validate(), Err(BenchError::InvalidConfig(_))));
        let grid = SweepGrid { fp_features_nums: vec![63], model_sizes: vec![(64, 32)], ..SweepGrid::default() };
        grid.validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let grid: SweepGrid = serde_json::from_str(r#"{"dtypes": ["bfloat16"]}"#).unwrap();
        assert_eq!(grid.dtypes, vec![DType::BF16]);
        assert_eq!(grid.fp_features_nums, SweepGrid::default().fp_features_nums);
        assert!(serde_json::from_str::<SweepGrid>(r#"{"shapes": []}"#).is_err());
    }
}
