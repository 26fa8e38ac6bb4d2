//! Floating-point reference linear layer.

use crate::api::error::{QLinearError, QLinearResult};
use crate::api::traits::Module;
use qlbench_core::{DType, Generator, Tensor};
use rand_distr::{Distribution, Normal};

/// A fully connected linear layer: y = xW^T + b
///
/// The weight is stored in the layer dtype and widened to f32 once, when it
/// is set. Forward computes in f32 and returns the input's dtype.
#[derive(Debug, Clone)]
pub struct Linear {
    /// Weight matrix [out_features, in_features]
    weight: Tensor,
    /// `weight` widened to F32; shares storage when `weight` is already F32.
    weight_f32: Tensor,
    /// Optional bias vector [out_features]
    pub bias: Option<Tensor>,
    pub in_features: usize,
    pub out_features: usize,
}

impl Linear {
    /// Create a layer with Xavier-normal weights drawn from `gen`.
    ///
    /// The bias, when enabled, starts at zero.
    pub fn new(
        in_features: usize,
        out_features: usize,
        bias: bool,
        dtype: DType,
        gen: &mut Generator,
    ) -> QLinearResult<Self> {
        if in_features == 0 || out_features == 0 {
            return Err(QLinearError::InvalidConfig(format!(
                "linear dims must be non-zero, got [{}, {}]",
                out_features, in_features
            )));
        }
        let std = (2.0 / (in_features + out_features) as f32).sqrt();
        let normal = Normal::new(0.0f32, std)
            .map_err(|e| QLinearError::InvalidConfig(format!("xavier init: {}", e)))?;
        let values: Vec<f32> = (0..in_features * out_features)
            .map(|_| normal.sample(gen.rng_mut()))
            .collect();

        let weight = Tensor::from_f32(values, vec![out_features, in_features], dtype)?;
        let bias = if bias {
            Some(Tensor::zeros(vec![out_features]).to_dtype(dtype)?)
        } else {
            None
        };

        let weight_f32 = weight.to_dtype(DType::F32)?;
        Ok(Self { weight, weight_f32, bias, in_features, out_features })
    }

    /// Create a linear layer from existing weights
    pub fn from_weights(weight: Tensor, bias: Option<Tensor>) -> QLinearResult<Self> {
        let shape = weight.shape();
        if shape.len() != 2 {
            return Err(QLinearError::InvalidConfig("Weight must be 2D".into()));
        }
        let out_features = shape[0];
        let in_features = shape[1];

        if let Some(ref b) = bias {
            if b.shape() != [out_features] {
                return Err(QLinearError::ShapeMismatch(format!(
                    "Bias shape {:?} doesn't match out_features {}",
                    b.shape(),
                    out_features
                )));
            }
        }

        let weight_f32 = weight.to_dtype(DType::F32)?;
        Ok(Self { weight, weight_f32, bias, in_features, out_features })
    }

    /// Weight in the layer dtype, `[out_features, in_features]`.
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// F32 copy of the weight used by `forward`.
    pub fn weight_f32(&self) -> &Tensor {
        &self.weight_f32
    }

    pub fn dtype(&self) -> DType {
        self.weight.dtype()
    }

    /// Replace the weight values, casting them to the layer dtype.
    pub fn set_weight(&mut self, weight: &Tensor) -> QLinearResult<()> {
        if weight.shape() != [self.out_features, self.in_features] {
            return Err(QLinearError::ShapeMismatch(format!(
                "weight shape {:?} doesn't match layer [{}, {}]",
                weight.shape(),
                self.out_features,
                self.in_features
            )));
        }
        self.weight = weight.to_dtype(self.dtype())?;
        self.weight_f32 = self.weight.to_dtype(DType::F32)?;
        Ok(())
    }
}

impl Module for Linear {
    /// Forward pass: y = xW^T + b
    ///
    /// Input shape: [..., in_features]
    /// Output shape: [..., out_features]
    fn forward(&self, x: &Tensor) -> QLinearResult<Tensor> {
        let output = x.matmul_t(&self.weight_f32)?;
        let Some(ref bias) = self.bias else {
            return Ok(output);
        };

        let bias = bias.to_f32_values();
        let mut values = output.to_vec();
        for row in values.chunks_exact_mut(self.out_features) {
            for (v, &b) in row.iter_mut().zip(bias.iter()) {
                *v += b;
            }
        }
        Ok(Tensor::from_f32(values, output.shape().to_vec(), x.dtype())?)
    }

    fn name(&self) -> String {
        format!("linear[{}x{}]", self.out_features, self.in_features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_forward_shape() {
        let mut gen = Generator::manual_seed(0);
        let linear = Linear::new(4, 8, false, DType::F32, &mut gen).unwrap();
        let x = Tensor::rand(vec![2, 3, 4], &mut gen);
        let y = linear.forward(&x).unwrap();
        assert_eq!(y.shape(), &[2, 3, 8]);
    }

    #[test]
    fn test_linear_with_bias() {
        let mut gen = Generator::manual_seed(0);
        assert!(Linear::new(4, 8, true, DType::F16, &mut gen).unwrap().bias.is_some());
        assert!(Linear::new(4, 8, false, DType::F16, &mut gen).unwrap().bias.is_none());
    }

    #[test]
    fn test_bias_is_added() {
        let weight = Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0], vec![2, 2]).unwrap();
        let bias = Tensor::from_vec(vec![10.0, 20.0], vec![2]).unwrap();
        let linear = Linear::from_weights(weight, Some(bias)).unwrap();
        let x = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]).unwrap();
        assert_eq!(linear.forward(&x).unwrap().to_vec(), vec![11.0, 22.0]);
    }

    #[test]
    fn test_init_is_seeded() {
        let mut a = Generator::manual_seed(5);
        let mut b = Generator::manual_seed(5);
        let la = Linear::new(16, 8, false, DType::BF16, &mut a).unwrap();
        let lb = Linear::new(16, 8, false, DType::BF16, &mut b).unwrap();
        assert_eq!(la.weight().to_vec(), lb.weight().to_vec());
        assert_eq!(la.dtype(), DType::BF16);
    }

    #[test]
    fn test_set_weight_casts_and_checks_shape() {
        let mut gen = Generator::manual_seed(0);
        let mut linear = Linear::new(4, 2, false, DType::F16, &mut gen).unwrap();
        let w = Tensor::randint(vec![2, 4], -8, 7, DType::F32, &mut gen).unwrap();
        linear.set_weight(&w).unwrap();
        assert_eq!(linear.weight().dtype(), DType::F16);
        assert_eq!(linear.weight().to_vec(), w.to_vec());

        let bad = Tensor::zeros(vec![4, 2]);
        assert!(matches!(linear.set_weight(&bad), Err(QLinearError::ShapeMismatch(_))));
    }

    #[test]
    fn test_forward_reuses_widened_weight() {
        let mut gen = Generator::manual_seed(0);
        let mut linear = Linear::new(64, 16, false, DType::F16, &mut gen).unwrap();
        let w = Tensor::randint(vec![16, 64], -8, 7, DType::F16, &mut gen).unwrap();
        linear.set_weight(&w).unwrap();
        assert_eq!(linear.weight_f32().dtype(), DType::F32);
        assert_eq!(linear.weight_f32().to_vec(), w.to_vec());

        let id = linear.weight_f32().storage_id();
        let x = Tensor::rand(vec![3, 64], &mut gen).to_dtype(DType::F16).unwrap();
        let first = linear.forward(&x).unwrap();
        let second = linear.forward(&x).unwrap();
        assert_eq!(linear.weight_f32().storage_id(), id);
        assert_eq!(first.to_vec(), second.to_vec());
        assert_eq!(first.dtype(), DType::F16);
    }

    #[test]
    fn test_f32_layer_shares_weight_storage() {
        let mut gen = Generator::manual_seed(0);
        let linear = Linear::new(8, 4, false, DType::F32, &mut gen).unwrap();
        assert_eq!(linear.weight().storage_id(), linear.weight_f32().storage_id());
    }

    #[test]
    fn test_from_weights_rejects_bad_bias() {
        let weight = Tensor::zeros(vec![3, 2]);
        let bias = Tensor::zeros(vec![2]);
        assert!(Linear::from_weights(weight, Some(bias)).is_err());
    }
}
