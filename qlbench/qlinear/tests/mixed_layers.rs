//! Integration tests for the layer factory as the benchmark drives it.

use qlbench_core::{DType, Generator, Tensor};
use qlbench_qlinear::simd;
use qlbench_qlinear::{Bits, Linear, MixedQLinear, Module, QLinearError};

fn build(
    in_features: usize,
    out_features: usize,
    fp_features: usize,
    dtype: DType,
    gen: &mut Generator,
) -> (Linear, MixedQLinear, MixedQLinear) {
    let mut reference = Linear::new(in_features, out_features, false, dtype, gen).unwrap();
    let weight = Tensor::randint(vec![out_features, in_features], -8, 7, dtype, gen).unwrap();
    reference.set_weight(&weight).unwrap();
    let scale = Tensor::ones(vec![out_features, 1]);

    let fp_indices: Vec<usize> = gen.randperm(in_features).into_iter().take(fp_features).collect();
    let int4 = MixedQLinear::from_float(&reference, reference.weight(), &scale, None, Some(&fp_indices), 4)
        .unwrap();
    let int8 = MixedQLinear::from_float(&reference, reference.weight(), &scale, None, None, 8).unwrap();
    (reference, int4, int8)
}

#[test]
fn variants_agree_on_output_shape_and_dtype() {
    let mut gen = Generator::manual_seed(0);
    for dtype in [DType::F16, DType::BF16] {
        let (reference, int4, int8) = build(128, 48, 16, dtype, &mut gen);
        let x = Tensor::rand(vec![8, 128], &mut gen).to_dtype(dtype).unwrap();

        let layers: [&dyn Module; 3] = [&int4, &int8, &reference];
        for layer in layers {
            let y = layer.forward(&x).unwrap();
            assert_eq!(y.shape(), &[8, 48], "{}", layer.name());
            assert_eq!(y.dtype(), dtype, "{}", layer.name());
        }
        assert_eq!(int4.bits(), Bits::Int4);
        assert_eq!(int4.fp_indices().len(), 16);
        assert_eq!(int8.bits(), Bits::Int8);
        assert!(int8.fp_indices().is_empty());
    }
}

#[test]
fn quantized_output_tracks_reference() {
    let mut gen = Generator::manual_seed(11);
    let (reference, int4, int8) = build(256, 32, 64, DType::F32, &mut gen);
    let x = Tensor::rand(vec![4, 256], &mut gen);

    let expected = reference.forward(&x).unwrap().to_vec();
    let norm = expected.iter().map(|v| v * v).sum::<f32>().sqrt();
    for layer in [&int4, &int8] {
        let got = layer.forward(&x).unwrap().to_vec();
        let err = got.iter().zip(&expected).map(|(a, b)| (a - b).powi(2)).sum::<f32>().sqrt();
        // int4 activations are coarse; only gross breakage should fail here
        assert!(err / norm < 0.25, "{} relative error {}", layer.name(), err / norm);
    }
}

#[test]
fn fp_features_equal_to_input_dim_is_rejected() {
    let mut gen = Generator::manual_seed(0);
    let reference = Linear::new(32, 4, false, DType::F16, &mut gen).unwrap();
    let scale = Tensor::ones(vec![4, 1]);
    let all: Vec<usize> = gen.randperm(32);
    let err = MixedQLinear::from_float(&reference, reference.weight(), &scale, None, Some(&all), 4);
    assert!(matches!(err, Err(QLinearError::InvalidIndices(_))));
}

#[test]
fn simd_dispatch_matches_scalar_reference() {
    let mut gen = Generator::manual_seed(9);
    for _ in 0..64 {
        let packed: Vec<u8> = (0..16).map(|_| gen.randint(0, 256) as u8).collect();
        let act: Vec<i8> = (0..32).map(|_| gen.randint(-127, 128) as i8).collect();
        assert_eq!(simd::dot_i4_i8_block(&packed, &act), simd::dot_i4_i8_block_scalar_ref(&packed, &act));

        let weight: Vec<i8> = (0..32).map(|_| gen.randint(-128, 128) as i8).collect();
        assert_eq!(simd::dot_i8_i8_block(&weight, &act), simd::dot_i8_i8_block_scalar_ref(&weight, &act));
    }
}
