//! Byte-backed tensor with F32/F16/BF16 element storage.

use crate::api::error::{TensorError, TensorResult};
use crate::api::types::{DType, Device};
use crate::core::random::Generator;
use crate::core::shape::Shape;
use half::{bf16, f16};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Convert a Vec<f32> into its little-endian byte representation.
pub fn f32_vec_to_bytes(v: Vec<f32>) -> Vec<u8> {
    // try_cast_vec only succeeds when the allocator alignment matches; fall
    // back to a copy otherwise.
    match bytemuck::try_cast_vec::<f32, u8>(v) {
        Ok(bytes) => bytes,
        Err((_, original)) => bytemuck::cast_slice::<f32, u8>(&original).to_vec(),
    }
}

fn f16_vec_to_bytes(v: Vec<f16>) -> Vec<u8> {
    match bytemuck::try_cast_vec::<f16, u8>(v) {
        Ok(bytes) => bytes,
        Err((_, original)) => bytemuck::cast_slice::<f16, u8>(&original).to_vec(),
    }
}

fn bf16_vec_to_bytes(v: Vec<bf16>) -> Vec<u8> {
    match bytemuck::try_cast_vec::<bf16, u8>(v) {
        Ok(bytes) => bytes,
        Err((_, original)) => bytemuck::cast_slice::<bf16, u8>(&original).to_vec(),
    }
}

/// Encode f32 values as `dtype` bytes.
fn encode(values: Vec<f32>, dtype: DType) -> Vec<u8> {
    match dtype {
        DType::F32 => f32_vec_to_bytes(values),
        DType::F16 => f16_vec_to_bytes(values.iter().map(|&v| f16::from_f32(v)).collect()),
        DType::BF16 => bf16_vec_to_bytes(values.iter().map(|&v| bf16::from_f32(v)).collect()),
    }
}

/// Dense, contiguous, row-major tensor.
///
/// Storage is shared behind an `Arc`, so clones are cheap and two clones of
/// the same tensor report the same [`storage_id`](Tensor::storage_id).
#[derive(Clone)]
pub struct Tensor {
    pub(crate) data: Arc<Vec<u8>>,
    pub(crate) shape: Shape,
    pub(crate) dtype: DType,
    pub(crate) device: Device,
}

impl Tensor {
    /// Wrap raw bytes. The caller guarantees `data.len() == numel * dtype.size()`.
    pub fn new(data: Vec<u8>, shape: impl Into<Shape>, dtype: DType) -> Self {
        let shape: Shape = shape.into();
        debug_assert_eq!(data.len(), shape.iter().product::<usize>() * dtype.size());
        Self {
            data: Arc::new(data),
            shape,
            dtype,
            device: Device::Cpu,
        }
    }

    /// Create an F32 tensor from values, checking the element count.
    pub fn from_vec(data: Vec<f32>, shape: impl Into<Shape>) -> TensorResult<Self> {
        Self::from_f32(data, shape, DType::F32)
    }

    /// Create a tensor of `dtype` from f32 values, checking the element count.
    pub fn from_f32(data: Vec<f32>, shape: impl Into<Shape>, dtype: DType) -> TensorResult<Self> {
        let shape: Shape = shape.into();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected: vec![expected],
                actual: vec![data.len()],
            });
        }
        Ok(Self::new(encode(data, dtype), shape, dtype))
    }

    /// F32 tensor filled with zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        Self::full(shape, 0.0)
    }

    /// F32 tensor filled with ones.
    pub fn ones(shape: impl Into<Shape>) -> Self {
        Self::full(shape, 1.0)
    }

    /// F32 tensor filled with `value`.
    pub fn full(shape: impl Into<Shape>, value: f32) -> Self {
        let shape: Shape = shape.into();
        let n: usize = shape.iter().product();
        Self::new(f32_vec_to_bytes(vec![value; n]), shape, DType::F32)
    }

    /// F32 tensor with values uniform in `[0, 1)` drawn from `gen`.
    pub fn rand(shape: impl Into<Shape>, gen: &mut Generator) -> Self {
        let shape: Shape = shape.into();
        let n: usize = shape.iter().product();
        let data: Vec<f32> = (0..n).map(|_| gen.uniform()).collect();
        Self::new(f32_vec_to_bytes(data), shape, DType::F32)
    }

    /// Tensor of `dtype` holding integers drawn uniformly from `[low, high)`.
    pub fn randint(
        shape: impl Into<Shape>,
        low: i64,
        high: i64,
        dtype: DType,
        gen: &mut Generator,
    ) -> TensorResult<Self> {
        if low >= high {
            return Err(TensorError::InvalidOperation(format!(
                "randint requires low < high, got [{}, {})",
                low, high
            )));
        }
        let shape: Shape = shape.into();
        let n: usize = shape.iter().product();
        let data: Vec<f32> = (0..n).map(|_| gen.randint(low, high) as f32).collect();
        Ok(Self::new(encode(data, dtype), shape, dtype))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Identity of the underlying storage. Equal for clones of one tensor.
    pub fn storage_id(&self) -> usize {
        Arc::as_ptr(&self.data) as usize
    }

    pub fn as_raw_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Borrow F32 storage as a slice.
    pub fn as_slice_f32(&self) -> TensorResult<&[f32]> {
        if self.dtype != DType::F32 {
            return Err(TensorError::DTypeMismatch {
                expected: DType::F32.to_string(),
                actual: self.dtype.to_string(),
            });
        }
        bytemuck::try_cast_slice(self.as_raw_bytes()).map_err(|_| {
            TensorError::InvalidOperation(
                "as_slice_f32: data not 4-byte aligned; use to_f32_values()".into(),
            )
        })
    }

    /// Element values widened to f32. Borrows when the storage is already
    /// aligned F32.
    pub fn to_f32_values(&self) -> Cow<'_, [f32]> {
        let bytes = self.as_raw_bytes();
        match self.dtype {
            DType::F32 => match bytemuck::try_cast_slice::<u8, f32>(bytes) {
                Ok(slice) => Cow::Borrowed(slice),
                Err(_) => Cow::Owned(
                    bytes
                        .chunks_exact(4)
                        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                        .collect(),
                ),
            },
            DType::F16 => Cow::Owned(match bytemuck::try_cast_slice::<u8, f16>(bytes) {
                Ok(slice) => slice.iter().map(|x| x.to_f32()).collect(),
                Err(_) => bytes
                    .chunks_exact(2)
                    .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
                    .collect(),
            }),
            DType::BF16 => Cow::Owned(match bytemuck::try_cast_slice::<u8, bf16>(bytes) {
                Ok(slice) => slice.iter().map(|x| x.to_f32()).collect(),
                Err(_) => bytes
                    .chunks_exact(2)
                    .map(|c| bf16::from_le_bytes([c[0], c[1]]).to_f32())
                    .collect(),
            }),
        }
    }

    /// Owned copy of the values as f32.
    pub fn to_vec(&self) -> Vec<f32> {
        self.to_f32_values().into_owned()
    }

    /// Cast to another dtype. Same-dtype casts share storage.
    pub fn to_dtype(&self, dtype: DType) -> TensorResult<Tensor> {
        if dtype == self.dtype {
            return Ok(self.clone());
        }
        let values = self.to_f32_values().into_owned();
        Ok(Self::new(encode(values, dtype), self.shape.clone(), dtype))
    }

    /// Reinterpret with a new shape of equal element count.
    pub fn reshape(&self, shape: &[usize]) -> TensorResult<Tensor> {
        let n: usize = shape.iter().product();
        if n != self.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.to_vec(),
                actual: shape.to_vec(),
            });
        }
        Ok(Self {
            data: Arc::clone(&self.data),
            shape: SmallVec::from_slice(shape),
            dtype: self.dtype,
            device: self.device,
        })
    }

    /// `self @ weight^T` for `self: [..., K]` and `weight: [N, K]`.
    ///
    /// Computed in f32 through faer; the result has `self`'s dtype and shape
    /// `[..., N]`.
    pub fn matmul_t(&self, weight: &Tensor) -> TensorResult<Tensor> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };
        if weight.ndim() != 2 {
            return Err(TensorError::InvalidOperation(format!(
                "matmul_t expects a 2D weight, got {:?}",
                weight.shape()
            )));
        }
        let ndim = self.ndim();
        if ndim == 0 {
            return Err(TensorError::InvalidOperation("matmul_t on a scalar".into()));
        }
        let k = self.shape[ndim - 1];
        let n = weight.shape[0];
        if weight.shape[1] != k {
            return Err(TensorError::MatmulDimensionMismatch { left: k, right: weight.shape[1] });
        }
        let m: usize = self.shape[..ndim - 1].iter().product();

        let x_data = self.to_f32_values();
        let w_data = weight.to_f32_values();
        let mut out_data = vec![0.0f32; m * n];

        if m > 0 && n > 0 && k > 0 {
            // C^T = W @ X^T using faer column-major convention
            unsafe {
                let w = faer::mat::from_raw_parts::<f32>(
                    w_data.as_ptr(),
                    n,
                    k,
                    k as isize,
                    1,
                );
                let x_t = faer::mat::from_raw_parts::<f32>(
                    x_data.as_ptr(),
                    k,
                    m,
                    1,
                    k as isize,
                );
                let mut c_t = faer::mat::from_column_major_slice_mut(&mut out_data, n, m);
                c_t.copy_from(w * x_t);
            }
        }

        let mut out_shape: Shape = SmallVec::from_slice(&self.shape[..ndim - 1]);
        out_shape.push(n);

        if let Some(t) = _t {
            log::trace!("[perf] tensor::matmul_t [{}x{}]x[{}x{}]^T {:.3}ms",
                m, k, n, k, t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(Self::new(encode(out_data, self.dtype), out_shape, self.dtype))
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape.as_slice())
            .field("dtype", &self.dtype)
            .field("device", &self.device)
            .finish()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={:?}, dtype={}, device={})", self.shape.as_slice(), self.dtype, self.device)
    }
}
