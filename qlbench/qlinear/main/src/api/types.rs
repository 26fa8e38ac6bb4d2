//! Packing constants and bit-width selection

use crate::api::error::QLinearError;

/// Columns per packed block. Integer rows are zero-padded to a multiple of this.
pub const BLOCK_SIZE: usize = 32;

/// Bytes per int4 block: 32 x 4-bit values, two per byte.
pub const INT4_BLOCK_BYTES: usize = 16;

/// Bytes per int8 block: 32 x i8.
pub const INT8_BLOCK_BYTES: usize = 32;

/// Output columns processed together in the row-parallel kernel.
pub const TILE_N: usize = 8;

/// Inputs with at most this many rows parallelize over output columns instead.
pub const SMALL_M: usize = 4;

/// Quantized bit-width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bits {
    Int4,
    Int8,
}

impl Bits {
    pub fn width(&self) -> u32 {
        match self {
            Bits::Int4 => 4,
            Bits::Int8 => 8,
        }
    }

    /// Smallest representable signed value.
    pub fn qmin(&self) -> i32 {
        -(1 << (self.width() - 1))
    }

    /// Largest representable signed value.
    pub fn qmax(&self) -> i32 {
        (1 << (self.width() - 1)) - 1
    }

    pub fn block_bytes(&self) -> usize {
        match self {
            Bits::Int4 => INT4_BLOCK_BYTES,
            Bits::Int8 => INT8_BLOCK_BYTES,
        }
    }
}

impl TryFrom<u32> for Bits {
    type Error = QLinearError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            4 => Ok(Bits::Int4),
            8 => Ok(Bits::Int8),
            other => Err(QLinearError::InvalidBits(other)),
        }
    }
}

impl std::fmt::Display for Bits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "int{}", self.width())
    }
}
