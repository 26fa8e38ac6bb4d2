pub(crate) mod linear;
pub(crate) mod mixed;
pub(crate) mod pack;
pub(crate) mod shared;
pub(crate) mod simd;
