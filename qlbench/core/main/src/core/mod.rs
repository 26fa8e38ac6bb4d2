pub(crate) mod device;
pub(crate) mod random;
pub(crate) mod runtime;
pub(crate) mod shape;
pub(crate) mod tensor;
