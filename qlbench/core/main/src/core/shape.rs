use smallvec::SmallVec;

/// Shape type: stack-allocated for ≤4 dimensions, spills to heap beyond.
pub type Shape = SmallVec<[usize; 4]>;
