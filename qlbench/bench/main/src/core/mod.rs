pub(crate) mod driver;
pub(crate) mod grid;
pub(crate) mod report;
pub(crate) mod stats;
pub(crate) mod timer;
