//! Input data: the expression table and the sample list.

mod dataset;
mod samples;

pub use dataset::Dataset;
pub use samples::{Sample, SampleSpec};
