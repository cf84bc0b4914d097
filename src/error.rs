//! Error kinds raised by the outlier pipeline.
//!
//! Public functions return `anyhow::Result`; the kind can be recovered with
//! `err.downcast_ref::<ScoutsError>()`. Degenerate statistics (NaN quartiles,
//! empty subsets) are not errors and never show up here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoutsError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Sample '{0}' does not match any row label")]
    SampleNaming(String),

    #[error("Reference cutoff requested but no reference sample was given")]
    MissingReference,

    #[error("Sample list is empty")]
    EmptySampleList,

    #[error("Sample '{0}' is listed more than once")]
    DuplicateSample(String),

    #[error("More than one reference sample: '{first}' and '{second}'")]
    MultipleReferences { first: String, second: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Analysis cancelled")]
    Cancelled,
}

/// Returns the error kind carried by `err`, if it is one of ours.
pub fn error_kind(err: &anyhow::Error) -> Option<&ScoutsError> {
    err.downcast_ref::<ScoutsError>()
}
