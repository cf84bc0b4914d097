//! # single-outliers
//!
//! Tukey-fence outlier selection for single-cell expression data, part of the single-rust ecosystem.
//!
//! Given a cells × markers table whose row labels encode sample membership, this crate computes
//! per-sample, per-marker quartile cutoffs and splits the cells into top outliers, bottom outliers
//! and non-outliers. Every combination of cutoff source (each sample's own cutoffs, or those of a
//! reference sample) and marker scope (one marker at a time, or any marker of the row) yields its
//! own subsets, and descriptive statistics of each subset are collected per sample.
//!
//! ## Core Features
//!
//! - **Gating**: drop poorly stained cytometry cells or mask sequencing dropouts before analysis
//! - **Tukey Cutoffs**: quartiles by linear interpolation, fences at `Q1 - k·IQR` / `Q3 + k·IQR`
//! - **Lazy Subsets**: result subsets are produced one at a time in a fixed, reproducible order
//! - **Per-sample Statistics**: count, mean, median and standard deviation for every subset
//!
//! ## Quick Start
//!
//! Load a [`data::Dataset`], describe the samples with a [`data::SampleSpec`], choose the policies
//! in an [`config::AnalysisConfig`] and call [`pipeline::run`]. Row tables are streamed to a
//! [`report::SubsetSink`]; the summary, cutoff and stats tables come back as a [`report::Report`].
//!
//! ## Module Organization
//!
//! - **[`data`]**: Expression table and sample list
//! - **[`gating`]**: Preprocessing gates
//! - **[`cutoff`]**: Quartiles and Tukey fences per sample and marker
//! - **[`selection`]**: Outlier policies and the subset generator
//! - **[`aggregate`]**: Descriptive statistics tables
//! - **[`report`]**: Output tables and sinks
//! - **[`pipeline`]**: The end-to-end driver

pub mod aggregate;
pub mod config;
pub mod cutoff;
pub mod data;
pub mod error;
pub mod gating;
pub mod pipeline;
pub mod report;
pub mod selection;

pub mod prelude {
    pub use crate::aggregate::{Describe, Statistic, StatsTable};
    pub use crate::config::{AnalysisConfig, CutoffRule, CutoffSource, MarkerRule, MarkerScope, PolicyKey};
    pub use crate::cutoff::{CutoffTable, DatasetCutoffs, Stats};
    pub use crate::data::{Dataset, Sample, SampleSpec};
    pub use crate::error::{ScoutsError, error_kind};
    pub use crate::gating::{Gate, GateKind};
    pub use crate::pipeline::{CancelToken, run};
    pub use crate::report::{DirectorySink, MemorySink, NullSink, Report, RowTable, SubsetSink};
    pub use crate::selection::{Category, Info, OutliersFor, ResultSubset, Segment, SubsetGenerator};
}
