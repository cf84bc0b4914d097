//! Tukey-fence cutoffs per (sample, marker).
//!
//! For every sample the rows whose label contains the sample name are
//! selected, and for every marker the first and third quartile of the present
//! values give the fences
//!
//! ```text
//! lower = Q1 - k * IQR
//! upper = Q3 + k * IQR
//! ```
//!
//! The calculator has no notion of a reference sample: reference cutoffs are
//! simply a table computed for a one-element sample list.

use ndarray::Array2;
use serde::Serialize;

use crate::data::Dataset;

pub mod utils;

/// Quartiles and fences for one (sample, marker).
///
/// All fields are NaN when the sample had no present values for the marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub first_quartile: f64,
    pub third_quartile: f64,
    pub iqr: f64,
    pub lower_cutoff: f64,
    pub upper_cutoff: f64,
}

impl Stats {
    pub fn from_quartiles(first_quartile: f64, third_quartile: f64, tukey_factor: f64) -> Self {
        let iqr = third_quartile - first_quartile;
        Stats {
            first_quartile,
            third_quartile,
            iqr,
            lower_cutoff: first_quartile - iqr * tukey_factor,
            upper_cutoff: third_quartile + iqr * tukey_factor,
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = f64>, tukey_factor: f64) -> Self {
        let (q1, q3) = utils::quartiles(values);
        Self::from_quartiles(q1, q3, tukey_factor)
    }

    pub fn is_finite(&self) -> bool {
        self.lower_cutoff.is_finite() && self.upper_cutoff.is_finite()
    }
}

/// Dense sample × marker lookup of [`Stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct CutoffTable {
    samples: Vec<String>,
    markers: Vec<String>,
    stats: Array2<Stats>,
}

impl CutoffTable {
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn sample_index(&self, sample: &str) -> Option<usize> {
        self.samples.iter().position(|s| s == sample)
    }

    pub fn get(&self, sample_idx: usize, marker_idx: usize) -> &Stats {
        &self.stats[[sample_idx, marker_idx]]
    }

    pub fn lookup(&self, sample: &str, marker_idx: usize) -> Option<&Stats> {
        self.sample_index(sample)
            .and_then(|s| self.stats.get([s, marker_idx]))
    }

    /// Stats of every marker for one sample, in marker order.
    pub fn sample_row(&self, sample_idx: usize) -> ndarray::ArrayView1<'_, Stats> {
        self.stats.row(sample_idx)
    }

    /// `(sample, marker, stats)` for every cell, sample-major.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Stats)> + '_ {
        self.stats.indexed_iter().map(move |((s, m), stats)| {
            (self.samples[s].as_str(), self.markers[m].as_str(), stats)
        })
    }
}

/// Computes the cutoff table for `samples` over every marker of `dataset`.
pub fn compute(dataset: &Dataset, samples: &[&str], tukey_factor: f64) -> anyhow::Result<CutoffTable> {
    let n_markers = dataset.n_markers();
    let mut cells = Vec::with_capacity(samples.len() * n_markers);

    for &sample in samples {
        let rows = dataset.rows_for_sample(sample);
        if rows.is_empty() {
            log::warn!("Sample '{}' has no rows; its cutoffs are undefined", sample);
        }
        for marker in 0..n_markers {
            let stats = Stats::from_values(rows.iter().map(|&r| dataset.value(r, marker)), tukey_factor);
            if !rows.is_empty() && !stats.is_finite() {
                log::warn!(
                    "Sample '{}' has no present values for marker '{}'",
                    sample,
                    dataset.markers()[marker]
                );
            }
            cells.push(stats);
        }
    }

    let stats = Array2::from_shape_vec((samples.len(), n_markers), cells)?;
    log::debug!(
        "Computed cutoffs for {} samples x {} markers (k = {})",
        samples.len(),
        n_markers,
        tukey_factor
    );

    Ok(CutoffTable {
        samples: samples.iter().map(|s| s.to_string()).collect(),
        markers: dataset.markers().to_vec(),
        stats,
    })
}

pub trait DatasetCutoffs {
    /// Cutoffs computed from each sample's own rows.
    fn sample_cutoffs(&self, samples: &[&str], tukey_factor: f64) -> anyhow::Result<CutoffTable>;

    /// Cutoffs of the reference sample alone.
    fn reference_cutoffs(&self, reference: &str, tukey_factor: f64) -> anyhow::Result<CutoffTable>;
}

impl DatasetCutoffs for Dataset {
    fn sample_cutoffs(&self, samples: &[&str], tukey_factor: f64) -> anyhow::Result<CutoffTable> {
        compute(self, samples, tukey_factor)
    }

    fn reference_cutoffs(&self, reference: &str, tukey_factor: f64) -> anyhow::Result<CutoffTable> {
        compute(self, &[reference], tukey_factor)
    }
}
