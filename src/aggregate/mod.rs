//! Descriptive statistics per (sample, category, statistic) and marker.
//!
//! One [`StatsTable`] exists per enabled [`PolicyKey`]. Its rows are laid out
//! sample-major, then category (whole population, top, bottom, non-outliers),
//! then statistic (`#`, mean, median, sd); its columns are the markers.
//!
//! ## Missing statistics
//!
//! Cells that were never written, or whose subset had no present values, hold
//! `None`. The count is always written, so an empty subset shows up as `0`
//! with missing mean, median and sd. The standard deviation is the sample
//! estimate (n − 1) and needs at least two values.
//!
//! ## Any-marker tables
//!
//! An any-marker subset fills every marker column with that marker's values
//! over the selected rows. There is no pooled column across markers.
//!
//! ## Sample rows
//!
//! For sample cutoffs a sample's statistics cover only the rows selected with
//! that sample's own fences. For reference cutoffs they cover every selected
//! row whose label contains the sample name.

use std::io::Write;

use ndarray::Array2;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::config::{CutoffSource, PolicyKey};
use crate::cutoff::utils::{quantile_sorted, sorted_present};
use crate::data::Dataset;
use crate::error::ScoutsError;
use crate::selection::{Category, OutliersFor, ResultSubset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Statistic {
    Count,
    Mean,
    Median,
    StdDev,
}

impl Statistic {
    pub const ALL: [Statistic; 4] = [
        Statistic::Count,
        Statistic::Mean,
        Statistic::Median,
        Statistic::StdDev,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Count => "#",
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::StdDev => "sd",
        }
    }

    fn index(&self) -> usize {
        match self {
            Statistic::Count => 0,
            Statistic::Mean => 1,
            Statistic::Median => 2,
            Statistic::StdDev => 3,
        }
    }
}

/// Count, mean, median and standard deviation of one marker over a set of rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    /// Number of rows, including rows where the marker is missing.
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Describe {
    pub fn of(dataset: &Dataset, rows: &[usize], marker: usize) -> Self {
        let present = sorted_present(rows.iter().map(|&r| dataset.value(r, marker)));
        let std_dev = if present.len() >= 2 {
            defined(present.iter().std_dev())
        } else {
            None
        };
        Describe {
            count: rows.len(),
            mean: defined(present.iter().mean()),
            median: defined(quantile_sorted(&present, 0.5)),
            std_dev,
        }
    }

    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Count => Some(self.count as f64),
            Statistic::Mean => self.mean,
            Statistic::Median => self.median,
            Statistic::StdDev => self.std_dev,
        }
    }
}

fn defined(value: f64) -> Option<f64> {
    if value.is_nan() { None } else { Some(value) }
}

const N_CATEGORIES: usize = Category::ALL.len();
const N_STATISTICS: usize = Statistic::ALL.len();

/// Accumulated statistics for one cutoff source and marker scope.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsTable {
    key: PolicyKey,
    samples: Vec<String>,
    markers: Vec<String>,
    cells: Array2<Option<f64>>,
}

impl StatsTable {
    /// Creates the table and records the whole-population statistics of every
    /// sample.
    pub fn new(key: PolicyKey, dataset: &Dataset, samples: &[&str]) -> Self {
        let n_rows = samples.len() * N_CATEGORIES * N_STATISTICS;
        let mut table = StatsTable {
            key,
            samples: samples.iter().map(|s| s.to_string()).collect(),
            markers: dataset.markers().to_vec(),
            cells: Array2::from_elem((n_rows, dataset.n_markers()), None),
        };

        for (sample_idx, sample) in samples.iter().enumerate() {
            let rows = dataset.rows_for_sample(sample);
            for marker in 0..dataset.n_markers() {
                let describe = Describe::of(dataset, &rows, marker);
                table.write(sample_idx, Category::WholePopulation, marker, &describe);
            }
        }
        log::debug!(
            "Recorded whole population for {} ({} samples)",
            key.label(),
            samples.len()
        );
        table
    }

    pub fn key(&self) -> PolicyKey {
        self.key
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Folds one subset into the table.
    ///
    /// Each sample gets the statistics of the subset rows carrying its name.
    /// A single-marker subset writes its marker column; an any-marker subset
    /// writes every column.
    pub fn update(&mut self, dataset: &Dataset, subset: &ResultSubset) -> anyhow::Result<()> {
        let subset_key = subset.info.policy_key();
        if subset_key != self.key {
            return Err(ScoutsError::InvalidParameter(format!(
                "subset of {} cannot update {}",
                subset_key.label(),
                self.key.label()
            ))
            .into());
        }

        let markers: Vec<usize> = match &subset.info.outliers_for {
            OutliersFor::Marker(name) => {
                let idx = self.markers.iter().position(|m| m == name).ok_or_else(|| {
                    ScoutsError::InvalidParameter(format!("unknown marker '{}'", name))
                })?;
                vec![idx]
            }
            OutliersFor::AnyMarker => (0..self.markers.len()).collect(),
        };

        let samples = self.samples.clone();
        for (sample_idx, sample) in samples.iter().enumerate() {
            // sample cutoffs: only the rows selected with this sample's own fences
            let rows: Vec<usize> = match subset.info.cutoff_from {
                CutoffSource::Sample => subset.segment_rows(sample).to_vec(),
                CutoffSource::Reference => subset
                    .rows
                    .iter()
                    .copied()
                    .filter(|&r| dataset.belongs_to(r, sample))
                    .collect(),
            };
            for &marker in &markers {
                let describe = Describe::of(dataset, &rows, marker);
                self.write(sample_idx, subset.info.category, marker, &describe);
            }
        }
        Ok(())
    }

    fn row_index(sample_idx: usize, category: Category, statistic: Statistic) -> usize {
        (sample_idx * N_CATEGORIES + category.index()) * N_STATISTICS + statistic.index()
    }

    fn write(&mut self, sample_idx: usize, category: Category, marker: usize, describe: &Describe) {
        for statistic in Statistic::ALL {
            let row = Self::row_index(sample_idx, category, statistic);
            self.cells[[row, marker]] = describe.get(statistic);
        }
    }

    /// Looks a cell up by name. `None` for unknown names and for missing values.
    pub fn get(&self, sample: &str, category: Category, statistic: Statistic, marker: &str) -> Option<f64> {
        let sample_idx = self.samples.iter().position(|s| s == sample)?;
        let marker_idx = self.markers.iter().position(|m| m == marker)?;
        self.cells[[Self::row_index(sample_idx, category, statistic), marker_idx]]
    }

    /// Writes the table as delimited text: `sample, category, statistic`
    /// followed by one column per marker. Missing cells are left empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["sample", "category", "statistic"];
        header.extend(self.markers.iter().map(|m| m.as_str()));
        csv_writer.write_record(&header)?;

        for (sample_idx, sample) in self.samples.iter().enumerate() {
            for category in Category::ALL {
                for statistic in Statistic::ALL {
                    let row = Self::row_index(sample_idx, category, statistic);
                    let mut record = vec![
                        sample.clone(),
                        category.as_str().to_string(),
                        statistic.as_str().to_string(),
                    ];
                    record.extend(
                        self.cells
                            .row(row)
                            .iter()
                            .map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()),
                    );
                    csv_writer.write_record(&record)?;
                }
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}
