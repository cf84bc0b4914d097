//! Output tables of an analysis run.
//!
//! Row tables stream out through a [`SubsetSink`] while the generator is
//! drained; everything else is collected into a [`Report`] once the run
//! completes. Tables are written as delimited text with missing values left
//! empty.
//!
//! ## Directory layout
//!
//! [`DirectorySink`] and [`Report::write_to_dir`] share one layout:
//!
//! ```text
//! <root>/summary.csv
//! <root>/cutoff_values.csv
//! <root>/stats/<policy>.csv
//! <root>/data/0001.csv, 0002.csv, ...
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::Serialize;

use crate::aggregate::StatsTable;
use crate::config::PolicyKey;
use crate::cutoff::{CutoffTable, Stats};
use crate::data::Dataset;
use crate::error::ScoutsError;
use crate::selection::{Info, ResultSubset};

/// Name of a row table: the sequence number zero-padded to four digits.
pub fn file_stem(sequence: usize) -> String {
    format!("{:04}", sequence)
}

fn format_value(value: f64) -> String {
    if value.is_nan() { String::new() } else { value.to_string() }
}

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub sequence: usize,
    pub info: Info,
}

impl SummaryRow {
    pub fn file_stem(&self) -> String {
        file_stem(self.sequence)
    }
}

/// Quartiles and fences of one (sample, marker).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoffRow {
    pub sample: String,
    pub marker: String,
    pub stats: Stats,
}

/// The rows of one result subset, copied out of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTable {
    pub sequence: usize,
    pub info: Info,
    pub labels: Vec<String>,
    pub markers: Vec<String>,
    pub values: Array2<f64>,
}

impl RowTable {
    pub fn from_subset(sequence: usize, dataset: &Dataset, subset: &ResultSubset) -> Self {
        RowTable {
            sequence,
            info: subset.info.clone(),
            labels: subset
                .rows
                .iter()
                .map(|&r| dataset.labels()[r].clone())
                .collect(),
            markers: dataset.markers().to_vec(),
            values: dataset.select_rows(&subset.rows),
        }
    }

    pub fn name(&self) -> String {
        file_stem(self.sequence)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["label"];
        header.extend(self.markers.iter().map(|m| m.as_str()));
        csv_writer.write_record(&header)?;

        for (label, row) in self.labels.iter().zip(self.values.rows()) {
            let mut record = vec![label.clone()];
            record.extend(row.iter().map(|&v| format_value(v)));
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Receives each row table as soon as its subset is produced.
pub trait SubsetSink {
    fn accept(&mut self, table: RowTable) -> anyhow::Result<()>;
}

/// Discards row tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SubsetSink for NullSink {
    fn accept(&mut self, _table: RowTable) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Keeps every row table in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub tables: Vec<RowTable>,
}

impl SubsetSink for MemorySink {
    fn accept(&mut self, table: RowTable) -> anyhow::Result<()> {
        self.tables.push(table);
        Ok(())
    }
}

/// Writes each row table to `<root>/data/<NNNN>.csv`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    data_dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let data_dir = root.as_ref().join("data");
        std::fs::create_dir_all(&data_dir)?;
        Ok(DirectorySink { data_dir })
    }

    pub fn path_for(&self, sequence: usize) -> PathBuf {
        self.data_dir.join(format!("{}.csv", file_stem(sequence)))
    }
}

impl SubsetSink for DirectorySink {
    fn accept(&mut self, table: RowTable) -> anyhow::Result<()> {
        let file = std::fs::File::create(self.path_for(table.sequence))?;
        table.write_csv(std::io::BufWriter::new(file))
    }
}

/// Numbers subsets as they stream past and assembles the final [`Report`].
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    summary: Vec<SummaryRow>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one subset and returns its sequence number (starting at 1).
    pub fn record(&mut self, info: &Info) -> usize {
        let sequence = self.summary.len() + 1;
        self.summary.push(SummaryRow {
            sequence,
            info: info.clone(),
        });
        sequence
    }

    pub fn len(&self) -> usize {
        self.summary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    pub fn finish(self, cutoffs: &CutoffTable, stats: BTreeMap<PolicyKey, StatsTable>) -> Report {
        let cutoffs = cutoffs
            .iter()
            .map(|(sample, marker, stats)| CutoffRow {
                sample: sample.to_string(),
                marker: marker.to_string(),
                stats: *stats,
            })
            .collect();
        Report {
            summary: self.summary,
            cutoffs,
            stats,
        }
    }
}

/// Tables produced by a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    summary: Vec<SummaryRow>,
    cutoffs: Vec<CutoffRow>,
    stats: BTreeMap<PolicyKey, StatsTable>,
}

impl Report {
    pub fn summary(&self) -> &[SummaryRow] {
        &self.summary
    }

    pub fn cutoffs(&self) -> &[CutoffRow] {
        &self.cutoffs
    }

    pub fn stats(&self, key: PolicyKey) -> Option<&StatsTable> {
        self.stats.get(&key)
    }

    /// Stats tables in policy order.
    pub fn stats_tables(&self) -> impl Iterator<Item = &StatsTable> + '_ {
        self.stats.values()
    }

    pub fn write_summary_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["file_number", "cutoff_from", "reference", "outliers_for", "category"])?;
        for row in &self.summary {
            csv_writer.write_record([
                row.file_stem(),
                row.info.cutoff_from.as_str().to_string(),
                row.info.reference_label().to_string(),
                row.info.outliers_for.to_string(),
                row.info.category.as_str().to_string(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_cutoffs_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "sample",
            "marker",
            "first_quartile",
            "third_quartile",
            "iqr",
            "lower_cutoff",
            "upper_cutoff",
        ])?;
        for row in &self.cutoffs {
            csv_writer.write_record([
                row.sample.clone(),
                row.marker.clone(),
                format_value(row.stats.first_quartile),
                format_value(row.stats.third_quartile),
                format_value(row.stats.iqr),
                format_value(row.stats.lower_cutoff),
                format_value(row.stats.upper_cutoff),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_stats_csv<W: Write>(&self, key: PolicyKey, writer: W) -> anyhow::Result<()> {
        let table = self.stats(key).ok_or_else(|| {
            ScoutsError::InvalidParameter(format!("no stats table for {}", key.label()))
        })?;
        table.write_csv(writer)
    }

    /// Writes the summary, cutoff and stats tables under `root`.
    pub fn write_to_dir<P: AsRef<Path>>(&self, root: P) -> anyhow::Result<()> {
        let root = root.as_ref();
        let stats_dir = root.join("stats");
        std::fs::create_dir_all(&stats_dir)?;

        self.write_summary_csv(std::fs::File::create(root.join("summary.csv"))?)?;
        self.write_cutoffs_csv(std::fs::File::create(root.join("cutoff_values.csv"))?)?;
        for (key, table) in &self.stats {
            let name = key.label().replace(' ', "_");
            table.write_csv(std::fs::File::create(stats_dir.join(format!("{}.csv", name)))?)?;
        }
        log::info!("Wrote report to {}", root.display());
        Ok(())
    }
}
