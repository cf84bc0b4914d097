//! End-to-end outlier analysis.
//!
//! [`run`] validates everything that can fail up front, gates the dataset,
//! builds the cutoff and stats tables, then drains the subset generator one
//! subset at a time. Cancellation is checked before each subset is pulled.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::aggregate::StatsTable;
use crate::config::{AnalysisConfig, CutoffSource, PolicyKey};
use crate::cutoff::DatasetCutoffs;
use crate::data::{Dataset, SampleSpec};
use crate::error::ScoutsError;
use crate::report::{Report, ReportBuilder, RowTable, SubsetSink};
use crate::selection::SubsetGenerator;

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Runs the full analysis over `dataset`, which is gated in place.
///
/// Row tables go to `sink` as they are produced; the summary, cutoff and
/// stats tables are returned once every subset was processed. A cancelled
/// run fails with [`ScoutsError::Cancelled`] and returns no report.
pub fn run(
    dataset: &mut Dataset,
    samples: &SampleSpec,
    config: &AnalysisConfig,
    sink: &mut dyn SubsetSink,
    cancel: &CancelToken,
) -> anyhow::Result<Report> {
    config.validate()?;
    samples.validate_against(dataset)?;
    let reference = if config.cutoff_rule.uses(CutoffSource::Reference) {
        Some(samples.require_reference()?)
    } else {
        None
    };

    log::info!(
        "Starting outlier analysis: {} samples, {} markers, {} cells",
        samples.len(),
        dataset.n_markers(),
        dataset.n_rows()
    );
    config.gate.apply(dataset);
    let dataset: &Dataset = dataset;

    let names = samples.names();
    let k = config.tukey_factor;
    let reference_cutoffs = reference
        .map(|r| dataset.reference_cutoffs(r, k))
        .transpose()?;
    let sample_cutoffs = if config.cutoff_rule.uses(CutoffSource::Sample) {
        Some(dataset.sample_cutoffs(&names, k)?)
    } else {
        None
    };

    let mut stats: BTreeMap<PolicyKey, StatsTable> = config
        .policy_keys()
        .into_iter()
        .map(|key| (key, StatsTable::new(key, dataset, &names)))
        .collect();

    let mut generator = SubsetGenerator::new(
        dataset,
        config,
        reference_cutoffs.as_ref(),
        sample_cutoffs.as_ref(),
    )?;
    log::info!("Processing {} result subsets", generator.len());

    let mut builder = ReportBuilder::new();
    loop {
        if cancel.is_cancelled() {
            log::info!("Analysis cancelled after {} subsets", builder.len());
            return Err(ScoutsError::Cancelled.into());
        }
        let Some(subset) = generator.next() else {
            break;
        };

        let key = subset.info.policy_key();
        let table = stats.get_mut(&key).ok_or_else(|| {
            ScoutsError::InvalidParameter(format!("no stats table for {}", key.label()))
        })?;
        table.update(dataset, &subset)?;

        let sequence = builder.record(&subset.info);
        log::debug!(
            "Subset {}: {} / {} / {} -> {} rows",
            sequence,
            key.label(),
            subset.info.outliers_for,
            subset.info.category,
            subset.len()
        );
        sink.accept(RowTable::from_subset(sequence, dataset, &subset))?;
    }

    let cutoffs = sample_cutoffs
        .as_ref()
        .or(reference_cutoffs.as_ref())
        .ok_or_else(|| ScoutsError::InvalidParameter("no cutoff table was built".to_string()))?;
    let report = builder.finish(cutoffs, stats);
    log::info!("Outlier analysis finished: {} subsets", report.summary().len());
    Ok(report)
}
