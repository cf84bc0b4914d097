use std::iter::FusedIterator;

use crate::config::{AnalysisConfig, CutoffSource, MarkerScope};
use crate::cutoff::CutoffTable;
use crate::data::Dataset;
use crate::error::ScoutsError;
use crate::selection::{
    Category, Info, OutliersFor, Placement, ResultSubset, Segment, any_marker_matches,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Job {
    source: CutoffSource,
    /// `None` for the any-marker scope.
    marker: Option<usize>,
    category: Category,
}

#[derive(Debug)]
struct ReferenceCutoffs<'a> {
    name: &'a str,
    table: &'a CutoffTable,
}

#[derive(Debug)]
struct SampleCutoffs<'a> {
    table: &'a CutoffTable,
    /// Row indices of each table sample, in table order.
    rows: Vec<Vec<usize>>,
}

/// Lazily yields one [`ResultSubset`] per enabled policy.
///
/// Order: reference/any, reference/single, sample/any, sample/single; within
/// each branch markers in dataset order, and top, bottom, non-outlier per
/// marker. Rows of a subset are only computed when it is pulled.
#[derive(Debug)]
pub struct SubsetGenerator<'a> {
    dataset: &'a Dataset,
    reference: Option<ReferenceCutoffs<'a>>,
    samples: Option<SampleCutoffs<'a>>,
    jobs: std::vec::IntoIter<Job>,
}

impl<'a> SubsetGenerator<'a> {
    /// `reference` must be a one-sample table when the config uses reference
    /// cutoffs; `samples` must cover every sample when it uses sample cutoffs.
    pub fn new(
        dataset: &'a Dataset,
        config: &AnalysisConfig,
        reference: Option<&'a CutoffTable>,
        samples: Option<&'a CutoffTable>,
    ) -> anyhow::Result<Self> {
        let reference = if config.cutoff_rule.uses(CutoffSource::Reference) {
            let table = reference.ok_or(ScoutsError::MissingReference)?;
            let name = table
                .samples()
                .first()
                .map(String::as_str)
                .ok_or(ScoutsError::MissingReference)?;
            Some(ReferenceCutoffs { name, table })
        } else {
            None
        };

        let samples = if config.cutoff_rule.uses(CutoffSource::Sample) {
            let table = samples.ok_or_else(|| {
                ScoutsError::InvalidParameter("sample cutoff table was not computed".to_string())
            })?;
            let rows = table
                .samples()
                .iter()
                .map(|s| dataset.rows_for_sample(s))
                .collect();
            Some(SampleCutoffs { table, rows })
        } else {
            None
        };

        let jobs = plan(config, dataset.n_markers());
        log::debug!("Planned {} result subsets", jobs.len());

        Ok(SubsetGenerator {
            dataset,
            reference,
            samples,
            jobs: jobs.into_iter(),
        })
    }

    fn info(&self, job: Job) -> Info {
        let reference = match job.source {
            CutoffSource::Reference => self.reference.as_ref().map(|r| r.name.to_string()),
            CutoffSource::Sample => None,
        };
        let outliers_for = match job.marker {
            Some(m) => OutliersFor::Marker(self.dataset.markers()[m].clone()),
            None => OutliersFor::AnyMarker,
        };
        Info {
            cutoff_from: job.source,
            reference,
            outliers_for,
            category: job.category,
        }
    }

    fn select(&self, job: Job) -> (Vec<usize>, Vec<Segment>) {
        match job.source {
            CutoffSource::Reference => match &self.reference {
                Some(reference) => {
                    let rows = (0..self.dataset.n_rows())
                        .filter(|&row| self.row_matches(row, reference.table, 0, job))
                        .collect();
                    (rows, Vec::new())
                }
                None => (Vec::new(), Vec::new()),
            },
            CutoffSource::Sample => match &self.samples {
                Some(samples) => {
                    let mut rows = Vec::new();
                    let mut segments = Vec::with_capacity(samples.rows.len());
                    for (sample_idx, sample_rows) in samples.rows.iter().enumerate() {
                        let start = rows.len();
                        rows.extend(
                            sample_rows
                                .iter()
                                .copied()
                                .filter(|&row| self.row_matches(row, samples.table, sample_idx, job)),
                        );
                        segments.push(Segment {
                            sample: samples.table.samples()[sample_idx].clone(),
                            range: start..rows.len(),
                        });
                    }
                    (rows, segments)
                }
                None => (Vec::new(), Vec::new()),
            },
        }
    }

    fn row_matches(&self, row: usize, table: &CutoffTable, sample_idx: usize, job: Job) -> bool {
        let place = |marker: usize| Placement::of(self.dataset.value(row, marker), table.get(sample_idx, marker));
        match job.marker {
            Some(marker) => place(marker).matches(job.category),
            None => any_marker_matches((0..self.dataset.n_markers()).map(place), job.category),
        }
    }
}

impl Iterator for SubsetGenerator<'_> {
    type Item = ResultSubset;

    fn next(&mut self) -> Option<ResultSubset> {
        let job = self.jobs.next()?;
        let (rows, segments) = self.select(job);
        Some(ResultSubset {
            rows,
            info: self.info(job),
            segments,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.jobs.size_hint()
    }
}

impl ExactSizeIterator for SubsetGenerator<'_> {}

impl FusedIterator for SubsetGenerator<'_> {}

fn categories(config: &AnalysisConfig) -> Vec<Category> {
    let mut categories = vec![Category::TopOutliers];
    if config.bottom_outliers {
        categories.push(Category::BottomOutliers);
    }
    if config.non_outliers {
        categories.push(Category::NonOutliers);
    }
    categories
}

fn plan(config: &AnalysisConfig, n_markers: usize) -> Vec<Job> {
    let categories = categories(config);
    let mut jobs = Vec::new();
    for &source in config.cutoff_rule.sources() {
        for &scope in config.marker_rule.scopes() {
            match scope {
                MarkerScope::Any => {
                    jobs.extend(categories.iter().map(|&category| Job {
                        source,
                        marker: None,
                        category,
                    }));
                }
                MarkerScope::Single => {
                    for marker in 0..n_markers {
                        jobs.extend(categories.iter().map(|&category| Job {
                            source,
                            marker: Some(marker),
                            category,
                        }));
                    }
                }
            }
        }
    }
    jobs
}
