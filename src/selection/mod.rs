//! Outlier selection policies and the subsets they produce.
//!
//! A policy is a cutoff source (reference or sample), a marker scope (single
//! or any) and a category (top, bottom or non-outlier). The [`SubsetGenerator`]
//! walks every enabled policy in a fixed order and yields one [`ResultSubset`]
//! at a time.
//!
//! ## Comparisons
//!
//! A value is a top outlier when strictly above the upper fence and a bottom
//! outlier when strictly below the lower fence. Anything in `[lower, upper]`,
//! fences included, is a non-outlier. A missing value or an undefined fence is
//! incomparable and belongs to no category.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

use crate::config::{CutoffSource, MarkerScope, PolicyKey};
use crate::cutoff::Stats;

mod generator;

pub use generator::SubsetGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    TopOutliers,
    BottomOutliers,
    NonOutliers,
    WholePopulation,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::WholePopulation,
        Category::TopOutliers,
        Category::BottomOutliers,
        Category::NonOutliers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::TopOutliers => "top outliers",
            Category::BottomOutliers => "bottom outliers",
            Category::NonOutliers => "non-outliers",
            Category::WholePopulation => "whole population",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Category::WholePopulation => 0,
            Category::TopOutliers => 1,
            Category::BottomOutliers => 2,
            Category::NonOutliers => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a single value falls relative to a pair of fences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Above,
    Below,
    Within,
    Incomparable,
}

impl Placement {
    pub fn of(value: f64, stats: &Stats) -> Placement {
        if value > stats.upper_cutoff {
            Placement::Above
        } else if value < stats.lower_cutoff {
            Placement::Below
        } else if value >= stats.lower_cutoff && value <= stats.upper_cutoff {
            Placement::Within
        } else {
            Placement::Incomparable
        }
    }

    /// Single-marker membership test.
    pub fn matches(&self, category: Category) -> bool {
        matches!(
            (self, category),
            (Placement::Above, Category::TopOutliers)
                | (Placement::Below, Category::BottomOutliers)
                | (Placement::Within, Category::NonOutliers)
        )
    }
}

/// Any-marker membership test over the placements of one row.
///
/// Top and bottom are an OR across markers. Non-outlier requires that no
/// marker is outside its fences and that at least one marker was comparable.
pub fn any_marker_matches(placements: impl IntoIterator<Item = Placement>, category: Category) -> bool {
    let mut above = false;
    let mut below = false;
    let mut within = false;
    for placement in placements {
        match placement {
            Placement::Above => above = true,
            Placement::Below => below = true,
            Placement::Within => within = true,
            Placement::Incomparable => {}
        }
    }
    match category {
        Category::TopOutliers => above,
        Category::BottomOutliers => below,
        Category::NonOutliers => within && !above && !below,
        Category::WholePopulation => true,
    }
}

/// The marker(s) a subset was selected on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OutliersFor {
    Marker(String),
    AnyMarker,
}

impl fmt::Display for OutliersFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutliersFor::Marker(name) => f.write_str(name),
            OutliersFor::AnyMarker => f.write_str("any marker"),
        }
    }
}

/// Describes the policy that produced a [`ResultSubset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    pub cutoff_from: CutoffSource,
    /// Reference sample name for reference-cutoff policies.
    pub reference: Option<String>,
    pub outliers_for: OutliersFor,
    pub category: Category,
}

impl Info {
    pub fn reference_label(&self) -> &str {
        self.reference.as_deref().unwrap_or("n/a")
    }

    pub fn scope(&self) -> MarkerScope {
        match self.outliers_for {
            OutliersFor::Marker(_) => MarkerScope::Single,
            OutliersFor::AnyMarker => MarkerScope::Any,
        }
    }

    pub fn policy_key(&self) -> PolicyKey {
        PolicyKey {
            source: self.cutoff_from,
            scope: self.scope(),
        }
    }
}

/// The part of a sample-cutoff subset selected with one sample's cutoffs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub sample: String,
    /// Span of [`ResultSubset::rows`] holding this sample's selection.
    pub range: Range<usize>,
}

/// Rows selected by one policy, as indices into the dataset.
///
/// Sample-cutoff subsets are concatenations of per-sample selections, so a
/// row matching two sample names can appear twice, once per segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSubset {
    pub rows: Vec<usize>,
    pub info: Info,
    /// One entry per sample, in sample order. Empty for reference cutoffs.
    pub segments: Vec<Segment>,
}

impl ResultSubset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows selected with `sample`'s own cutoffs; empty when the subset has
    /// no segment for it.
    pub fn segment_rows(&self, sample: &str) -> &[usize] {
        self.segments
            .iter()
            .find(|s| s.sample == sample)
            .and_then(|s| self.rows.get(s.range.clone()))
            .unwrap_or(&[])
    }
}
