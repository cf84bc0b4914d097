//! Preprocessing gates applied once, before any cutoff is computed.
//!
//! Both gates use an inclusive boundary: a row mean (or a value) equal to the
//! threshold is gated out.
//!
//! - **Cytometry average** (`cytometry-average`): drops poorly stained cells, i.e. rows
//!   whose mean expression across markers is at or below the threshold.
//! - **Sequencing zero mask** (`sequencing-zero-mask`): marks values at or below the
//!   threshold as missing so that dropout zeros do not drag quartiles down. Rows are kept.

use serde::{Deserialize, Serialize};

use crate::data::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateKind {
    None,
    CytometryAverage,
    SequencingZeroMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub kind: GateKind,
    pub threshold: f64,
}

impl Gate {
    pub const fn none() -> Self {
        Gate {
            kind: GateKind::None,
            threshold: 0.0,
        }
    }

    pub fn apply(&self, dataset: &mut Dataset) {
        apply(dataset, self.kind, self.threshold);
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::none()
    }
}

/// Applies the gate in place.
pub fn apply(dataset: &mut Dataset, kind: GateKind, threshold: f64) {
    match kind {
        GateKind::None => {}
        GateKind::CytometryAverage => {
            let before = dataset.n_rows();
            let keep = rows_above_average(dataset, threshold);
            dataset.retain_rows(&keep);
            log::info!(
                "Cytometry gate at {}: kept {} of {} cells",
                threshold,
                keep.len(),
                before
            );
        }
        GateKind::SequencingZeroMask => {
            let mut masked = 0usize;
            dataset.values_mut().mapv_inplace(|v| {
                if v <= threshold {
                    masked += 1;
                    f64::NAN
                } else {
                    v
                }
            });
            log::info!(
                "Sequencing gate at {}: masked {} values as missing",
                threshold,
                masked
            );
        }
    }
}

/// Rows whose mean over present markers is above `threshold`.
///
/// A row with no present value has no mean and is kept.
fn rows_above_average(dataset: &Dataset, threshold: f64) -> Vec<usize> {
    (0..dataset.n_rows())
        .filter(|&row| {
            let (sum, count) = dataset
                .row(row)
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
            if count == 0 {
                return true;
            }
            sum / count as f64 > threshold
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_rows(
            &["CD44", "CD45"],
            [
                ("Ct_1", vec![10.0, 10.0]),
                ("Ct_2", vec![0.0, 1.0]),
                ("Ct_3", vec![9.0, 11.5]),
                ("RT_1", vec![20.0, 0.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn cytometry_gate_drops_rows_at_threshold() {
        let mut data = dataset();
        apply(&mut data, GateKind::CytometryAverage, 10.0);
        // mean of Ct_1 is exactly 10 and is dropped
        assert_eq!(data.labels(), &["Ct_3".to_string()]);
        assert_eq!(data.n_rows(), 1);
        assert_eq!(data.value(0, 1), 11.5);
    }

    #[test]
    fn cytometry_gate_is_idempotent() {
        let mut once = dataset();
        apply(&mut once, GateKind::CytometryAverage, 5.0);
        let mut twice = once.clone();
        apply(&mut twice, GateKind::CytometryAverage, 5.0);
        assert_eq!(once, twice);
        assert_eq!(once.n_rows(), 3);
    }

    #[test]
    fn sequencing_gate_masks_without_dropping() {
        let mut data = dataset();
        apply(&mut data, GateKind::SequencingZeroMask, 0.0);
        assert_eq!(data.n_rows(), 4);
        assert!(data.value(1, 0).is_nan());
        assert_eq!(data.value(1, 1), 1.0);
        assert!(data.value(3, 1).is_nan());
        assert_eq!(data.value(3, 0), 20.0);
    }

    #[test]
    fn no_gate_is_identity() {
        let mut data = dataset();
        Gate::none().apply(&mut data);
        assert_eq!(data, dataset());
    }
}
