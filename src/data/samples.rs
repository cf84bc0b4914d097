use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::error::ScoutsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    pub is_reference: bool,
}

/// Ordered list of samples, at most one of them the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSpec {
    samples: Vec<Sample>,
}

impl SampleSpec {
    pub fn new(samples: Vec<Sample>) -> anyhow::Result<Self> {
        if samples.is_empty() {
            return Err(ScoutsError::EmptySampleList.into());
        }

        let mut reference: Option<&str> = None;
        for (i, sample) in samples.iter().enumerate() {
            if sample.name.is_empty() {
                return Err(ScoutsError::InvalidParameter(format!(
                    "sample at position {} has an empty name",
                    i
                ))
                .into());
            }
            if samples[..i].iter().any(|s| s.name == sample.name) {
                return Err(ScoutsError::DuplicateSample(sample.name.clone()).into());
            }
            if sample.is_reference {
                if let Some(first) = reference {
                    return Err(ScoutsError::MultipleReferences {
                        first: first.to_string(),
                        second: sample.name.clone(),
                    }
                    .into());
                }
                reference = Some(sample.name.as_str());
            }
        }

        Ok(SampleSpec { samples })
    }

    /// Builds the sample list from `(name, is_reference)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, is_reference)| Sample {
                    name: name.into(),
                    is_reference,
                })
                .collect(),
        )
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn reference(&self) -> Option<&str> {
        self.samples
            .iter()
            .find(|s| s.is_reference)
            .map(|s| s.name.as_str())
    }

    /// The reference name, or `MissingReference` when none was tagged.
    pub fn require_reference(&self) -> anyhow::Result<&str> {
        self.reference()
            .ok_or_else(|| ScoutsError::MissingReference.into())
    }

    /// Fails on the first sample whose name is not part of any row label.
    pub fn validate_against(&self, dataset: &Dataset) -> anyhow::Result<()> {
        for sample in &self.samples {
            let found = dataset
                .labels()
                .iter()
                .any(|label| label.contains(sample.name.as_str()));
            if !found {
                return Err(ScoutsError::SampleNaming(sample.name.clone()).into());
            }
        }
        Ok(())
    }
}
