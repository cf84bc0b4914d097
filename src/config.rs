use serde::{Deserialize, Serialize};

use crate::error::ScoutsError;
use crate::gating::{Gate, GateKind};

/// Where the cutoffs used to classify a row come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoffSource {
    /// The reference sample's fences, applied to every row ("OutR").
    Reference,
    /// Each sample's own fences, applied to that sample's rows ("OutS").
    Sample,
}

impl CutoffSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CutoffSource::Reference => "reference",
            CutoffSource::Sample => "sample",
        }
    }
}

/// Whether a row is judged one marker at a time or across all markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerScope {
    Any,
    Single,
}

impl MarkerScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerScope::Any => "any marker",
            MarkerScope::Single => "single marker",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoffRule {
    Sample,
    Reference,
    Both,
}

impl CutoffRule {
    /// Enabled sources in enumeration order (reference first).
    pub fn sources(&self) -> &'static [CutoffSource] {
        match self {
            CutoffRule::Sample => &[CutoffSource::Sample],
            CutoffRule::Reference => &[CutoffSource::Reference],
            CutoffRule::Both => &[CutoffSource::Reference, CutoffSource::Sample],
        }
    }

    pub fn uses(&self, source: CutoffSource) -> bool {
        self.sources().contains(&source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerRule {
    Single,
    Any,
    Both,
}

impl MarkerRule {
    /// Enabled scopes in enumeration order (any marker first).
    pub fn scopes(&self) -> &'static [MarkerScope] {
        match self {
            MarkerRule::Single => &[MarkerScope::Single],
            MarkerRule::Any => &[MarkerScope::Any],
            MarkerRule::Both => &[MarkerScope::Any, MarkerScope::Single],
        }
    }
}

/// Policy flags for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cutoff_rule: CutoffRule,
    pub marker_rule: MarkerRule,
    /// Tukey factor `k` for the fences `Q1 - k·IQR` / `Q3 + k·IQR`.
    pub tukey_factor: f64,
    pub bottom_outliers: bool,
    pub non_outliers: bool,
    pub gate: Gate,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            cutoff_rule: CutoffRule::Sample,
            marker_rule: MarkerRule::Single,
            tukey_factor: 1.5,
            bottom_outliers: false,
            non_outliers: false,
            gate: Gate::none(),
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cutoff_rule(mut self, rule: CutoffRule) -> Self {
        self.cutoff_rule = rule;
        self
    }

    pub fn with_marker_rule(mut self, rule: MarkerRule) -> Self {
        self.marker_rule = rule;
        self
    }

    pub fn with_tukey_factor(mut self, factor: f64) -> Self {
        self.tukey_factor = factor;
        self
    }

    /// Also emit subsets of rows below the lower fence
    pub fn with_bottom_outliers(mut self, enabled: bool) -> Self {
        self.bottom_outliers = enabled;
        self
    }

    /// Also emit subsets of rows within both fences
    pub fn with_non_outliers(mut self, enabled: bool) -> Self {
        self.non_outliers = enabled;
        self
    }

    pub fn with_gate(mut self, kind: GateKind, threshold: f64) -> Self {
        self.gate = Gate { kind, threshold };
        self
    }

    /// Every enabled (source, scope) pair in enumeration order.
    pub fn policy_keys(&self) -> Vec<PolicyKey> {
        self.cutoff_rule
            .sources()
            .iter()
            .flat_map(|&source| {
                self.marker_rule
                    .scopes()
                    .iter()
                    .map(move |&scope| PolicyKey { source, scope })
            })
            .collect()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.tukey_factor.is_finite() || self.tukey_factor < 0.0 {
            return Err(ScoutsError::InvalidParameter(format!(
                "Tukey factor must be a non-negative number, got {}",
                self.tukey_factor
            ))
            .into());
        }
        if self.gate.kind != GateKind::None && !self.gate.threshold.is_finite() {
            return Err(ScoutsError::InvalidParameter(format!(
                "Gate threshold must be finite, got {}",
                self.gate.threshold
            ))
            .into());
        }
        Ok(())
    }
}

/// Identifies one stats table: a cutoff source paired with a marker scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyKey {
    pub source: CutoffSource,
    pub scope: MarkerScope,
}

impl PolicyKey {
    /// Short label such as `OutR any marker` or `OutS single marker`.
    pub fn label(&self) -> String {
        let prefix = match self.source {
            CutoffSource::Reference => "OutR",
            CutoffSource::Sample => "OutS",
        };
        format!("{} {}", prefix, self.scope.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_keys_follow_enumeration_order() {
        let config = AnalysisConfig::default()
            .with_cutoff_rule(CutoffRule::Both)
            .with_marker_rule(MarkerRule::Both);
        let labels: Vec<String> = config.policy_keys().iter().map(|k| k.label()).collect();
        assert_eq!(
            labels,
            vec![
                "OutR any marker",
                "OutR single marker",
                "OutS any marker",
                "OutS single marker"
            ]
        );
    }

    #[test]
    fn negative_tukey_factor_is_rejected() {
        let err = AnalysisConfig::default()
            .with_tukey_factor(-1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScoutsError>(),
            Some(ScoutsError::InvalidParameter(_))
        ));
        assert!(AnalysisConfig::default().with_tukey_factor(0.0).validate().is_ok());
    }

    #[test]
    fn non_finite_gate_threshold_is_rejected() {
        let config = AnalysisConfig::default().with_gate(GateKind::CytometryAverage, f64::NAN);
        assert!(config.validate().is_err());
        let config = AnalysisConfig::default().with_gate(GateKind::None, f64::NAN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_uses_kebab_case_names() {
        let config = AnalysisConfig::default()
            .with_cutoff_rule(CutoffRule::Both)
            .with_gate(GateKind::SequencingZeroMask, 0.0);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"both\""));
        assert!(json.contains("\"sequencing-zero-mask\""));

        let parsed: AnalysisConfig =
            serde_json::from_str(r#"{"marker_rule":"any","tukey_factor":3.0}"#).unwrap();
        assert_eq!(parsed.marker_rule, MarkerRule::Any);
        assert_eq!(parsed.tukey_factor, 3.0);
        assert_eq!(parsed.cutoff_rule, CutoffRule::Sample);
    }
}
