//! `MetricResult`: the uniform shape every metric extraction returns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricCategory {
    Amplifier,
    Noise,
    Distortion,
    Power,
    Transient,
    General,
}

/// How a metric's value is checked against a design target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Min(f64),
    Max(f64),
    Range(f64, f64),
    Exact { target: f64, tolerance: f64 },
}

impl Target {
    /// Default tolerance for `Exact` when the caller doesn't specify one:
    /// 1% of the target magnitude, or 0.01 absolute if the target is zero.
    pub fn exact_default(target: f64) -> Self {
        let tolerance = if target != 0.0 {
            target.abs() * 0.01
        } else {
            0.01
        };
        Target::Exact { target, tolerance }
    }

    fn is_met(&self, value: f64) -> bool {
        match *self {
            Target::Min(t) => value >= t,
            Target::Max(t) => value <= t,
            Target::Range(lo, hi) => value >= lo && value <= hi,
            Target::Exact { target, tolerance } => (value - target).abs() <= tolerance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricResult {
    pub name: String,
    pub display_name: String,
    pub value: Option<f64>,
    pub unit: String,
    pub target: Option<Target>,
    pub is_met: Option<bool>,
    pub category: MetricCategory,
    pub confidence: f64,
    pub measurement_condition: String,
    pub error_message: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl MetricResult {
    /// A successfully-computed metric.
    pub fn ok(
        name: impl Into<String>,
        display_name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        category: MetricCategory,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            value: Some(value),
            unit: unit.into(),
            target: None,
            is_met: None,
            category,
            confidence: 1.0,
            measurement_condition: String::new(),
            error_message: None,
            metadata: HashMap::new(),
        }
    }

    /// A failed extraction: `value` absent, `confidence` zero, carrying a
    /// localisable message. Never propagated as an exception — metric
    /// extractors return this instead of raising.
    pub fn err(
        name: impl Into<String>,
        display_name: impl Into<String>,
        category: MetricCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            value: None,
            unit: String::new(),
            target: None,
            is_met: None,
            category,
            confidence: 0.0,
            measurement_condition: String::new(),
            error_message: Some(message.into()),
            metadata: HashMap::new(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.measurement_condition = condition.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Produces a new `MetricResult` with a target attached and `is_met`
    /// recomputed, leaving `self` untouched — metrics are immutable to
    /// consumers (§3 of the specification).
    pub fn with_target(&self, target: Target) -> Self {
        let mut next = self.clone();
        next.is_met = next.value.map(|v| target.is_met(v));
        next.target = Some(target);
        next
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some() && self.error_message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_target_does_not_mutate_original() {
        let gain = MetricResult::ok("gain", "Gain", 20.5, "dB", MetricCategory::Amplifier);
        let targeted = gain.with_target(Target::Min(20.0));
        assert!(gain.target.is_none());
        assert_eq!(targeted.is_met, Some(true));
    }

    #[test]
    fn error_metric_has_zero_confidence_and_no_value() {
        let m = MetricResult::err("bandwidth", "Bandwidth", MetricCategory::Amplifier, "no AC data");
        assert_eq!(m.confidence, 0.0);
        assert!(m.value.is_none());
        assert!(!m.is_valid());
    }

    #[test]
    fn range_target() {
        let m = MetricResult::ok("x", "X", 5.0, "", MetricCategory::General)
            .with_target(Target::Range(1.0, 10.0));
        assert_eq!(m.is_met, Some(true));
    }
}
