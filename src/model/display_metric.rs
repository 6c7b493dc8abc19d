//! `DisplayMetric`: the UI-facing projection of a `MetricResult`.
//!
//! Formats a metric for presentation and tracks a trend marker against the
//! *immediately preceding* observation of the same named metric. Per §5,
//! metric history is a single-slot store and is single-writer by contract;
//! [`TrendTracker`] enforces that with a `Mutex` rather than exposing raw
//! shared mutable state.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::metrics::{MetricCategory, MetricResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
    Unknown,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DisplayMetric {
    pub name: String,
    pub formatted_value: String,
    pub target_description: String,
    pub trend: Trend,
    pub category: MetricCategory,
}

/// Formats a raw value with an SI prefix, matching the original
/// implementation's `formatted_value` property (see `metric_result.py`).
pub fn format_si(value: f64, unit: &str) -> String {
    let abs = value.abs();
    let formatted = if abs == 0.0 {
        "0".to_string()
    } else if abs >= 1e9 {
        format!("{:.2}G", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}k", value / 1e3)
    } else if abs >= 1.0 {
        format!("{value:.2}")
    } else if abs >= 1e-3 {
        format!("{:.2}m", value * 1e3)
    } else if abs >= 1e-6 {
        format!("{:.2}u", value * 1e6)
    } else if abs >= 1e-9 {
        format!("{:.2}n", value * 1e9)
    } else if abs >= 1e-12 {
        format!("{:.2}p", value * 1e12)
    } else {
        format!("{value:.2e}")
    };
    if unit.is_empty() {
        formatted
    } else {
        format!("{formatted} {unit}")
    }
}

fn target_description(target: &Option<crate::metrics::result::Target>) -> String {
    use crate::metrics::result::Target;
    match target {
        None => String::new(),
        Some(Target::Min(t)) => format!("min {t}"),
        Some(Target::Max(t)) => format!("max {t}"),
        Some(Target::Range(lo, hi)) => format!("{lo}–{hi}"),
        Some(Target::Exact { target, tolerance }) => format!("{target} ± {tolerance}"),
    }
}

/// Single-slot, single-writer store of the previously observed value for
/// each named metric, used to compute [`Trend`].
#[derive(Debug, Default)]
pub struct TrendTracker {
    previous: Mutex<HashMap<String, f64>>,
}

impl TrendTracker {
    pub fn new() -> Self {
        Self {
            previous: Mutex::new(HashMap::new()),
        }
    }

    /// Projects a `MetricResult` into a `DisplayMetric`, computing trend
    /// against the previous observation and then overwriting it with the
    /// current value (single-writer).
    pub fn project(&self, metric: &MetricResult) -> DisplayMetric {
        let trend = match metric.value {
            None => Trend::Unknown,
            Some(value) => {
                let mut guard = self.previous.lock().unwrap_or_else(|e| e.into_inner());
                let trend = match guard.get(&metric.name) {
                    None => Trend::Unknown,
                    Some(&prev) if value > prev => Trend::Up,
                    Some(&prev) if value < prev => Trend::Down,
                    Some(_) => Trend::Flat,
                };
                guard.insert(metric.name.clone(), value);
                trend
            }
        };

        let formatted_value = match metric.value {
            Some(v) => format_si(v, &metric.unit),
            None => "N/A".to_string(),
        };

        DisplayMetric {
            name: metric.name.clone(),
            formatted_value,
            target_description: target_description(&metric.target),
            trend,
            category: metric.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricCategory;

    #[test]
    fn first_observation_is_unknown_trend() {
        let tracker = TrendTracker::new();
        let m = MetricResult::ok("gain", "Gain", 20.0, "dB", MetricCategory::Amplifier);
        assert_eq!(tracker.project(&m).trend, Trend::Unknown);
    }

    #[test]
    fn second_higher_observation_trends_up() {
        let tracker = TrendTracker::new();
        let first = MetricResult::ok("gain", "Gain", 20.0, "dB", MetricCategory::Amplifier);
        let second = MetricResult::ok("gain", "Gain", 25.0, "dB", MetricCategory::Amplifier);
        tracker.project(&first);
        assert_eq!(tracker.project(&second).trend, Trend::Up);
    }

    #[test]
    fn si_formatting_picks_prefix() {
        assert_eq!(format_si(1.5e6, "Hz"), "1.50M Hz");
        assert_eq!(format_si(0.0, "V"), "0 V");
    }
}
