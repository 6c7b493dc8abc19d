//! `SimulationData`: one sampled bundle — an axis plus named signals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::signal::{Axis, Signal};

/// Common aliases tried, in order, when an exact (case-sensitive) signal
/// name lookup misses. Carried over from the noise/power alias tables in
/// the original Python implementation (see SPEC_FULL.md §C).
const NOISE_INPUT_ALIASES: &[&str] = &["inoise", "inoise_total", "input_noise", "V(inoise)"];
const NOISE_OUTPUT_ALIASES: &[&str] = &["onoise", "onoise_total", "output_noise", "V(onoise)"];
const SUPPLY_CURRENT_ALIASES: &[&str] =
    &["I(VDD)", "I(Vcc)", "I(VCC)", "I(vdd)", "I(V1)"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationData {
    pub axis: Axis,
    signals: HashMap<String, Signal>,
    /// Preserves the caller's insertion order for export column ordering.
    signal_order: Vec<String>,
}

impl SimulationData {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            signals: HashMap::new(),
            signal_order: Vec::new(),
        }
    }

    pub fn with_signal(mut self, name: impl Into<String>, signal: Signal) -> Result<Self> {
        self.insert(name, signal)?;
        Ok(self)
    }

    /// Inserts a signal, validating its length matches the axis.
    pub fn insert(&mut self, name: impl Into<String>, signal: Signal) -> Result<()> {
        if signal.len() != self.axis.len() {
            return Err(Error::invalid_input(format!(
                "signal length {} does not match axis length {}",
                signal.len(),
                self.axis.len()
            )));
        }
        let name = name.into();
        if !self.signals.contains_key(&name) {
            self.signal_order.push(name.clone());
        }
        self.signals.insert(name, signal);
        Ok(())
    }

    /// Case-sensitive exact lookup.
    pub fn get_signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    /// Case-insensitive lookup, falling back to the given alias list in
    /// order, then to a case-insensitive scan of all registered names.
    pub fn get_signal_aliased<'a>(&'a self, name: &str, aliases: &[&str]) -> Option<&'a Signal> {
        if let Some(s) = self.signals.get(name) {
            return Some(s);
        }
        for alias in aliases {
            if let Some(s) = self.signals.get(*alias) {
                return Some(s);
            }
        }
        let lower = name.to_lowercase();
        self.signal_order
            .iter()
            .find(|n| n.to_lowercase() == lower)
            .and_then(|n| self.signals.get(n))
    }

    pub fn get_input_noise(&self, name: &str) -> Option<&Signal> {
        self.get_signal_aliased(name, NOISE_INPUT_ALIASES)
    }

    pub fn get_output_noise(&self, name: &str) -> Option<&Signal> {
        self.get_signal_aliased(name, NOISE_OUTPUT_ALIASES)
    }

    pub fn get_supply_current(&self, name: &str) -> Option<&Signal> {
        self.get_signal_aliased(name, SUPPLY_CURRENT_ALIASES)
    }

    pub fn signal_names(&self) -> &[String] {
        &self.signal_order
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn point_count(&self) -> usize {
        self.axis.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::signal::AxisKind;

    fn axis() -> Axis {
        Axis::new(AxisKind::Time, vec![0.0, 1.0, 2.0]).unwrap()
    }

    #[test]
    fn rejects_mismatched_signal_length() {
        let data = SimulationData::new(axis());
        let err = data
            .with_signal("V(out)", Signal::Real(vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn noise_alias_fallback_finds_inoise_total() {
        let data = SimulationData::new(axis())
            .with_signal("inoise_total", Signal::Real(vec![1.0, 2.0, 3.0]))
            .unwrap();
        assert!(data.get_input_noise("inoise").is_some());
    }

    #[test]
    fn preserves_insertion_order() {
        let data = SimulationData::new(axis())
            .with_signal("V(out)", Signal::Real(vec![0.0, 0.0, 0.0]))
            .unwrap()
            .with_signal("V(in)", Signal::Real(vec![0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(data.signal_names(), &["V(out)".to_string(), "V(in)".to_string()]);
    }
}
