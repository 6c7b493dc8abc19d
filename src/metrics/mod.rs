//! Metrics Extractor — the catalogue of standardized performance metrics
//! and the topology-guided / auto-detecting dispatch over it.
//!
//! Every extraction follows the same shape: validate the required data
//! kind is present, compute, format a measurement condition, and return a
//! [`MetricResult`] — never a raised error. A batch extraction therefore
//! never aborts partway; failed metrics simply populate the output map
//! with an error result (see [`MetricResult::err`]).

pub mod amplifier;
pub mod common;
pub mod distortion;
pub mod noise;
pub mod power;
pub mod result;
pub mod transient;

use std::collections::HashMap;

pub use distortion::Window;
pub use result::{MetricCategory, MetricResult, Target};

use crate::model::{AxisKind, SimulationData};

/// A topology tag mapping to a curated, ordered list of metric names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Amplifier,
    OpAmp,
    Ldo,
    DcDc,
    Oscillator,
    Filter,
    Adc,
    Dac,
    Digital,
}

impl Topology {
    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            Topology::Amplifier | Topology::OpAmp => &[
                "gain",
                "bandwidth",
                "gbw",
                "phase_margin",
                "gain_margin",
                "slew_rate_rise",
                "slew_rate_fall",
                "offset_voltage",
                "input_noise",
                "output_noise",
                "thd",
            ],
            Topology::Ldo | Topology::DcDc => &[
                "quiescent_current",
                "power_consumption",
                "efficiency",
                "load_regulation",
                "line_regulation",
                "dropout_voltage",
                "rise_time",
                "settling_time",
            ],
            Topology::Oscillator => &["frequency", "duty_cycle", "thd", "sfdr", "harmonics"],
            Topology::Filter => &["gain", "bandwidth", "phase_margin"],
            Topology::Adc | Topology::Dac => &["thd", "thd_n", "sndr", "enob", "sfdr", "harmonics"],
            Topology::Digital => &[
                "propagation_delay_low_to_high",
                "propagation_delay_high_to_low",
                "rise_time",
                "fall_time",
                "duty_cycle",
                "frequency",
            ],
        }
    }
}

/// Which metric families can run against the data present, inferred when
/// no topology tag was supplied.
#[derive(Debug, Clone, Default)]
pub struct AvailableFamilies {
    pub ac: bool,
    pub noise: bool,
    pub transient: bool,
    pub distortion: bool,
    pub power: bool,
}

/// Inspects `data`'s axis kind and signal names to decide which metric
/// families have a chance of succeeding, without running any extraction.
pub fn available_metrics(data: &SimulationData) -> AvailableFamilies {
    let mut families = AvailableFamilies::default();
    match data.axis.kind {
        AxisKind::Frequency => {
            families.ac = true;
            families.noise = data.signal_names().iter().any(|n| {
                let lower = n.to_lowercase();
                lower.contains("noise")
            });
        }
        AxisKind::Time => {
            families.transient = true;
            families.distortion = true;
        }
    }
    families.power = data.signal_names().iter().any(|n| {
        matches!(n.as_str(), "I(VDD)" | "I(Vcc)" | "I(VCC)" | "I(vdd)" | "I(V1)")
    });
    families
}

/// Runs a single named metric with default arguments, resolving signal
/// names from the common conventions (`V(out)` / `V(in)` / `I(VDD)`).
/// Multi-argument metrics that need a caller-specific signal wiring
/// (`power::efficiency_curve`, `amplifier::cmrr`/`psrr`, `amplifier::
/// input_impedance`/`output_impedance`, `noise::noise_figure`'s source
/// resistance and temperature, and the like) are still reached directly
/// through their family module; the defaults
/// used here exist so a topology's full metric list always resolves to a
/// result — even an error one — through [`extract_metrics`].
pub fn get_metric_by_name(data: &SimulationData, name: &str) -> Option<MetricResult> {
    let out = "V(out)";
    let inp = "V(in)";
    Some(match name {
        "gain" => amplifier::gain(data, out, Some(inp), None),
        "bandwidth" => amplifier::bandwidth(data, out, Some(inp), None),
        "gbw" => amplifier::gbw(data, out, Some(inp), None),
        "phase_margin" => amplifier::phase_margin(data, out, Some(inp)),
        "gain_margin" => amplifier::gain_margin(data, out, Some(inp)),
        "slew_rate_rise" => amplifier::slew_rate_rise(data, out, 10.0, 90.0),
        "slew_rate_fall" => amplifier::slew_rate_fall(data, out, 10.0, 90.0),
        "settling_time" => amplifier::settling_time(data, out, None, 1.0),
        "overshoot" => amplifier::overshoot(data, out, None),
        "offset_voltage" => amplifier::offset_voltage(data, out, 0.0, None),
        "input_noise" => noise::input_noise(data, out, None),
        "output_noise" => noise::output_noise(data, out, None),
        "corner_frequency" => noise::corner_frequency(data, out, false),
        "thd" => distortion::thd(data, out, Window::default(), 10),
        "thd_n" => distortion::thd_n(data, out, Window::default()),
        "sfdr" => distortion::sfdr(data, out, Window::default()),
        "sndr" => distortion::sndr(data, out, Window::default()),
        "enob" => distortion::enob(data, out, Window::default()),
        "harmonics" => distortion::harmonics(data, out, Window::default(), 5),
        "quiescent_current" => power::quiescent_current(data, "I(VDD)"),
        "power_consumption" => power::power_consumption(data, "I(VDD)", 3.3),
        "efficiency" => power::efficiency(data, "V(in)", "I(in)", "V(out)", "I(out)"),
        "load_regulation" => power::load_regulation(data, "V(out)", "I(load)"),
        "line_regulation" => power::line_regulation(data, "V(out)", "V(in)"),
        "dropout_voltage" => power::dropout_voltage(data, "V(in)", "V(out)", 3.3, 1.0),
        "rise_time" => transient::rise_time(data, out, 10.0, 90.0),
        "fall_time" => transient::fall_time(data, out, 10.0, 90.0),
        "duty_cycle" => transient::duty_cycle(data, out),
        "frequency" => transient::frequency(data, out),
        "propagation_delay_low_to_high" => transient::propagation_delay_low_to_high(data, inp, out),
        "propagation_delay_high_to_low" => transient::propagation_delay_high_to_low(data, inp, out),
        _ => return None,
    })
}

/// Runs every metric named by `topology`, in order, collecting both
/// successes and error results.
pub fn extract_metrics(data: &SimulationData, topology: Topology) -> HashMap<String, MetricResult> {
    topology
        .metrics()
        .iter()
        .filter_map(|&name| get_metric_by_name(data, name).map(|m| (name.to_string(), m)))
        .collect()
}

/// Runs the auto-detected set of metric families when no topology tag is
/// known, via [`available_metrics`].
pub fn extract_all_metrics(data: &SimulationData) -> HashMap<String, MetricResult> {
    let families = available_metrics(data);
    let mut names: Vec<&str> = Vec::new();
    if families.ac {
        names.extend_from_slice(&["gain", "bandwidth", "gbw", "phase_margin", "gain_margin"]);
    }
    if families.noise {
        names.extend_from_slice(&["input_noise", "output_noise", "corner_frequency"]);
    }
    if families.transient {
        names.extend_from_slice(&[
            "rise_time",
            "fall_time",
            "slew_rate_rise",
            "slew_rate_fall",
            "settling_time",
            "overshoot",
            "duty_cycle",
            "frequency",
        ]);
    }
    if families.distortion {
        names.extend_from_slice(&["thd", "thd_n", "sfdr", "sndr", "enob", "harmonics"]);
    }
    if families.power {
        names.push("quiescent_current");
    }

    names
        .into_iter()
        .filter_map(|name| get_metric_by_name(data, name).map(|m| (name.to_string(), m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, Signal};

    #[test]
    fn available_metrics_detects_time_axis_families() {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1e-6, 2e-6, 3e-6]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![0.0, 1.0, 1.0, 1.0]))
            .unwrap();
        let families = available_metrics(&data);
        assert!(families.transient);
        assert!(families.distortion);
        assert!(!families.ac);
    }

    #[test]
    fn extract_metrics_never_aborts_on_missing_signals() {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1e-6, 2e-6, 3e-6]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![0.0, 1.0, 1.0, 1.0]))
            .unwrap();
        let results = extract_metrics(&data, Topology::Ldo);
        assert!(results.contains_key("dropout_voltage"));
        assert!(!results["dropout_voltage"].is_valid());
    }

    #[test]
    fn unknown_metric_name_returns_none() {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1.0, 2.0]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![0.0, 1.0, 0.0]))
            .unwrap();
        assert!(get_metric_by_name(&data, "not_a_real_metric").is_none());
    }
}
