//! Amplifier family — AC and transient metrics (gain, bandwidth, phase
//! margin, slew rate, settling time, overshoot, offset, …).
//!
//! The open question in spec.md §9 is resolved here: when `input` is given
//! the loop transfer is `out/in`; when it is omitted, the raw `out` signal
//! is used directly (unit-amplitude excitation implied).

use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::metrics::common::{interp_at, linear_crossing, nearest_index, Direction};
use crate::metrics::result::{MetricCategory, MetricResult};
use crate::model::{AxisKind, SimulationData};

fn ac_axis(data: &SimulationData) -> Result<&[f64]> {
    if data.axis.kind != AxisKind::Frequency {
        return Err(Error::missing_data("no AC (frequency-axis) data available"));
    }
    Ok(data.axis.values())
}

/// `H(f) = out(f) / in(f)`, or `out(f)` alone (unit-amplitude input
/// implied) when `input` is `None`.
fn transfer_function(
    data: &SimulationData,
    output: &str,
    input: Option<&str>,
) -> Result<Vec<Complex64>> {
    let out = data
        .get_signal(output)
        .ok_or_else(|| Error::missing_data(format!("signal '{output}' not found")))?
        .as_complex();
    match input {
        None => Ok(out),
        Some(in_name) => {
            let inp = data
                .get_signal(in_name)
                .ok_or_else(|| Error::missing_data(format!("signal '{in_name}' not found")))?
                .as_complex();
            Ok(out
                .iter()
                .zip(inp.iter())
                .map(|(o, i)| if i.norm() > 0.0 { o / i } else { Complex64::new(0.0, 0.0) })
                .collect())
        }
    }
}

fn gain_db_curve(h: &[Complex64]) -> Vec<f64> {
    h.iter().map(|c| 20.0 * c.norm().log10()).collect()
}

fn phase_deg_curve(h: &[Complex64]) -> Vec<f64> {
    h.iter().map(|c| c.arg().to_degrees()).collect()
}

pub fn gain(
    data: &SimulationData,
    output: &str,
    input: Option<&str>,
    f: Option<f64>,
) -> MetricResult {
    let compute = || -> Result<(f64, f64)> {
        let axis = ac_axis(data)?;
        let h = transfer_function(data, output, input)?;
        let gain_db = gain_db_curve(&h);
        let idx = match f {
            Some(target) => nearest_index(axis, target),
            None => 0,
        };
        Ok((gain_db[idx], axis[idx]))
    };

    match compute() {
        Ok((value, at_f)) => MetricResult::ok("gain", "Gain", value, "dB", MetricCategory::Amplifier)
            .with_condition(format!("f={}", crate::metrics::common::format_frequency(at_f))),
        Err(e) => MetricResult::err("gain", "Gain", MetricCategory::Amplifier, e.to_string()),
    }
}

pub fn bandwidth(
    data: &SimulationData,
    output: &str,
    input: Option<&str>,
    reference_db: Option<f64>,
) -> MetricResult {
    let compute = || -> Result<f64> {
        let axis = ac_axis(data)?;
        let h = transfer_function(data, output, input)?;
        let gain_db = gain_db_curve(&h);
        let reference = reference_db.unwrap_or(gain_db[0]);
        linear_crossing(axis, &gain_db, reference - 3.0, Direction::Down)
            .ok_or_else(|| Error::numeric_failure("no -3 dB crossing found"))
    };

    match compute() {
        Ok(value) => MetricResult::ok("bandwidth", "Bandwidth", value, "Hz", MetricCategory::Amplifier)
            .with_confidence(0.95),
        Err(e) => MetricResult::err("bandwidth", "Bandwidth", MetricCategory::Amplifier, e.to_string()),
    }
}

pub fn gbw(data: &SimulationData, output: &str, input: Option<&str>, f: Option<f64>) -> MetricResult {
    let gain_m = gain(data, output, input, f);
    let bw_m = bandwidth(data, output, input, None);
    match (gain_m.value, bw_m.value) {
        (Some(g), Some(bw)) => {
            let value = 10f64.powf(g / 20.0) * bw;
            MetricResult::ok("gbw", "Gain-Bandwidth Product", value, "Hz", MetricCategory::Amplifier)
                .with_confidence(0.9)
        }
        _ => {
            let cause = gain_m
                .error_message
                .or(bw_m.error_message)
                .unwrap_or_else(|| "underlying primitive failed".to_string());
            MetricResult::err(
                "gbw",
                "Gain-Bandwidth Product",
                MetricCategory::Amplifier,
                Error::DependencyFailure { metric: "gbw".into(), cause }.to_string(),
            )
        }
    }
}

pub fn phase_margin(data: &SimulationData, output: &str, input: Option<&str>) -> MetricResult {
    let compute = || -> Result<f64> {
        let axis = ac_axis(data)?;
        let h = transfer_function(data, output, input)?;
        let gain_db = gain_db_curve(&h);
        let phase_deg = phase_deg_curve(&h);
        let uf = linear_crossing(axis, &gain_db, 0.0, Direction::Down)
            .ok_or_else(|| Error::numeric_failure("no unity-gain crossing found"))?;
        Ok(180.0 + interp_at(axis, &phase_deg, uf))
    };

    match compute() {
        Ok(value) => MetricResult::ok("phase_margin", "Phase Margin", value, "deg", MetricCategory::Amplifier)
            .with_confidence(0.95),
        Err(e) => MetricResult::err("phase_margin", "Phase Margin", MetricCategory::Amplifier, e.to_string()),
    }
}

pub fn gain_margin(data: &SimulationData, output: &str, input: Option<&str>) -> MetricResult {
    let compute = || -> Result<f64> {
        let axis = ac_axis(data)?;
        let h = transfer_function(data, output, input)?;
        let gain_db = gain_db_curve(&h);
        let phase_deg = phase_deg_curve(&h);
        let pf = linear_crossing(axis, &phase_deg, -180.0, Direction::Down)
            .ok_or_else(|| Error::numeric_failure("no -180 deg phase crossing found"))?;
        Ok(-interp_at(axis, &gain_db, pf))
    };

    match compute() {
        Ok(value) => MetricResult::ok("gain_margin", "Gain Margin", value, "dB", MetricCategory::Amplifier)
            .with_confidence(0.95),
        Err(e) => MetricResult::err("gain_margin", "Gain Margin", MetricCategory::Amplifier, e.to_string()),
    }
}

fn impedance(data: &SimulationData, name: &str, v_signal: &str, i_signal: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        ac_axis(data)?;
        let v = data
            .get_signal(v_signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{v_signal}' not found")))?
            .magnitude();
        let i = data
            .get_signal(i_signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{i_signal}' not found")))?
            .magnitude();
        if i[0].abs() < f64::EPSILON {
            return Err(Error::numeric_failure("current near zero at lowest bin"));
        }
        Ok(v[0] / i[0])
    };

    let display = if name == "input_impedance" { "Input Impedance" } else { "Output Impedance" };
    match compute() {
        Ok(value) => MetricResult::ok(name, display, value, "ohm", MetricCategory::Amplifier),
        Err(e) => MetricResult::err(name, display, MetricCategory::Amplifier, e.to_string()),
    }
}

pub fn input_impedance(data: &SimulationData, v_signal: &str, i_signal: &str) -> MetricResult {
    impedance(data, "input_impedance", v_signal, i_signal)
}

pub fn output_impedance(data: &SimulationData, v_signal: &str, i_signal: &str) -> MetricResult {
    impedance(data, "output_impedance", v_signal, i_signal)
}

fn rejection_ratio(data: &SimulationData, name: &str, display: &str, a: &str, b: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        ac_axis(data)?;
        let ma = data
            .get_signal(a)
            .ok_or_else(|| Error::missing_data(format!("signal '{a}' not found")))?
            .magnitude();
        let mb = data
            .get_signal(b)
            .ok_or_else(|| Error::missing_data(format!("signal '{b}' not found")))?
            .magnitude();
        if mb[0].abs() < f64::EPSILON {
            return Err(Error::numeric_failure("denominator near zero at lowest bin"));
        }
        Ok(20.0 * (ma[0] / mb[0]).log10())
    };

    match compute() {
        Ok(value) => MetricResult::ok(name, display, value, "dB", MetricCategory::Amplifier),
        Err(e) => MetricResult::err(name, display, MetricCategory::Amplifier, e.to_string()),
    }
}

pub fn cmrr(data: &SimulationData, differential: &str, common_mode: &str) -> MetricResult {
    rejection_ratio(data, "cmrr", "CMRR", differential, common_mode)
}

pub fn psrr(data: &SimulationData, output: &str, supply_ripple: &str) -> MetricResult {
    rejection_ratio(data, "psrr", "PSRR", output, supply_ripple)
}

fn amplitude_range(axis: &[f64], y: &[f64], low_pct: f64, high_pct: f64) -> (f64, f64, f64, f64) {
    let ymin = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let ymax = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = ymax - ymin;
    let _ = axis;
    (ymin + span * low_pct / 100.0, ymin + span * high_pct / 100.0, ymin, ymax)
}

fn slew_rate(
    data: &SimulationData,
    name: &str,
    rising: bool,
    output: &str,
    low_pct: f64,
    high_pct: f64,
) -> MetricResult {
    let display = if rising { "Slew Rate (rise)" } else { "Slew Rate (fall)" };
    let compute = || -> Result<f64> {
        if data.axis.kind != AxisKind::Time {
            return Err(Error::missing_data("no transient (time-axis) data available"));
        }
        let axis = data.axis.values();
        let y = data
            .get_signal(output)
            .ok_or_else(|| Error::missing_data(format!("signal '{output}' not found")))?
            .real_part();
        let (v_low, v_high, _, _) = amplitude_range(axis, &y, low_pct, high_pct);

        let (t_low, t_high) = if rising {
            let t_low = linear_crossing(axis, &y, v_low, Direction::Up)
                .ok_or_else(|| Error::numeric_failure("no low-threshold crossing found"))?;
            let idx_low = nearest_index(axis, t_low);
            let t_high = linear_crossing(&axis[idx_low..], &y[idx_low..], v_high, Direction::Up)
                .ok_or_else(|| Error::numeric_failure("no high-threshold crossing found"))?;
            (t_low, t_high)
        } else {
            let t_high = linear_crossing(axis, &y, v_high, Direction::Down)
                .ok_or_else(|| Error::numeric_failure("no high-threshold crossing found"))?;
            let idx_high = nearest_index(axis, t_high);
            let t_low = linear_crossing(&axis[idx_high..], &y[idx_high..], v_low, Direction::Down)
                .ok_or_else(|| Error::numeric_failure("no low-threshold crossing found"))?;
            (t_high, t_low)
        };

        let dt = (t_high - t_low).abs();
        if dt < f64::EPSILON {
            return Err(Error::numeric_failure("zero time delta between thresholds"));
        }
        let dv = (v_high - v_low).abs();
        // V/us
        Ok(dv / dt / 1e6)
    };

    match compute() {
        Ok(value) => MetricResult::ok(name, display, value, "V/us", MetricCategory::Amplifier)
            .with_condition(format!("{low_pct:.0}%/{high_pct:.0}%")),
        Err(e) => MetricResult::err(name, display, MetricCategory::Amplifier, e.to_string()),
    }
}

pub fn slew_rate_rise(data: &SimulationData, output: &str, low_pct: f64, high_pct: f64) -> MetricResult {
    slew_rate(data, "slew_rate_rise", true, output, low_pct, high_pct)
}

pub fn slew_rate_fall(data: &SimulationData, output: &str, low_pct: f64, high_pct: f64) -> MetricResult {
    slew_rate(data, "slew_rate_fall", false, output, low_pct, high_pct)
}

pub fn settling_time(
    data: &SimulationData,
    output: &str,
    target: Option<f64>,
    tol_pct: f64,
) -> MetricResult {
    let compute = || -> Result<f64> {
        if data.axis.kind != AxisKind::Time {
            return Err(Error::missing_data("no transient (time-axis) data available"));
        }
        let axis = data.axis.values();
        let y = data
            .get_signal(output)
            .ok_or_else(|| Error::missing_data(format!("signal '{output}' not found")))?
            .real_part();
        let target = target.unwrap_or(*y.last().unwrap());
        let band = target.abs() * tol_pct / 100.0;

        let mut last_outside = None;
        for i in (0..y.len()).rev() {
            if (y[i] - target).abs() > band {
                last_outside = Some(i);
                break;
            }
        }
        match last_outside {
            None => Ok(axis[0] - axis[0]),
            Some(i) if i + 1 < axis.len() => Ok(axis[i + 1] - axis[0]),
            Some(_) => Err(Error::numeric_failure("signal never settles within tolerance")),
        }
    };

    match compute() {
        Ok(value) => MetricResult::ok("settling_time", "Settling Time", value, "s", MetricCategory::Amplifier)
            .with_condition(format!("tol={tol_pct:.1}%")),
        Err(e) => MetricResult::err("settling_time", "Settling Time", MetricCategory::Amplifier, e.to_string()),
    }
}

pub fn overshoot(data: &SimulationData, output: &str, final_value: Option<f64>) -> MetricResult {
    let compute = || -> Result<f64> {
        if data.axis.kind != AxisKind::Time {
            return Err(Error::missing_data("no transient (time-axis) data available"));
        }
        let y = data
            .get_signal(output)
            .ok_or_else(|| Error::missing_data(format!("signal '{output}' not found")))?
            .real_part();
        let initial = y[0];
        let final_v = final_value.unwrap_or(*y.last().unwrap());
        let span = final_v - initial;
        if span.abs() < f64::EPSILON {
            return Err(Error::numeric_failure("zero step amplitude"));
        }
        let extreme = if span > 0.0 {
            y.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        } else {
            y.iter().cloned().fold(f64::INFINITY, f64::min)
        };
        let value = ((extreme - final_v) / span * 100.0).max(0.0);
        Ok(value)
    };

    match compute() {
        Ok(value) => MetricResult::ok("overshoot", "Overshoot", value, "%", MetricCategory::Amplifier),
        Err(e) => MetricResult::err("overshoot", "Overshoot", MetricCategory::Amplifier, e.to_string()),
    }
}

pub fn offset_voltage(
    data: &SimulationData,
    output: &str,
    expected: f64,
    divisor_gain: Option<f64>,
) -> MetricResult {
    let compute = || -> Result<f64> {
        let y = data
            .get_signal(output)
            .ok_or_else(|| Error::missing_data(format!("signal '{output}' not found")))?
            .real_part();
        let dc_out = y.iter().sum::<f64>() / y.len() as f64;
        let raw = dc_out - expected;
        Ok(match divisor_gain {
            Some(g) if g.abs() > f64::EPSILON => raw / g,
            _ => raw,
        })
    };

    match compute() {
        Ok(value) => MetricResult::ok("offset_voltage", "Offset Voltage", value, "V", MetricCategory::Amplifier),
        Err(e) => MetricResult::err("offset_voltage", "Offset Voltage", MetricCategory::Amplifier, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, AxisKind, Signal};
    use num_complex::Complex64;

    fn single_pole_data(fu: f64) -> SimulationData {
        let n = 1001;
        let fmin = 1.0;
        let fmax = 1e6;
        let freqs: Vec<f64> = (0..n)
            .map(|i| fmin * (fmax / fmin).powf(i as f64 / (n - 1) as f64))
            .collect();
        let h: Vec<Complex64> = freqs
            .iter()
            .map(|&f| Complex64::new(1000.0, 0.0) / Complex64::new(1.0, f / fu))
            .collect();
        let axis = Axis::new(AxisKind::Frequency, freqs).unwrap();
        SimulationData::new(axis)
            .with_signal("V(out)", Signal::Complex(h))
            .unwrap()
    }

    #[test]
    fn s3_gain_and_bandwidth_scenario() {
        let data = single_pole_data(1000.0);
        let g = gain(&data, "V(out)", None, Some(1000.0));
        assert!((g.value.unwrap() - 56.99).abs() < 0.1);

        let bw = bandwidth(&data, "V(out)", None, None);
        let bw_val = bw.value.unwrap();
        assert!((bw_val - 1000.0).abs() / 1000.0 < 0.01);
    }

    #[test]
    fn phase_margin_of_single_pole_is_90_degrees() {
        let data = single_pole_data(1e6);
        let pm = phase_margin(&data, "V(out)", None);
        assert!((pm.value.unwrap() - 90.0).abs() < 0.5, "{:?}", pm.value);
    }

    #[test]
    fn s4_slew_rate_scenario() {
        let n = 500;
        let t_ramp_end = 5e-6;
        let dt = t_ramp_end / 100.0;
        let mut t = Vec::with_capacity(n);
        let mut v = Vec::with_capacity(n);
        for i in 0..n {
            let ti = i as f64 * dt;
            t.push(ti);
            if ti <= t_ramp_end {
                v.push(1e6 * ti);
            } else {
                v.push(1e6 * t_ramp_end);
            }
        }
        let axis = Axis::new(AxisKind::Time, t).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(v))
            .unwrap();
        let sr = slew_rate_rise(&data, "V(out)", 10.0, 90.0);
        assert!((sr.value.unwrap() - 1.0).abs() < 0.05, "{:?}", sr.value);
    }

    #[test]
    fn gain_fails_cleanly_without_frequency_axis() {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1.0, 2.0]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![1.0, 1.0, 1.0]))
            .unwrap();
        let g = gain(&data, "V(out)", None, None);
        assert!(g.value.is_none());
        assert!(g.error_message.is_some());
    }
}
