//! Transient family — rise/fall time, propagation delay, duty cycle,
//! frequency.

use crate::error::{Error, Result};
use crate::metrics::common::{linear_crossing, nearest_index, Direction};
use crate::metrics::result::{MetricCategory, MetricResult};
use crate::model::{AxisKind, SimulationData};

fn transient_axis(data: &SimulationData) -> Result<&[f64]> {
    if data.axis.kind != AxisKind::Time {
        return Err(Error::missing_data("no transient (time-axis) data available"));
    }
    Ok(data.axis.values())
}

fn threshold_pair(y: &[f64], low_pct: f64, high_pct: f64) -> (f64, f64) {
    let ymin = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let ymax = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = ymax - ymin;
    (ymin + span * low_pct / 100.0, ymin + span * high_pct / 100.0)
}

fn edge_time(
    data: &SimulationData,
    signal: &str,
    rising: bool,
    low_pct: f64,
    high_pct: f64,
) -> Result<f64> {
    let axis = transient_axis(data)?;
    let y = data
        .get_signal(signal)
        .ok_or_else(|| Error::missing_data(format!("signal '{signal}' not found")))?
        .real_part();
    let (v_low, v_high) = threshold_pair(&y, low_pct, high_pct);

    if rising {
        let t_low = linear_crossing(axis, &y, v_low, Direction::Up)
            .ok_or_else(|| Error::numeric_failure("no low-threshold crossing found"))?;
        let idx_low = nearest_index(axis, t_low);
        let t_high = linear_crossing(&axis[idx_low..], &y[idx_low..], v_high, Direction::Up)
            .ok_or_else(|| Error::numeric_failure("no high-threshold crossing found"))?;
        Ok(t_high - t_low)
    } else {
        let t_high = linear_crossing(axis, &y, v_high, Direction::Down)
            .ok_or_else(|| Error::numeric_failure("no high-threshold crossing found"))?;
        let idx_high = nearest_index(axis, t_high);
        let t_low = linear_crossing(&axis[idx_high..], &y[idx_high..], v_low, Direction::Down)
            .ok_or_else(|| Error::numeric_failure("no low-threshold crossing found"))?;
        Ok(t_low - t_high)
    }
}

pub fn rise_time(data: &SimulationData, signal: &str, low_pct: f64, high_pct: f64) -> MetricResult {
    match edge_time(data, signal, true, low_pct, high_pct) {
        Ok(value) => MetricResult::ok("rise_time", "Rise Time", value, "s", MetricCategory::Transient)
            .with_condition(format!("{low_pct:.0}%/{high_pct:.0}%")),
        Err(e) => MetricResult::err("rise_time", "Rise Time", MetricCategory::Transient, e.to_string()),
    }
}

pub fn fall_time(data: &SimulationData, signal: &str, low_pct: f64, high_pct: f64) -> MetricResult {
    match edge_time(data, signal, false, low_pct, high_pct) {
        Ok(value) => MetricResult::ok("fall_time", "Fall Time", value, "s", MetricCategory::Transient)
            .with_condition(format!("{low_pct:.0}%/{high_pct:.0}%")),
        Err(e) => MetricResult::err("fall_time", "Fall Time", MetricCategory::Transient, e.to_string()),
    }
}

fn midpoint_crossing(data: &SimulationData, signal: &str, direction: Direction) -> Result<f64> {
    let axis = transient_axis(data)?;
    let y = data
        .get_signal(signal)
        .ok_or_else(|| Error::missing_data(format!("signal '{signal}' not found")))?
        .real_part();
    let ymin = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let ymax = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mid = (ymin + ymax) / 2.0;
    linear_crossing(axis, &y, mid, direction)
        .ok_or_else(|| Error::numeric_failure("no mid-level crossing found"))
}

/// Propagation delay: `input` rising/falling edge to `output`'s crossing
/// of its own 50% level in the corresponding direction. `tp_lh` uses a
/// rising output edge; `tp_hl` uses a falling output edge.
fn propagation_delay(
    data: &SimulationData,
    name: &str,
    display: &str,
    input: &str,
    output: &str,
    output_rising: bool,
) -> MetricResult {
    let compute = || -> Result<f64> {
        let in_dir = if output_rising { Direction::Down } else { Direction::Up };
        let out_dir = if output_rising { Direction::Up } else { Direction::Down };
        let t_in = midpoint_crossing(data, input, in_dir)?;
        let t_out = midpoint_crossing(data, output, out_dir)?;
        let delay = t_out - t_in;
        if delay < 0.0 {
            return Err(Error::numeric_failure("output transitions before input"));
        }
        Ok(delay)
    };

    match compute() {
        Ok(value) => MetricResult::ok(name, display, value, "s", MetricCategory::Transient),
        Err(e) => MetricResult::err(name, display, MetricCategory::Transient, e.to_string()),
    }
}

pub fn propagation_delay_low_to_high(data: &SimulationData, input: &str, output: &str) -> MetricResult {
    propagation_delay(data, "tplh", "Propagation Delay (Low-to-High)", input, output, true)
}

pub fn propagation_delay_high_to_low(data: &SimulationData, input: &str, output: &str) -> MetricResult {
    propagation_delay(data, "tphl", "Propagation Delay (High-to-Low)", input, output, false)
}

/// Fraction of one period spent above the midpoint, over the last full
/// period found in the record.
pub fn duty_cycle(data: &SimulationData, signal: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        let axis = transient_axis(data)?;
        let y = data
            .get_signal(signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{signal}' not found")))?
            .real_part();
        let ymin = y.iter().cloned().fold(f64::INFINITY, f64::min);
        let ymax = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mid = (ymin + ymax) / 2.0;

        let mut rising_edges = Vec::new();
        for i in 0..axis.len().saturating_sub(1) {
            if y[i] <= mid && y[i + 1] > mid {
                rising_edges.push(i);
            }
        }
        if rising_edges.len() < 2 {
            return Err(Error::numeric_failure("fewer than one full period found"));
        }
        let (start, end) = (rising_edges[rising_edges.len() - 2], rising_edges[rising_edges.len() - 1]);
        let period = axis[end] - axis[start];
        if period <= 0.0 {
            return Err(Error::numeric_failure("non-positive period"));
        }
        let high_time: f64 = (start..end)
            .filter(|&i| y[i] > mid)
            .map(|i| axis[i + 1] - axis[i])
            .sum();
        Ok(100.0 * high_time / period)
    };

    match compute() {
        Ok(value) => MetricResult::ok("duty_cycle", "Duty Cycle", value, "%", MetricCategory::Transient),
        Err(e) => MetricResult::err("duty_cycle", "Duty Cycle", MetricCategory::Transient, e.to_string()),
    }
}

/// `1 / period`, the period measured between the last two rising
/// mid-level crossings.
pub fn frequency(data: &SimulationData, signal: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        let axis = transient_axis(data)?;
        let y = data
            .get_signal(signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{signal}' not found")))?
            .real_part();
        let ymin = y.iter().cloned().fold(f64::INFINITY, f64::min);
        let ymax = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mid = (ymin + ymax) / 2.0;

        let mut rising_edges = Vec::new();
        for i in 0..axis.len().saturating_sub(1) {
            if y[i] <= mid && y[i + 1] > mid {
                rising_edges.push(i);
            }
        }
        if rising_edges.len() < 2 {
            return Err(Error::numeric_failure("fewer than one full period found"));
        }
        let (start, end) = (rising_edges[rising_edges.len() - 2], rising_edges[rising_edges.len() - 1]);
        let period = axis[end] - axis[start];
        if period <= 0.0 {
            return Err(Error::numeric_failure("non-positive period"));
        }
        Ok(1.0 / period)
    };

    match compute() {
        Ok(value) => MetricResult::ok("frequency", "Frequency", value, "Hz", MetricCategory::Transient),
        Err(e) => MetricResult::err("frequency", "Frequency", MetricCategory::Transient, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, Signal};

    fn square_wave(freq: f64, n: usize) -> SimulationData {
        let fs = freq * 200.0;
        let t: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        let y: Vec<f64> = t
            .iter()
            .map(|&ti| if (ti * freq).fract() < 0.5 { 0.0 } else { 3.3 })
            .collect();
        let axis = Axis::new(AxisKind::Time, t).unwrap();
        SimulationData::new(axis).with_signal("V(out)", Signal::Real(y)).unwrap()
    }

    #[test]
    fn frequency_recovers_generator_frequency() {
        let data = square_wave(1000.0, 400);
        let m = frequency(&data, "V(out)");
        let v = m.value.unwrap();
        assert!((v - 1000.0).abs() / 1000.0 < 0.05, "f = {v}");
    }

    #[test]
    fn duty_cycle_of_square_wave_is_near_50_percent() {
        let data = square_wave(1000.0, 400);
        let m = duty_cycle(&data, "V(out)");
        let v = m.value.unwrap();
        assert!((v - 50.0).abs() < 5.0, "duty = {v}");
    }

    #[test]
    fn rise_time_fails_cleanly_on_flat_signal() {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![1.0, 1.0, 1.0, 1.0]))
            .unwrap();
        let m = rise_time(&data, "V(out)", 10.0, 90.0);
        assert!(m.value.is_none());
    }
}
