//! Power family — quiescent current, power consumption, efficiency, line
//! and load regulation, dropout voltage.

use crate::error::{Error, Result};
use crate::metrics::common::format_current;
use crate::metrics::result::{MetricCategory, MetricResult};
use crate::model::SimulationData;

fn mean_abs(y: &[f64]) -> f64 {
    y.iter().map(|v| v.abs()).sum::<f64>() / y.len() as f64
}

pub fn quiescent_current(data: &SimulationData, supply_signal: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        let i = data
            .get_supply_current(supply_signal)
            .ok_or_else(|| Error::missing_data(format!("supply current signal '{supply_signal}' not found")))?
            .real_part();
        Ok(mean_abs(&i))
    };

    match compute() {
        Ok(value) => MetricResult::ok("quiescent_current", "Quiescent Current", value, "A", MetricCategory::Power)
            .with_condition(format_current(value)),
        Err(e) => MetricResult::err("quiescent_current", "Quiescent Current", MetricCategory::Power, e.to_string()),
    }
}

pub fn power_consumption(data: &SimulationData, supply_signal: &str, supply_voltage: f64) -> MetricResult {
    let compute = || -> Result<f64> {
        if supply_voltage <= 0.0 {
            return Err(Error::invalid_input("supply_voltage must be positive"));
        }
        let i = data
            .get_supply_current(supply_signal)
            .ok_or_else(|| Error::missing_data(format!("supply current signal '{supply_signal}' not found")))?
            .real_part();
        Ok(mean_abs(&i) * supply_voltage)
    };

    match compute() {
        Ok(value) => MetricResult::ok("power_consumption", "Power Consumption", value, "W", MetricCategory::Power),
        Err(e) => MetricResult::err("power_consumption", "Power Consumption", MetricCategory::Power, e.to_string()),
    }
}

/// `Pout / (Pout + Pin)`, where `Pin = Vin * Iin` and `Pout = Vout * Iout`.
pub fn efficiency(
    data: &SimulationData,
    input_voltage_signal: &str,
    input_current_signal: &str,
    output_voltage_signal: &str,
    output_current_signal: &str,
) -> MetricResult {
    let compute = || -> Result<f64> {
        let vin = mean_abs(
            &data
                .get_signal(input_voltage_signal)
                .ok_or_else(|| Error::missing_data(format!("signal '{input_voltage_signal}' not found")))?
                .real_part(),
        );
        let iin = mean_abs(
            &data
                .get_signal(input_current_signal)
                .ok_or_else(|| Error::missing_data(format!("signal '{input_current_signal}' not found")))?
                .real_part(),
        );
        let vout = mean_abs(
            &data
                .get_signal(output_voltage_signal)
                .ok_or_else(|| Error::missing_data(format!("signal '{output_voltage_signal}' not found")))?
                .real_part(),
        );
        let iout = mean_abs(
            &data
                .get_signal(output_current_signal)
                .ok_or_else(|| Error::missing_data(format!("signal '{output_current_signal}' not found")))?
                .real_part(),
        );
        let p_in = vin * iin;
        if p_in <= 0.0 {
            return Err(Error::numeric_failure("zero input power"));
        }
        Ok(100.0 * (vout * iout) / p_in)
    };

    match compute() {
        Ok(value) => MetricResult::ok("efficiency", "Power Efficiency", value, "%", MetricCategory::Power),
        Err(e) => MetricResult::err("efficiency", "Power Efficiency", MetricCategory::Power, e.to_string()),
    }
}

/// Efficiency sampled at several load-current set points, for plotting an
/// efficiency-vs-load curve. `loads` are `(output_current_signal, label)`
/// pairs the caller has already arranged as distinct sweep points.
pub fn efficiency_curve(
    data: &SimulationData,
    input_voltage_signal: &str,
    input_current_signal: &str,
    output_voltage_signal: &str,
    loads: &[(&str, &str)],
) -> Vec<(String, MetricResult)> {
    loads
        .iter()
        .map(|&(current_signal, label)| {
            (
                label.to_string(),
                efficiency(
                    data,
                    input_voltage_signal,
                    input_current_signal,
                    output_voltage_signal,
                    current_signal,
                ),
            )
        })
        .collect()
}

/// `dVout / dIload` over the full swept load range, in mV/A.
pub fn load_regulation(data: &SimulationData, output_voltage_signal: &str, load_current_signal: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        let v = data
            .get_signal(output_voltage_signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{output_voltage_signal}' not found")))?
            .real_part();
        let i = data
            .get_signal(load_current_signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{load_current_signal}' not found")))?
            .real_part();
        let (v_min, v_max) = (
            v.iter().cloned().fold(f64::INFINITY, f64::min),
            v.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        );
        let (i_min, i_max) = (
            i.iter().cloned().fold(f64::INFINITY, f64::min),
            i.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        );
        let di = i_max - i_min;
        if di.abs() < f64::EPSILON {
            return Err(Error::numeric_failure("zero load current span"));
        }
        Ok(1000.0 * (v_max - v_min) / di)
    };

    match compute() {
        Ok(value) => MetricResult::ok("load_regulation", "Load Regulation", value, "mV/A", MetricCategory::Power),
        Err(e) => MetricResult::err("load_regulation", "Load Regulation", MetricCategory::Power, e.to_string()),
    }
}

/// `dVout / dVin` over the full swept input range, in mV/V.
pub fn line_regulation(data: &SimulationData, output_voltage_signal: &str, input_voltage_signal: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        let vout = data
            .get_signal(output_voltage_signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{output_voltage_signal}' not found")))?
            .real_part();
        let vin = data
            .get_signal(input_voltage_signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{input_voltage_signal}' not found")))?
            .real_part();
        let (vout_min, vout_max) = (
            vout.iter().cloned().fold(f64::INFINITY, f64::min),
            vout.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        );
        let (vin_min, vin_max) = (
            vin.iter().cloned().fold(f64::INFINITY, f64::min),
            vin.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        );
        let dvin = vin_max - vin_min;
        if dvin.abs() < f64::EPSILON {
            return Err(Error::numeric_failure("zero input voltage span"));
        }
        Ok(1000.0 * (vout_max - vout_min) / dvin)
    };

    match compute() {
        Ok(value) => MetricResult::ok("line_regulation", "Line Regulation", value, "mV/V", MetricCategory::Power),
        Err(e) => MetricResult::err("line_regulation", "Line Regulation", MetricCategory::Power, e.to_string()),
    }
}

/// The input-output differential at which the regulator drops out of
/// regulation, taken as `Vin - Vout` at the lowest `Vin` sample where
/// `Vout` still tracks within `tolerance_pct` of its regulated value.
pub fn dropout_voltage(
    data: &SimulationData,
    input_voltage_signal: &str,
    output_voltage_signal: &str,
    regulated_voltage: f64,
    tolerance_pct: f64,
) -> MetricResult {
    let compute = || -> Result<f64> {
        let vin = data
            .get_signal(input_voltage_signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{input_voltage_signal}' not found")))?
            .real_part();
        let vout = data
            .get_signal(output_voltage_signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{output_voltage_signal}' not found")))?
            .real_part();
        let band = regulated_voltage.abs() * tolerance_pct / 100.0;

        let mut best: Option<f64> = None;
        for (vi, vo) in vin.iter().zip(vout.iter()) {
            if (vo - regulated_voltage).abs() <= band {
                best = Some(match best {
                    Some(b) => b.min(*vi),
                    None => *vi,
                });
            }
        }
        let vin_min_in_regulation =
            best.ok_or_else(|| Error::numeric_failure("output never settles within tolerance of target"))?;
        Ok(vin_min_in_regulation - regulated_voltage)
    };

    match compute() {
        Ok(value) => MetricResult::ok("dropout_voltage", "Dropout Voltage", value, "V", MetricCategory::Power),
        Err(e) => MetricResult::err("dropout_voltage", "Dropout Voltage", MetricCategory::Power, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, AxisKind, Signal};

    fn regulator_data() -> SimulationData {
        let n = 50;
        let vin: Vec<f64> = (0..n).map(|i| 2.0 + i as f64 * 0.1).collect();
        let vout: Vec<f64> = vin
            .iter()
            .map(|&v| if v >= 3.2 { 3.0 } else { 3.0 - (3.2 - v) * 2.0 })
            .collect();
        let axis = Axis::new(AxisKind::Time, (0..n).map(|i| i as f64 * 1e-6).collect()).unwrap();
        SimulationData::new(axis)
            .with_signal("V(in)", Signal::Real(vin))
            .unwrap()
            .with_signal("V(out)", Signal::Real(vout))
            .unwrap()
    }

    #[test]
    fn dropout_voltage_detects_regulation_edge() {
        let data = regulator_data();
        let m = dropout_voltage(&data, "V(in)", "V(out)", 3.0, 1.0);
        let v = m.value.unwrap();
        assert!(v > 0.0 && v < 1.0, "dropout = {v}");
    }

    #[test]
    fn quiescent_current_fails_without_supply_signal() {
        let data = regulator_data();
        let m = quiescent_current(&data, "I(VDD)");
        assert!(m.value.is_none());
    }
}
