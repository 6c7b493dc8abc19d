//! Noise family — input/output noise density, integrated noise, noise
//! figure, SNR, corner frequency, equivalent noise bandwidth.
//!
//! Signal lookups go through [`SimulationData::get_input_noise`] /
//! [`get_output_noise`] so callers don't need to know a simulator's exact
//! noise-signal naming convention.

use crate::error::{Error, Result};
use crate::metrics::common::{nearest_index, trapz};
use crate::metrics::result::{MetricCategory, MetricResult};
use crate::model::{AxisKind, SimulationData};

fn noise_axis(data: &SimulationData) -> Result<&[f64]> {
    if data.axis.kind != AxisKind::Frequency {
        return Err(Error::missing_data("no AC (frequency-axis) data available"));
    }
    Ok(data.axis.values())
}

fn density_at(data: &SimulationData, signal: &str, f: Option<f64>, input: bool) -> Result<(f64, f64)> {
    let axis = noise_axis(data)?;
    let s = if input {
        data.get_input_noise(signal)
    } else {
        data.get_output_noise(signal)
    }
    .ok_or_else(|| Error::missing_data(format!("noise signal '{signal}' not found")))?;
    let mag = s.magnitude();
    let idx = match f {
        Some(target) => nearest_index(axis, target),
        None => axis.len() / 2,
    };
    Ok((mag[idx], axis[idx]))
}

pub fn input_noise(data: &SimulationData, signal: &str, f: Option<f64>) -> MetricResult {
    match density_at(data, signal, f, true) {
        Ok((value, _)) => {
            MetricResult::ok("input_noise", "Input-Referred Noise", value, "V/sqrt(Hz)", MetricCategory::Noise)
        }
        Err(e) => MetricResult::err("input_noise", "Input-Referred Noise", MetricCategory::Noise, e.to_string()),
    }
}

pub fn output_noise(data: &SimulationData, signal: &str, f: Option<f64>) -> MetricResult {
    match density_at(data, signal, f, false) {
        Ok((value, _)) => {
            MetricResult::ok("output_noise", "Output-Referred Noise", value, "V/sqrt(Hz)", MetricCategory::Noise)
        }
        Err(e) => MetricResult::err("output_noise", "Output-Referred Noise", MetricCategory::Noise, e.to_string()),
    }
}

/// RMS noise integrated over `[f_lo, f_hi]` (default the full swept band)
/// of the noise-density-squared curve.
pub fn integrated_noise(
    data: &SimulationData,
    signal: &str,
    input: bool,
    f_lo: Option<f64>,
    f_hi: Option<f64>,
) -> MetricResult {
    let name = if input { "integrated_input_noise" } else { "integrated_output_noise" };
    let display = if input { "Integrated Input Noise" } else { "Integrated Output Noise" };

    let compute = || -> Result<f64> {
        let axis = noise_axis(data)?;
        let s = if input {
            data.get_input_noise(signal)
        } else {
            data.get_output_noise(signal)
        }
        .ok_or_else(|| Error::missing_data(format!("noise signal '{signal}' not found")))?;
        let mag = s.magnitude();
        let power: Vec<f64> = mag.iter().map(|m| m * m).collect();

        let lo = f_lo.unwrap_or(axis[0]);
        let hi = f_hi.unwrap_or(axis[axis.len() - 1]);
        let lo_idx = nearest_index(axis, lo);
        let hi_idx = nearest_index(axis, hi).max(lo_idx + 1).min(axis.len() - 1);

        let area = trapz(&axis[lo_idx..=hi_idx], &power[lo_idx..=hi_idx]);
        if area < 0.0 {
            return Err(Error::numeric_failure("negative integrated power"));
        }
        Ok(area.sqrt())
    };

    match compute() {
        Ok(value) => MetricResult::ok(name, display, value, "V", MetricCategory::Noise),
        Err(e) => MetricResult::err(name, display, MetricCategory::Noise, e.to_string()),
    }
}

/// Boltzmann constant, J/K.
const K_BOLTZMANN: f64 = 1.380649e-23;

/// `F = 1 + Vn^2 / (4 k T Rs)`, `NF = 10*log10(F)`, where `Vn` is the
/// input-referred noise density at `f` and `4 k T Rs` is the source
/// resistor's thermal noise power density. `NF` is always `>= 0 dB`.
pub fn noise_figure(
    data: &SimulationData,
    input_noise_signal: &str,
    source_resistance: f64,
    temperature: f64,
    f: Option<f64>,
) -> MetricResult {
    let compute = || -> Result<f64> {
        if source_resistance <= 0.0 {
            return Err(Error::invalid_input("source_resistance must be positive"));
        }
        if temperature <= 0.0 {
            return Err(Error::invalid_input("temperature must be positive"));
        }
        let (vn_density, _) = density_at(data, input_noise_signal, f, true)?;
        let thermal_floor_power = 4.0 * K_BOLTZMANN * temperature * source_resistance;
        let noise_factor = 1.0 + (vn_density * vn_density) / thermal_floor_power;
        Ok(10.0 * noise_factor.log10())
    };

    match compute() {
        Ok(value) => MetricResult::ok("noise_figure", "Noise Figure", value, "dB", MetricCategory::Noise)
            .with_condition(format!("Rs={source_resistance:.0}Ω, T={temperature:.0}K")),
        Err(e) => MetricResult::err("noise_figure", "Noise Figure", MetricCategory::Noise, e.to_string()),
    }
}

pub fn snr(data: &SimulationData, signal_rms: f64, output_signal: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        let noise_rms = integrated_noise(data, output_signal, false, None, None)
            .value
            .ok_or_else(|| Error::numeric_failure("integrated output noise unavailable"))?;
        if noise_rms < f64::EPSILON {
            return Err(Error::numeric_failure("noise floor near zero"));
        }
        Ok(20.0 * (signal_rms / noise_rms).log10())
    };

    match compute() {
        Ok(value) => MetricResult::ok("snr", "Signal-to-Noise Ratio", value, "dB", MetricCategory::Noise),
        Err(e) => MetricResult::err("snr", "Signal-to-Noise Ratio", MetricCategory::Noise, e.to_string()),
    }
}

/// The frequency at which 1/f noise density equals the white-noise floor
/// (the mean of the top quartile of the swept band, by frequency).
pub fn corner_frequency(data: &SimulationData, signal: &str, input: bool) -> MetricResult {
    let name = "corner_frequency";
    let display = "Noise Corner Frequency";

    let compute = || -> Result<f64> {
        let axis = noise_axis(data)?;
        let s = if input {
            data.get_input_noise(signal)
        } else {
            data.get_output_noise(signal)
        }
        .ok_or_else(|| Error::missing_data(format!("noise signal '{signal}' not found")))?;
        let mag = s.magnitude();

        let floor_start = axis.len() - (axis.len() / 4).max(1);
        let floor: f64 =
            mag[floor_start..].iter().sum::<f64>() / (axis.len() - floor_start) as f64;
        if floor <= 0.0 {
            return Err(Error::numeric_failure("white-noise floor is non-positive"));
        }

        for i in 0..axis.len() {
            if mag[i] <= floor * std::f64::consts::SQRT_2 {
                return Ok(axis[i]);
            }
        }
        Err(Error::numeric_failure("no corner found; curve is flat or rising"))
    };

    match compute() {
        Ok(value) => MetricResult::ok(name, display, value, "Hz", MetricCategory::Noise),
        Err(e) => MetricResult::err(name, display, MetricCategory::Noise, e.to_string()),
    }
}

/// `ENBW = integral(|H(f)|^2 df) / |H(f0)|^2`, `f0` the peak-gain
/// frequency, for a noise-shaping transfer curve given directly as
/// `signal`.
pub fn equivalent_noise_bandwidth(data: &SimulationData, signal: &str) -> MetricResult {
    let compute = || -> Result<f64> {
        let axis = noise_axis(data)?;
        let s = data
            .get_signal(signal)
            .ok_or_else(|| Error::missing_data(format!("signal '{signal}' not found")))?;
        let mag = s.magnitude();
        let power: Vec<f64> = mag.iter().map(|m| m * m).collect();
        let peak = power.iter().cloned().fold(0.0, f64::max);
        if peak <= 0.0 {
            return Err(Error::numeric_failure("zero peak power"));
        }
        Ok(trapz(axis, &power) / peak)
    };

    match compute() {
        Ok(value) => {
            MetricResult::ok("equivalent_noise_bandwidth", "Equivalent Noise Bandwidth", value, "Hz", MetricCategory::Noise)
        }
        Err(e) => MetricResult::err(
            "equivalent_noise_bandwidth",
            "Equivalent Noise Bandwidth",
            MetricCategory::Noise,
            e.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, AxisKind, Signal};

    fn noise_data() -> SimulationData {
        let n = 200;
        let freqs: Vec<f64> = (0..n).map(|i| 1.0 * 10f64.powf(i as f64 / 20.0)).collect();
        let floor = 10e-9;
        let corner = 1000.0;
        let density: Vec<f64> = freqs
            .iter()
            .map(|&f| floor * (1.0 + corner / f).sqrt())
            .collect();
        let axis = Axis::new(AxisKind::Frequency, freqs).unwrap();
        SimulationData::new(axis)
            .with_signal("onoise_total", Signal::Real(density))
            .unwrap()
    }

    fn inoise_data(density: f64) -> SimulationData {
        let freqs = vec![100.0, 1000.0, 10_000.0];
        let axis = Axis::new(AxisKind::Frequency, freqs.clone()).unwrap();
        SimulationData::new(axis)
            .with_signal("inoise_total", Signal::Real(vec![density; freqs.len()]))
            .unwrap()
    }

    #[test]
    fn noise_figure_is_never_negative_even_below_the_thermal_floor() {
        // Amplifier input noise far below a 50ohm/290K thermal floor: the
        // correct F = 1 + tiny stays just above 1, so NF stays near 0 dB,
        // never dips negative the way `10*log10(ratio)` without the `1 +`
        // term would for a sub-floor numerator.
        let data = inoise_data(1e-12);
        let m = noise_figure(&data, "inoise", 50.0, 290.0, Some(1000.0));
        let nf = m.value.unwrap();
        assert!(nf >= 0.0, "noise figure must be >= 0 dB, got {nf}");
        assert!(nf < 0.1, "noise figure should be near the 0 dB floor, got {nf}");
    }

    #[test]
    fn noise_figure_rises_once_input_noise_dominates_the_thermal_floor() {
        let data = inoise_data(1e-6);
        let m = noise_figure(&data, "inoise", 50.0, 290.0, Some(1000.0));
        assert!(m.value.unwrap() > 20.0);
    }

    #[test]
    fn integrated_noise_is_positive_and_finite() {
        let data = noise_data();
        let m = integrated_noise(&data, "onoise", false, None, None);
        let v = m.value.unwrap();
        assert!(v.is_finite() && v > 0.0);
    }

    #[test]
    fn corner_frequency_is_in_swept_band() {
        let data = noise_data();
        let m = corner_frequency(&data, "onoise", false);
        let v = m.value.unwrap();
        assert!(v > data.axis.values()[0] && v < *data.axis.values().last().unwrap());
    }

    #[test]
    fn noise_lookup_fails_cleanly_for_unknown_signal() {
        let data = noise_data();
        let m = input_noise(&data, "inoise", None);
        assert!(m.value.is_none());
        assert!(m.error_message.is_some());
    }
}
