//! Distortion family — THD, THD+N, IMD, SFDR, SNDR, ENOB, and the harmonic
//! table they're built from.
//!
//! Single-tone metrics share an FFT front end: window the transient record,
//! plan a forward real FFT with `rustfft`, take the one-sided magnitude
//! spectrum, and locate the fundamental by peak search with parabolic
//! refinement (see [`super::common::parabolic_refine`]).

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::error::{Error, Result};
use crate::metrics::common::{mean_dt, parabolic_refine};
use crate::metrics::result::{MetricCategory, MetricResult};
use crate::model::{AxisKind, SimulationData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
}

impl Default for Window {
    fn default() -> Self {
        Window::Hann
    }
}

/// Applies the window to `samples`, returning the windowed signal and the
/// window's DC gain (`mean(weights)`), which the spectrum must be
/// normalised by in addition to the usual `2/N` scaling.
fn apply_window(samples: &[f64], window: Window) -> (Vec<f64>, f64) {
    let n = samples.len();
    if n < 2 {
        return (samples.to_vec(), 1.0);
    }
    let nf = (n - 1) as f64;
    let weights: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64 / nf;
            match window {
                Window::Rectangular => 1.0,
                Window::Hann => 0.5 - 0.5 * (2.0 * std::f64::consts::PI * t).cos(),
                Window::Hamming => 0.54 - 0.46 * (2.0 * std::f64::consts::PI * t).cos(),
                Window::Blackman => {
                    0.42 - 0.5 * (2.0 * std::f64::consts::PI * t).cos()
                        + 0.08 * (4.0 * std::f64::consts::PI * t).cos()
                }
            }
        })
        .collect();
    let win_gain = weights.iter().sum::<f64>() / n as f64;
    let windowed = samples.iter().zip(&weights).map(|(&s, &w)| s * w).collect();
    (windowed, win_gain)
}

struct Spectrum {
    magnitudes: Vec<f64>,
    freq_resolution: f64,
}

fn transient_axis(data: &SimulationData) -> Result<&[f64]> {
    if data.axis.kind != AxisKind::Time {
        return Err(Error::missing_data("no transient (time-axis) data available"));
    }
    Ok(data.axis.values())
}

fn spectrum_of(data: &SimulationData, signal: &str, window: Window) -> Result<Spectrum> {
    let axis = transient_axis(data)?;
    let y = data
        .get_signal(signal)
        .ok_or_else(|| Error::missing_data(format!("signal '{signal}' not found")))?
        .real_part();
    if y.len() < 256 {
        return Err(Error::invalid_input("at least 256 samples are required for spectral analysis"));
    }

    let dt = mean_dt(axis);
    if dt <= 0.0 {
        return Err(Error::numeric_failure("non-positive mean sample spacing"));
    }
    let sample_rate = 1.0 / dt;

    let (windowed, win_gain) = apply_window(&y, window);
    let n = windowed.len().next_power_of_two();
    let mut buffer: Vec<Complex64> = windowed.iter().map(|&s| Complex64::new(s, 0.0)).collect();
    buffer.resize(n, Complex64::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft: Arc<dyn Fft<f64>> = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let n_positive = n / 2 + 1;
    let freq_resolution = sample_rate / n as f64;
    let scale = 2.0 / n as f64 / win_gain;
    let magnitudes: Vec<f64> = buffer[..n_positive]
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let m = c.norm() * scale;
            if i == 0 || i == n_positive - 1 {
                m / 2.0
            } else {
                m
            }
        })
        .collect();

    Ok(Spectrum { magnitudes, freq_resolution })
}

/// `(bin, frequency, refined_amplitude)` of the tallest bin above index 0
/// (DC excluded), refined with a three-point parabolic fit.
fn find_fundamental(spectrum: &Spectrum) -> Result<(usize, f64, f64)> {
    let (bin, _) = spectrum.magnitudes[1..]
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, &v)| (i + 1, v))
        .ok_or_else(|| Error::numeric_failure("empty spectrum"))?;
    let (refined_bin, refined_amp) = parabolic_refine(&spectrum.magnitudes, bin);
    Ok((bin, refined_bin * spectrum.freq_resolution, refined_amp))
}

/// Bin indices of the fundamental's integer harmonics up to `count`,
/// skipping bins that fall outside the spectrum.
fn harmonic_bins(spectrum: &Spectrum, fundamental_bin: usize, count: usize) -> Vec<usize> {
    (2..=count + 1)
        .map(|k| fundamental_bin * k)
        .take_while(|&b| b < spectrum.magnitudes.len())
        .collect()
}

/// Fundamental amplitude (reported as `value`, in volts) plus, for each
/// `k` in `2..=k`, `20*log10(|H_k|/|H_1|)` in dBc — recorded in
/// `metadata` as `h{k}_dbc` alongside the harmonic's frequency as
/// `h{k}_freq_hz`, since a [`MetricResult`] carries a single scalar
/// value and this operation produces a table.
pub fn harmonics(data: &SimulationData, signal: &str, window: Window, k: usize) -> MetricResult {
    let compute = || -> Result<(f64, f64, Vec<(usize, f64, f64)>)> {
        let spectrum = spectrum_of(data, signal, window)?;
        let (fund_bin, fund_freq, fund_amp) = find_fundamental(&spectrum)?;

        let mut table = Vec::new();
        for order in 2..=k {
            let bin = fund_bin * order;
            if bin >= spectrum.magnitudes.len() {
                break;
            }
            let amp = spectrum.magnitudes[bin];
            let dbc = if fund_amp > 1e-12 {
                20.0 * (amp / fund_amp + 1e-30).log10()
            } else {
                -120.0
            };
            table.push((order, bin as f64 * spectrum.freq_resolution, dbc));
        }
        Ok((fund_freq, fund_amp, table))
    };

    match compute() {
        Ok((fund_freq, fund_amp, table)) => {
            let mut m = MetricResult::ok("harmonics", "Fundamental Amplitude", fund_amp, "V", MetricCategory::Distortion)
                .with_condition(format!("f={}", crate::metrics::common::format_frequency(fund_freq)));
            for (order, freq, dbc) in table {
                m = m
                    .with_metadata(format!("h{order}_dbc"), format!("{dbc:.6}"))
                    .with_metadata(format!("h{order}_freq_hz"), format!("{freq:.6}"));
            }
            m
        }
        Err(e) => MetricResult::err("harmonics", "Fundamental Amplitude", MetricCategory::Distortion, e.to_string()),
    }
}

pub fn thd(data: &SimulationData, signal: &str, window: Window, harmonics: usize) -> MetricResult {
    let compute = || -> Result<f64> {
        let spectrum = spectrum_of(data, signal, window)?;
        let (fund_bin, _, fund_amp) = find_fundamental(&spectrum)?;
        if fund_amp <= 0.0 {
            return Err(Error::numeric_failure("zero-amplitude fundamental"));
        }
        let harmonic_power: f64 = harmonic_bins(&spectrum, fund_bin, harmonics)
            .iter()
            .map(|&b| spectrum.magnitudes[b].powi(2))
            .sum();
        Ok(100.0 * harmonic_power.sqrt() / fund_amp)
    };

    match compute() {
        Ok(value) => MetricResult::ok("thd", "Total Harmonic Distortion", value, "%", MetricCategory::Distortion),
        Err(e) => MetricResult::err("thd", "Total Harmonic Distortion", MetricCategory::Distortion, e.to_string()),
    }
}

pub fn thd_n(data: &SimulationData, signal: &str, window: Window) -> MetricResult {
    let compute = || -> Result<f64> {
        let spectrum = spectrum_of(data, signal, window)?;
        let (fund_bin, _, fund_amp) = find_fundamental(&spectrum)?;
        if fund_amp <= 0.0 {
            return Err(Error::numeric_failure("zero-amplitude fundamental"));
        }
        let total_power: f64 = spectrum.magnitudes.iter().map(|m| m * m).sum();
        let fund_power = fund_amp * fund_amp;
        let rest = (total_power - fund_power).max(0.0);
        let _ = fund_bin;
        Ok(100.0 * rest.sqrt() / fund_amp)
    };

    match compute() {
        Ok(value) => MetricResult::ok("thd_n", "Total Harmonic Distortion + Noise", value, "%", MetricCategory::Distortion),
        Err(e) => MetricResult::err("thd_n", "Total Harmonic Distortion + Noise", MetricCategory::Distortion, e.to_string()),
    }
}

/// Two-tone IMD: `20 log10(max(2f1-f2, 2f2-f1 bin) / fundamental)`.
pub fn imd(data: &SimulationData, signal: &str, f1: f64, f2: f64, window: Window) -> MetricResult {
    let compute = || -> Result<f64> {
        let spectrum = spectrum_of(data, signal, window)?;
        let bin_of = |f: f64| (f / spectrum.freq_resolution).round() as usize;
        let b1 = bin_of(f1).min(spectrum.magnitudes.len() - 1);
        let b2 = bin_of(f2).min(spectrum.magnitudes.len() - 1);
        let fund_amp = spectrum.magnitudes[b1].max(spectrum.magnitudes[b2]);
        if fund_amp <= 0.0 {
            return Err(Error::numeric_failure("zero-amplitude tones"));
        }

        let candidates = [2.0 * f1 - f2, 2.0 * f2 - f1];
        let spur = candidates
            .iter()
            .filter(|&&f| f > 0.0)
            .map(|&f| {
                let b = bin_of(f).min(spectrum.magnitudes.len() - 1);
                spectrum.magnitudes[b]
            })
            .fold(0.0, f64::max);

        Ok(20.0 * (spur / fund_amp).max(1e-12).log10())
    };

    match compute() {
        Ok(value) => MetricResult::ok("imd", "Intermodulation Distortion", value, "dBc", MetricCategory::Distortion),
        Err(e) => MetricResult::err("imd", "Intermodulation Distortion", MetricCategory::Distortion, e.to_string()),
    }
}

pub fn sfdr(data: &SimulationData, signal: &str, window: Window) -> MetricResult {
    let compute = || -> Result<f64> {
        let spectrum = spectrum_of(data, signal, window)?;
        let (fund_bin, _, fund_amp) = find_fundamental(&spectrum)?;
        if fund_amp <= 0.0 {
            return Err(Error::numeric_failure("zero-amplitude fundamental"));
        }
        let guard = 3usize;
        let spur = spectrum
            .magnitudes
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != 0 && fund_bin.abs_diff(i) > guard)
            .map(|(_, &m)| m)
            .fold(0.0, f64::max);
        if spur <= 0.0 {
            return Ok(120.0);
        }
        Ok((20.0 * (fund_amp / spur).log10()).min(120.0))
    };

    match compute() {
        Ok(value) => MetricResult::ok("sfdr", "Spurious-Free Dynamic Range", value, "dBc", MetricCategory::Distortion),
        Err(e) => MetricResult::err("sfdr", "Spurious-Free Dynamic Range", MetricCategory::Distortion, e.to_string()),
    }
}

pub fn sndr(data: &SimulationData, signal: &str, window: Window) -> MetricResult {
    let compute = || -> Result<f64> {
        let spectrum = spectrum_of(data, signal, window)?;
        let (_, _, fund_amp) = find_fundamental(&spectrum)?;
        let fund_power = fund_amp * fund_amp;
        let total_power: f64 = spectrum.magnitudes.iter().map(|m| m * m).sum();
        let rest = (total_power - fund_power).max(1e-24);
        Ok(10.0 * (fund_power / rest).log10())
    };

    match compute() {
        Ok(value) => MetricResult::ok("sndr", "Signal-to-Noise-and-Distortion Ratio", value, "dB", MetricCategory::Distortion),
        Err(e) => MetricResult::err("sndr", "Signal-to-Noise-and-Distortion Ratio", MetricCategory::Distortion, e.to_string()),
    }
}

/// `ENOB = (SNDR_dB - 1.76) / 6.02`.
pub fn enob(data: &SimulationData, signal: &str, window: Window) -> MetricResult {
    let sndr_m = sndr(data, signal, window);
    match sndr_m.value {
        Some(sndr_db) => {
            let value = ((sndr_db - 1.76) / 6.02).max(0.0);
            MetricResult::ok("enob", "Effective Number of Bits", value, "bits", MetricCategory::Distortion)
        }
        None => MetricResult::err(
            "enob",
            "Effective Number of Bits",
            MetricCategory::Distortion,
            Error::DependencyFailure {
                metric: "enob".into(),
                cause: sndr_m.error_message.unwrap_or_else(|| "sndr failed".into()),
            }
            .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, Signal};

    fn tone_data(f0: f64, harmonic_amp_ratio: f64) -> SimulationData {
        let fs = 1_000_000.0;
        let n = 8192;
        let t: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        let y: Vec<f64> = t
            .iter()
            .map(|&ti| {
                (2.0 * std::f64::consts::PI * f0 * ti).sin()
                    + harmonic_amp_ratio * (2.0 * std::f64::consts::PI * 2.0 * f0 * ti).sin()
            })
            .collect();
        let axis = Axis::new(AxisKind::Time, t).unwrap();
        SimulationData::new(axis).with_signal("V(out)", Signal::Real(y)).unwrap()
    }

    #[test]
    fn s5_thd_of_tone_scenario() {
        let data = tone_data(10_000.0, 0.01);
        let m = thd(&data, "V(out)", Window::Hann, 5);
        let v = m.value.unwrap();
        assert!((v - 1.0).abs() < 0.3, "thd = {v}");
    }

    #[test]
    fn pure_tone_has_low_thd() {
        let data = tone_data(10_000.0, 0.0);
        let m = thd(&data, "V(out)", Window::Hann, 5);
        assert!(m.value.unwrap() < 0.5);
    }

    #[test]
    fn enob_identity_matches_sndr() {
        let data = tone_data(10_000.0, 0.001);
        let sndr_m = sndr(&data, "V(out)", Window::Hann);
        let enob_m = enob(&data, "V(out)", Window::Hann);
        let expected = (sndr_m.value.unwrap() - 1.76) / 6.02;
        assert!((enob_m.value.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn fails_cleanly_on_dc_axis() {
        let axis = Axis::new(AxisKind::Frequency, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![0.0, 1.0, 0.0, -1.0]))
            .unwrap();
        let m = thd(&data, "V(out)", Window::Hann, 5);
        assert!(m.value.is_none());
    }

    #[test]
    fn spectral_front_end_rejects_records_shorter_than_256_points() {
        let fs = 1_000_000.0;
        let n = 200;
        let t: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        let y: Vec<f64> = t.iter().map(|&ti| (2.0 * std::f64::consts::PI * 10_000.0 * ti).sin()).collect();
        let axis = Axis::new(AxisKind::Time, t).unwrap();
        let data = SimulationData::new(axis).with_signal("V(out)", Signal::Real(y)).unwrap();

        let m = thd(&data, "V(out)", Window::Hann, 5);
        assert!(m.value.is_none());
        assert!(m.error_message.unwrap().contains("256"));
    }

    #[test]
    fn harmonics_reports_fundamental_amplitude_and_second_harmonic_dbc() {
        let data = tone_data(10_000.0, 0.01);
        let m = harmonics(&data, "V(out)", Window::Hann, 5);
        let fund_amp = m.value.unwrap();
        assert!((fund_amp - 1.0).abs() < 0.2, "fundamental amplitude = {fund_amp}");

        let h2_dbc: f64 = m.metadata["h2_dbc"].parse().unwrap();
        let expected_dbc = 20.0 * 0.01f64.log10();
        assert!((h2_dbc - expected_dbc).abs() < 4.0, "h2_dbc = {h2_dbc}, expected ~{expected_dbc}");
    }
}
