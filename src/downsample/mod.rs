//! Largest-Triangle-Three-Buckets (LTTB) downsampling.
//!
//! Sveinn Steinarsson, "Downsampling Time Series for Visual Representation"
//! (2013). Partitions the input (excluding the first and last points) into
//! `n - 2` buckets and picks, from each bucket, the point that maximises the
//! area of the triangle formed with the previously-selected point and the
//! average of the *next* bucket. The first and last input points are always
//! emitted. `downsample_multiple` generalises this to several signals
//! sharing an axis by picking, per bucket, the index maximising the sum of
//! areas across all signals, so every signal is downsampled at the same
//! axis positions.

use std::collections::BTreeMap;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};

fn validate(x: &[f64], y_len: usize, n: usize) -> Result<()> {
    if x.len() != y_len {
        return Err(Error::invalid_input(format!(
            "x and y must have the same length, got {} and {}",
            x.len(),
            y_len
        )));
    }
    if n < 2 {
        return Err(Error::invalid_input(format!(
            "target_points must be >= 2, got {n}"
        )));
    }
    if x.is_empty() {
        return Err(Error::invalid_input("x and y cannot be empty"));
    }
    if !x.windows(2).all(|w| w[1] > w[0]) {
        return Err(Error::invalid_input("x must be strictly monotonically increasing"));
    }
    Ok(())
}

/// Bucket boundaries shared between the single- and multi-signal variants:
/// `(bucket_start, bucket_end, next_bucket_start, next_bucket_end)` for
/// bucket `i` of `n - 2`, over an input of length `len`.
fn bucket_bounds(len: usize, n: usize, i: usize) -> (usize, usize, usize, usize) {
    let bucket_size = (len - 2) as f64 / (n - 2) as f64;
    let bucket_start = (i as f64 * bucket_size) as usize + 1;
    let bucket_end = (((i + 1) as f64 * bucket_size) as usize + 1).min(len - 1);
    let next_start = bucket_end;
    let next_end = (((i + 2) as f64 * bucket_size) as usize + 1).min(len);
    (bucket_start, bucket_end, next_start, next_end)
}

fn triangle_area(px: f64, py: f64, x: f64, y: f64, ax: f64, ay: f64) -> f64 {
    (px * (y - ay) + x * (ay - py) + ax * (py - y)).abs()
}

/// Downsamples one signal. Returns a copy unchanged if `len(x) <= n`.
pub fn downsample(x: &[f64], y: &[f64], n: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    downsample_cancellable(x, y, n, &CancellationToken::new())
}

pub fn downsample_cancellable(
    x: &[f64],
    y: &[f64],
    n: usize,
    cancel: &CancellationToken,
) -> Result<(Vec<f64>, Vec<f64>)> {
    validate(x, y.len(), n)?;

    let len = x.len();
    if len <= n {
        return Ok((x.to_vec(), y.to_vec()));
    }
    if n == 2 {
        return Ok((vec![x[0], x[len - 1]], vec![y[0], y[len - 1]]));
    }

    let mut x_out = Vec::with_capacity(n);
    let mut y_out = Vec::with_capacity(n);
    x_out.push(x[0]);
    y_out.push(y[0]);

    let mut prev_idx = 0usize;
    for bucket_idx in 0..(n - 2) {
        cancel.check()?;
        let (start, end, next_start, next_end) = bucket_bounds(len, n, bucket_idx);

        let (avg_x, avg_y) = if next_end > next_start {
            let count = (next_end - next_start) as f64;
            let sx: f64 = x[next_start..next_end].iter().sum();
            let sy: f64 = y[next_start..next_end].iter().sum();
            (sx / count, sy / count)
        } else {
            (x[len - 1], y[len - 1])
        };

        let (prev_x, prev_y) = (x[prev_idx], y[prev_idx]);
        let mut best_area = -1.0f64;
        let mut best_idx = start;
        for i in start..end {
            let area = triangle_area(prev_x, prev_y, x[i], y[i], avg_x, avg_y);
            if area > best_area {
                best_area = area;
                best_idx = i;
            }
        }

        x_out.push(x[best_idx]);
        y_out.push(y[best_idx]);
        prev_idx = best_idx;
    }

    x_out.push(x[len - 1]);
    y_out.push(y[len - 1]);

    Ok((x_out, y_out))
}

/// Downsamples several signals sharing an axis, choosing per-bucket the
/// index that maximises the **sum** of triangle areas across all signals,
/// so every signal's output shares the same axis positions.
pub fn downsample_multiple(
    x: &[f64],
    signals: &BTreeMap<String, Vec<f64>>,
    n: usize,
) -> Result<(Vec<f64>, BTreeMap<String, Vec<f64>>)> {
    downsample_multiple_cancellable(x, signals, n, &CancellationToken::new())
}

pub fn downsample_multiple_cancellable(
    x: &[f64],
    signals: &BTreeMap<String, Vec<f64>>,
    n: usize,
    cancel: &CancellationToken,
) -> Result<(Vec<f64>, BTreeMap<String, Vec<f64>>)> {
    if signals.is_empty() {
        return Err(Error::invalid_input("signals map cannot be empty"));
    }
    for (name, y) in signals {
        validate(x, y.len(), n).map_err(|e| {
            Error::invalid_input(format!("signal '{name}': {e}"))
        })?;
    }

    let len = x.len();
    let names: Vec<&String> = signals.keys().collect();

    if len <= n {
        let out_x = x.to_vec();
        let out = signals.clone();
        return Ok((out_x, out));
    }
    if n == 2 {
        let out_x = vec![x[0], x[len - 1]];
        let out = signals
            .iter()
            .map(|(k, v)| (k.clone(), vec![v[0], v[len - 1]]))
            .collect();
        return Ok((out_x, out));
    }

    let mut x_out = Vec::with_capacity(n);
    let mut y_outs: BTreeMap<String, Vec<f64>> = names
        .iter()
        .map(|n| ((*n).clone(), Vec::with_capacity(n.len())))
        .collect();
    x_out.push(x[0]);
    for name in &names {
        y_outs.get_mut(*name).unwrap().push(signals[*name][0]);
    }

    let mut prev_idx = 0usize;
    for bucket_idx in 0..(n - 2) {
        cancel.check()?;
        let (start, end, next_start, next_end) = bucket_bounds(len, n, bucket_idx);

        let avg_x;
        let mut avg_ys: BTreeMap<&String, f64> = BTreeMap::new();
        if next_end > next_start {
            let count = (next_end - next_start) as f64;
            avg_x = x[next_start..next_end].iter().sum::<f64>() / count;
            for name in &names {
                let s: f64 = signals[*name][next_start..next_end].iter().sum();
                avg_ys.insert(name, s / count);
            }
        } else {
            avg_x = x[len - 1];
            for name in &names {
                avg_ys.insert(name, signals[*name][len - 1]);
            }
        }

        let prev_x = x[prev_idx];
        let mut best_total = -1.0f64;
        let mut best_idx = start;
        for i in start..end {
            let mut total = 0.0;
            for name in &names {
                let prev_y = signals[*name][prev_idx];
                total += triangle_area(prev_x, prev_y, x[i], signals[*name][i], avg_x, avg_ys[name]);
            }
            if total > best_total {
                best_total = total;
                best_idx = i;
            }
        }

        x_out.push(x[best_idx]);
        for name in &names {
            y_outs.get_mut(*name).unwrap().push(signals[*name][best_idx]);
        }
        prev_idx = best_idx;
    }

    x_out.push(x[len - 1]);
    for name in &names {
        y_outs.get_mut(*name).unwrap().push(signals[*name][len - 1]);
    }

    Ok((x_out, y_outs))
}
