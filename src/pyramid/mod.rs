//! Resolution Pyramid — a per-signal cache of fixed-size downsamples.
//!
//! Built once per signal and held by the waveform data service; never
//! persisted (the original data already lives in the simulation result).
//! Levels are stored ascending by actual point count so [`select_optimal`]
//! can do a single forward scan.

use crate::cancel::CancellationToken;
use crate::downsample::downsample_cancellable;
use crate::error::{Error, Result};

pub const DEFAULT_LEVELS: [usize; 4] = [500, 2_000, 10_000, 50_000];

#[derive(Debug, Clone)]
pub struct PyramidLevel {
    pub target_points: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PyramidLevel {
    pub fn actual_points(&self) -> usize {
        self.x.len()
    }
}

#[derive(Debug, Clone)]
pub struct PyramidData {
    pub original_points: usize,
    pub levels: Vec<PyramidLevel>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl PyramidData {
    pub fn level_points(&self) -> Vec<usize> {
        self.levels.iter().map(PyramidLevel::actual_points).collect()
    }
}

/// Builds a pyramid for `(x, y)` at the given levels (deduplicated, sorted
/// ascending, levels `<= 1` rejected; empty/`None` falls back to
/// [`DEFAULT_LEVELS`]).
pub fn build(x: &[f64], y: &[f64], levels: Option<&[usize]>) -> Result<PyramidData> {
    build_cancellable(x, y, levels, &CancellationToken::new())
}

pub fn build_cancellable(
    x: &[f64],
    y: &[f64],
    levels: Option<&[usize]>,
    cancel: &CancellationToken,
) -> Result<PyramidData> {
    if x.is_empty() || y.is_empty() {
        return Err(Error::invalid_input("x and y cannot be empty"));
    }
    if x.len() != y.len() {
        return Err(Error::invalid_input("x and y must have the same length"));
    }

    let mut levels: Vec<usize> = match levels {
        Some(lv) if !lv.is_empty() => lv.to_vec(),
        _ => DEFAULT_LEVELS.to_vec(),
    };
    levels.sort_unstable();
    levels.dedup();
    levels.retain(|&lv| lv > 1);
    if levels.is_empty() {
        return Err(Error::invalid_input(
            "no valid pyramid levels specified (all must be > 1)",
        ));
    }

    let original_points = x.len();
    let x_range = (
        x.iter().cloned().fold(f64::INFINITY, f64::min),
        x.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );
    let y_range = (
        y.iter().cloned().fold(f64::INFINITY, f64::min),
        y.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );

    let mut pyramid_levels = Vec::with_capacity(levels.len());
    for target_points in levels {
        cancel.check()?;
        let (lx, ly) = if original_points <= target_points {
            (x.to_vec(), y.to_vec())
        } else {
            downsample_cancellable(x, y, target_points, cancel)?
        };
        pyramid_levels.push(PyramidLevel {
            target_points,
            x: lx,
            y: ly,
        });
    }

    Ok(PyramidData {
        original_points,
        levels: pyramid_levels,
        x_range,
        y_range,
    })
}

/// Smallest level index with `actual_points >= required`, or the last
/// index if none qualifies.
pub fn select_optimal(pyramid: &PyramidData, required: usize) -> Result<usize> {
    if pyramid.levels.is_empty() {
        return Err(Error::invalid_input("pyramid has no levels"));
    }
    if required < 1 {
        return Err(Error::invalid_input("required_points must be >= 1"));
    }
    for (i, level) in pyramid.levels.iter().enumerate() {
        if level.actual_points() >= required {
            return Ok(i);
        }
    }
    Ok(pyramid.levels.len() - 1)
}

pub fn get_level(pyramid: &PyramidData, index: usize) -> Result<(&[f64], &[f64])> {
    pyramid
        .levels
        .get(index)
        .map(|l| (l.x.as_slice(), l.y.as_slice()))
        .ok_or_else(|| {
            Error::invalid_input(format!(
                "level_index {index} out of range [0, {}]",
                pyramid.levels.len().saturating_sub(1)
            ))
        })
}

pub fn get_optimal(pyramid: &PyramidData, required: usize) -> Result<(&[f64], &[f64], usize)> {
    let idx = select_optimal(pyramid, required)?;
    let (x, y) = get_level(pyramid, idx)?;
    Ok((x, y, idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| (v / 100.0).sin()).collect();
        (x, y)
    }

    #[test]
    fn levels_satisfy_actual_le_target() {
        let (x, y) = make(1_000_000);
        let pyr = build(&x, &y, None).unwrap();
        for level in &pyr.levels {
            assert!(level.actual_points() <= level.target_points);
            assert_eq!(level.actual_points(), level.x.len());
            assert_eq!(level.actual_points(), level.y.len());
        }
    }

    #[test]
    fn levels_sorted_ascending_by_actual_points() {
        let (x, y) = make(1_000_000);
        let pyr = build(&x, &y, None).unwrap();
        let pts = pyr.level_points();
        assert!(pts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn s2_pyramid_selection_scenario() {
        let (x, y) = make(1_000_000);
        let pyr = build(&x, &y, None).unwrap();
        assert_eq!(pyr.level_points(), vec![500, 2000, 10000, 50000]);
        assert_eq!(select_optimal(&pyr, 1500).unwrap(), 1);
        assert_eq!(select_optimal(&pyr, 100_000).unwrap(), 3);
    }

    #[test]
    fn small_input_is_held_verbatim_at_every_level() {
        let (x, y) = make(10);
        let pyr = build(&x, &y, Some(&[500, 2000])).unwrap();
        for level in &pyr.levels {
            assert_eq!(level.actual_points(), 10);
            assert_eq!(level.x, x);
        }
    }

    #[test]
    fn first_and_last_axis_points_preserved_at_every_level() {
        let (x, y) = make(1_000_000);
        let pyr = build(&x, &y, None).unwrap();
        for level in &pyr.levels {
            assert_eq!(level.x[0], x[0]);
            assert_eq!(*level.x.last().unwrap(), *x.last().unwrap());
        }
    }

    #[test]
    fn rejects_levels_all_invalid() {
        let (x, y) = make(100);
        assert!(build(&x, &y, Some(&[0, 1])).is_err());
    }

    #[test]
    fn dedups_and_sorts_levels() {
        let (x, y) = make(1_000_000);
        let pyr = build(&x, &y, Some(&[2000, 500, 500, 10000])).unwrap();
        assert_eq!(pyr.level_points(), vec![500, 2000, 10000]);
    }
}
