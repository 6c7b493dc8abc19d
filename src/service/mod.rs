//! Waveform Data Service — the viewport-aware façade UI consumers go
//! through for display data, backed by a per-signal pyramid cache.
//!
//! The cache is a [`DashMap`] keyed by `(result_id, signal_name)`. Building
//! a pyramid holds that key's shard lock for the duration, so concurrent
//! requests for the same signal coalesce onto a single build rather than
//! racing; requests for different signals proceed in parallel. Eviction
//! is plain least-recently-used, tracked by a separate order list under a
//! mutex — the hot path (cache hit) never touches it beyond a push-to-back.

use std::collections::VecDeque;
use std::sync::Mutex;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Signal, SimulationResult};
use crate::pyramid::{self, PyramidData};

type CacheKey = (String, String);

#[derive(Debug, Clone)]
pub struct WaveformData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub verbatim: bool,
}

#[derive(Debug, Clone)]
pub struct TableRow {
    pub axis: f64,
    pub values: std::collections::HashMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct TableData {
    pub rows: Vec<TableRow>,
    pub total_rows: usize,
}

pub struct WaveformDataService {
    cache: DashMap<CacheKey, PyramidData>,
    order: Mutex<VecDeque<CacheKey>>,
    capacity: usize,
    levels: Vec<usize>,
}

impl WaveformDataService {
    pub fn new(config: &Config) -> Self {
        Self {
            cache: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity: config.cache_capacity,
            levels: config.pyramid_levels.clone(),
        }
    }

    fn touch(&self, key: &CacheKey) {
        let mut order = self.order.lock().unwrap_or_else(|p| p.into_inner());
        order.retain(|k| k != key);
        order.push_back(key.clone());
    }

    fn evict_if_over_capacity(&self) {
        let mut order = self.order.lock().unwrap_or_else(|p| p.into_inner());
        while order.len() > self.capacity {
            if let Some(victim) = order.pop_front() {
                self.cache.remove(&victim);
            } else {
                break;
            }
        }
    }

    fn pyramid_for(&self, result: &SimulationResult, signal_name: &str) -> Result<PyramidData> {
        let key = (result.id.clone(), signal_name.to_string());
        if let Some(existing) = self.cache.get(&key) {
            let pyr = existing.value().clone();
            drop(existing);
            self.touch(&key);
            return Ok(pyr);
        }

        let signal = result
            .data
            .get_signal(signal_name)
            .ok_or_else(|| Error::missing_data(format!("signal '{signal_name}' not found")))?;
        let x = result.data.axis.values().to_vec();
        let y = signal.real_part();

        let built = match self.cache.entry(key.clone()) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(v) => {
                let pyr = pyramid::build(&x, &y, Some(&self.levels))?;
                v.insert(pyr.clone());
                pyr
            }
        };
        self.touch(&key);
        self.evict_if_over_capacity();
        Ok(built)
    }

    /// Pyramid-backed low-resolution view suitable for first paint.
    pub fn initial_data(
        &self,
        result: &SimulationResult,
        signal_name: &str,
        target_points: usize,
    ) -> Result<WaveformData> {
        let pyr = self.pyramid_for(result, signal_name)?;
        let (x, y, _) = pyramid::get_optimal(&pyr, target_points)?;
        Ok(WaveformData {
            x: x.to_vec(),
            y: y.to_vec(),
            verbatim: pyr.original_points <= target_points,
        })
    }

    /// Windowed downsample: bisect the original axis for the window
    /// bounds; return verbatim if the windowed slice already fits the
    /// point budget, otherwise LTTB the slice directly (not the cached
    /// pyramid, which is built over the full axis).
    pub fn viewport_data(
        &self,
        result: &SimulationResult,
        signal_name: &str,
        x_min: f64,
        x_max: f64,
        target_points: usize,
    ) -> Result<WaveformData> {
        if x_max <= x_min {
            return Err(Error::invalid_input("x_max must be greater than x_min"));
        }
        let signal = result
            .data
            .get_signal(signal_name)
            .ok_or_else(|| Error::missing_data(format!("signal '{signal_name}' not found")))?;
        let axis = result.data.axis.values();
        let y_full = signal.real_part();

        let lo = axis.partition_point(|&v| v < x_min);
        let hi = axis.partition_point(|&v| v <= x_max);
        if lo >= hi {
            return Err(Error::invalid_input("viewport window contains no samples"));
        }

        let x_slice = &axis[lo..hi];
        let y_slice = &y_full[lo..hi];
        if x_slice.len() <= target_points {
            return Ok(WaveformData {
                x: x_slice.to_vec(),
                y: y_slice.to_vec(),
                verbatim: true,
            });
        }

        let (x, y) = crate::downsample::downsample(x_slice, y_slice, target_points)?;
        Ok(WaveformData { x, y, verbatim: false })
    }

    /// Rows of `{axis, {signal → value}}` starting at `start_row`;
    /// out-of-range requests clip to the available tail rather than
    /// erroring.
    pub fn table_data(&self, result: &SimulationResult, start_row: usize, count: usize) -> TableData {
        let axis = result.data.axis.values();
        let total_rows = axis.len();
        if start_row >= total_rows || count == 0 {
            return TableData { rows: Vec::new(), total_rows };
        }

        let end = (start_row + count).min(total_rows);
        let names = result.data.signal_names();
        let columns: Vec<(&String, Vec<f64>)> = names
            .iter()
            .map(|name| {
                let values = match result.data.get_signal(name).unwrap() {
                    Signal::Real(v) => v.clone(),
                    Signal::Complex(v) => v.iter().map(|c| c.re).collect(),
                };
                (name, values)
            })
            .collect();

        let rows = (start_row..end)
            .map(|i| {
                let values = columns
                    .iter()
                    .map(|(name, vals)| ((*name).clone(), vals[i]))
                    .collect();
                TableRow { axis: axis[i], values }
            })
            .collect();

        TableData { rows, total_rows }
    }

    /// Drops cached pyramids for a given result.
    pub fn invalidate(&self, result_id: &str) {
        self.cache.retain(|(rid, _), _| rid != result_id);
        let mut order = self.order.lock().unwrap_or_else(|p| p.into_inner());
        order.retain(|(rid, _)| rid != result_id);
    }
}
