//! Engine-wide tunables, passed explicitly rather than read from a global.
//!
//! Collaborators that need configuration take a `&Config` (or an owned
//! clone) as an argument; nothing in this crate reaches for a singleton.

use crate::metrics::Window;

#[derive(Debug, Clone)]
pub struct Config {
    /// Pyramid level targets, ascending. See [`crate::pyramid::DEFAULT_LEVELS`].
    pub pyramid_levels: Vec<usize>,
    /// Maximum number of `(result_id, signal_name)` pyramids held by the
    /// waveform data service cache.
    pub cache_capacity: usize,
    /// Default FFT window for distortion-family extractions.
    pub default_window: Window,
    /// Default harmonic count for `thd`.
    pub default_harmonics: usize,
    /// Minimum frequency considered when searching for a spectral fundamental.
    pub fundamental_search_floor_hz: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pyramid_levels: crate::pyramid::DEFAULT_LEVELS.to_vec(),
            cache_capacity: 32,
            default_window: Window::Hann,
            default_harmonics: 10,
            fundamental_search_floor_hz: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_pyramid_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.pyramid_levels, crate::pyramid::DEFAULT_LEVELS.to_vec());
        assert_eq!(cfg.cache_capacity, 32);
    }
}
