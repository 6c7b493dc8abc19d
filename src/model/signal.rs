//! Axis and signal sample types.
//!
//! A signal is an ordered sequence of real or complex scalars of equal
//! length with its axis. Time-domain signals are real; AC-analysis signals
//! are complex, where magnitude and phase carry meaning. The axis is
//! strictly monotonically increasing; any requested real view of a complex
//! signal takes its real part, never an implicit magnitude.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisKind {
    Time,
    Frequency,
}

/// A strictly monotonically increasing independent axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub kind: AxisKind,
    values: Vec<f64>,
}

impl Axis {
    pub fn new(kind: AxisKind, values: Vec<f64>) -> Result<Self> {
        if values.len() < 2 {
            return Err(Error::invalid_input(
                "axis must have at least 2 points",
            ));
        }
        if !values.windows(2).all(|w| w[1] > w[0]) {
            return Err(Error::invalid_input(
                "axis must be strictly monotonically increasing",
            ));
        }
        Ok(Self { kind, values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn range(&self) -> (f64, f64) {
        (self.values[0], self.values[self.values.len() - 1])
    }
}

/// Signal samples: real for time-domain data, complex for AC analyses
/// where magnitude/phase carry meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Signal {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl Signal {
    pub fn len(&self) -> usize {
        match self {
            Signal::Real(v) => v.len(),
            Signal::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Signal::Complex(_))
    }

    /// Real part at every sample. For a real signal this is the signal
    /// itself (copied); for a complex signal, `Re{·}` — never magnitude.
    pub fn real_part(&self) -> Vec<f64> {
        match self {
            Signal::Real(v) => v.clone(),
            Signal::Complex(v) => v.iter().map(|c| c.re).collect(),
        }
    }

    pub fn imag_part(&self) -> Vec<f64> {
        match self {
            Signal::Real(_) => vec![0.0; self.len()],
            Signal::Complex(v) => v.iter().map(|c| c.im).collect(),
        }
    }

    pub fn magnitude(&self) -> Vec<f64> {
        match self {
            Signal::Real(v) => v.iter().map(|x| x.abs()).collect(),
            Signal::Complex(v) => v.iter().map(|c| c.norm()).collect(),
        }
    }

    pub fn phase_deg(&self) -> Vec<f64> {
        match self {
            Signal::Real(v) => v
                .iter()
                .map(|&x| if x >= 0.0 { 0.0 } else { 180.0 })
                .collect(),
            Signal::Complex(v) => v.iter().map(|c| c.arg().to_degrees()).collect(),
        }
    }

    pub fn as_complex(&self) -> Vec<Complex64> {
        match self {
            Signal::Real(v) => v.iter().map(|&x| Complex64::new(x, 0.0)).collect(),
            Signal::Complex(v) => v.clone(),
        }
    }
}
