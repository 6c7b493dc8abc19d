//! waveform-core: the numeric engine behind an analog-circuit design
//! assistant.
//!
//! - **Downsampling**: LTTB curve reduction for fast plotting of large
//!   waveform traces ([`downsample`]).
//! - **Pyramid**: multi-resolution caches built once per signal and reused
//!   across viewport changes ([`pyramid`]).
//! - **Model**: the immutable result types — [`model::SimulationData`],
//!   [`model::SimulationResult`], [`model::Signal`].
//! - **Metrics**: the standardised measurement catalogue across amplifier,
//!   noise, distortion, power, and transient families ([`metrics`]).
//! - **Service**: the concurrent cache fronting pyramid/viewport/table
//!   queries ([`service::WaveformDataService`]).
//! - **Eval**: a whitelisted arithmetic expression evaluator over signals
//!   ([`eval::evaluate`]).
//! - **Export**: CSV/JSON/NPY/NPZ/MAT writers ([`export::export`]).

pub mod cancel;
pub mod config;
pub mod downsample;
pub mod error;
pub mod eval;
pub mod export;
pub mod metrics;
pub mod model;
pub mod pyramid;
pub mod service;

pub use cancel::CancellationToken;
pub use config::Config;
pub use error::{Error, Result};
pub use model::{
    AnalysisKind, Axis, AxisKind, DisplayMetric, Signal, SimulationData, SimulationError,
    SimulationResult, Trend, TrendTracker,
};

pub use downsample::{downsample, downsample_multiple};
pub use pyramid::{PyramidData, PyramidLevel};

pub use metrics::{
    available_metrics, extract_all_metrics, extract_metrics, get_metric_by_name, AvailableFamilies,
    MetricCategory, MetricResult, Target, Topology,
};

pub use eval::{evaluate, EvalResult};

pub use export::{export, ExportFormat, ExportResult};

pub use service::{TableData, TableRow, WaveformData, WaveformDataService};
