//! Result Model — the immutable record of one simulation run.
//!
//! `SimulationData` holds one axis and its signals; `SimulationResult` wraps
//! it with identity, timestamp, and (once extracted) a metrics map.
//! `DisplayMetric` is the UI-facing projection with trend tracking. All are
//! produced once by their owning component and are immutable to consumers.

pub mod display_metric;
pub mod signal;
pub mod simulation_data;
pub mod simulation_result;

pub use display_metric::{DisplayMetric, Trend, TrendTracker};
pub use signal::{Axis, AxisKind, Signal};
pub use simulation_data::SimulationData;
pub use simulation_result::{AnalysisKind, SimulationError, SimulationResult};
