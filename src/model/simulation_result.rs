//! `SimulationResult`: metadata wrapper around one `SimulationData` run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::MetricResult;
use crate::model::simulation_data::SimulationData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    Dc,
    Ac,
    Transient,
    Noise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationError {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Opaque, stable identity — generated once when the result is first
    /// produced, never recomputed from content.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_tag: String,
    pub executor: String,
    pub source_file: String,
    pub analysis_kind: AnalysisKind,
    pub success: bool,
    pub error: Option<SimulationError>,
    pub raw_log: String,
    pub data: SimulationData,
    pub metrics: HashMap<String, MetricResult>,
}

impl SimulationResult {
    pub fn new(
        executor: impl Into<String>,
        source_file: impl Into<String>,
        analysis_kind: AnalysisKind,
        data: SimulationData,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            session_tag: String::new(),
            executor: executor.into(),
            source_file: source_file.into(),
            analysis_kind,
            success: true,
            error: None,
            raw_log: String::new(),
            data,
            metrics: HashMap::new(),
        }
    }

    pub fn with_error(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(SimulationError {
            kind: kind.into(),
            message: message.into(),
        });
        self
    }

    /// A consumer may compare timestamps to decide whether cached derived
    /// data (e.g. a pyramid) is stale relative to another observation.
    pub fn is_newer_than(&self, other: &SimulationResult) -> bool {
        self.timestamp > other.timestamp
    }
}
