//! Exporter — writers for CSV, JSON, NumPy-compatible binary, and a
//! MATLAB Level-5 container.
//!
//! Every writer returns an [`ExportResult`] rather than propagating an
//! error past the top-level call: per-format failures (a missing axis, an
//! I/O error) are recorded in the result instead.

pub mod csv_writer;
pub mod json_writer;
pub mod mat_writer;
pub mod npy_writer;
pub mod npz_writer;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::SimulationData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
    Mat,
    Npy,
    Npz,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Mat => "mat",
            ExportFormat::Npy => "npy",
            ExportFormat::Npz => "npz",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext.to_lowercase().as_str() {
            "csv" => ExportFormat::Csv,
            "json" => ExportFormat::Json,
            "mat" => ExportFormat::Mat,
            "npy" => ExportFormat::Npy,
            "npz" => ExportFormat::Npz,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub success: bool,
    pub path: String,
    pub format: ExportFormat,
    pub signal_count: usize,
    pub point_count: usize,
    pub error: Option<String>,
}

impl ExportResult {
    pub fn ok(path: impl Into<PathBuf>, format: ExportFormat, data: &SimulationData) -> Self {
        Self {
            success: true,
            path: path.into().display().to_string(),
            format,
            signal_count: data.signal_count(),
            point_count: data.point_count(),
            error: None,
        }
    }

    pub fn err(path: impl Into<PathBuf>, format: ExportFormat, message: impl Into<String>) -> Self {
        Self {
            success: false,
            path: path.into().display().to_string(),
            format,
            signal_count: 0,
            point_count: 0,
            error: Some(message.into()),
        }
    }
}

/// Sanitises a signal name into a valid MATLAB/NumPy identifier:
/// non-alphanumeric runs collapse to `_`, a non-letter leading character
/// gets a `sig_` prefix, and the result is truncated to 63 characters.
/// Caller handles de-duplication across a whole export (`dedupe_names`).
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || !out.chars().next().unwrap().is_alphabetic() {
        out = format!("sig_{out}");
    }
    out.truncate(63);
    out
}

/// Appends numeric suffixes to duplicate sanitised names so every
/// returned name is unique, preserving input order.
pub fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashMap::new();
    names
        .iter()
        .map(|n| {
            let count = seen.entry(n.clone()).or_insert(0);
            let unique = if *count == 0 { n.clone() } else { format!("{n}_{count}") };
            *count += 1;
            unique
        })
        .collect()
}

pub fn axis_name(data: &SimulationData) -> &'static str {
    match data.axis.kind {
        crate::model::AxisKind::Time => "time",
        crate::model::AxisKind::Frequency => "frequency",
    }
}

pub fn export(data: &SimulationData, path: impl AsRef<Path>, format: ExportFormat) -> Result<ExportResult> {
    let path = path.as_ref();
    if data.point_count() == 0 {
        return Ok(ExportResult::err(path, format, "missing axis data"));
    }
    let result = match format {
        ExportFormat::Csv => csv_writer::write(data, path),
        ExportFormat::Json => json_writer::write(data, path),
        ExportFormat::Mat => mat_writer::write(data, path),
        ExportFormat::Npy => npy_writer::write(data, path),
        ExportFormat::Npz => npz_writer::write(data, path),
    };
    match result {
        Ok(()) => Ok(ExportResult::ok(path, format, data)),
        Err(e) => Ok(ExportResult::err(path, format, e.to_string())),
    }
}

pub(crate) fn io_err(e: impl std::fmt::Display) -> Error {
    Error::IoError(e.to_string())
}
