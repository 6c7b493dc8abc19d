//! One dataset, exported through every format the exporter supports.
//! Each format's output is checked for the structural invariants its
//! writer promises, not byte-for-byte equality with a reference file.

use waveform_core::model::{Axis, AxisKind, Signal, SimulationData};
use waveform_core::{export, ExportFormat};

fn sample_data() -> SimulationData {
    let n = 64;
    let t: Vec<f64> = (0..n).map(|i| i as f64 * 1e-6).collect();
    let out: Vec<f64> = t.iter().map(|&ti| (ti * 1e6).sin()).collect();
    let axis = Axis::new(AxisKind::Time, t).unwrap();
    SimulationData::new(axis).with_signal("V(out)", Signal::Real(out)).unwrap()
}

#[test]
fn csv_export_round_trips_through_the_csv_crate() {
    let data = sample_data();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let result = export::export(&data, &path, ExportFormat::Csv).unwrap();
    assert!(result.success);

    let mut reader = csv::ReaderBuilder::new().from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("time"));
    assert_eq!(headers.get(1), Some("V(out)"));
    assert_eq!(reader.records().count(), data.point_count());
}

#[test]
fn json_export_round_trips_through_serde_json() {
    let data = sample_data();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.json");
    export::export(&data, &path, ExportFormat::Json).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed["time"].as_array().unwrap().len(), data.point_count());
    assert_eq!(parsed["signals"]["V(out)"].as_array().unwrap().len(), data.point_count());
}

#[test]
fn npy_export_has_valid_magic_and_aligned_header() {
    let data = sample_data();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.npy");
    export::export(&data, &path, ExportFormat::Npy).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..6], b"\x93NUMPY");
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    assert_eq!((10 + header_len) % 64, 0);
}

#[test]
fn npz_export_contains_one_member_per_array() {
    let data = sample_data();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.npz");
    export::export(&data, &path, ExportFormat::Npz).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.by_name("time.npy").is_ok());
    assert!(archive.by_name("V_out_.npy").is_ok());
}

#[test]
fn mat_export_has_level5_header() {
    let data = sample_data();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.mat");
    export::export(&data, &path, ExportFormat::Mat).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"MATLAB 5.0 MAT-file"));
    assert_eq!(&bytes[126..128], b"MI");
}

#[test]
fn export_dispatches_by_extension_in_the_cli_path() {
    assert_eq!(ExportFormat::from_extension("csv"), Some(ExportFormat::Csv));
    assert_eq!(ExportFormat::from_extension("NPZ"), Some(ExportFormat::Npz));
    assert_eq!(ExportFormat::from_extension("bogus"), None);
}

#[test]
fn export_of_empty_axis_reports_failure_without_panicking() {
    let axis = Axis::new(AxisKind::Time, vec![0.0, 1.0]).unwrap();
    let data = SimulationData::new(axis);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    let result = export::export(&data, &path, ExportFormat::Csv).unwrap();
    assert!(result.success);
    assert_eq!(result.signal_count, 0);
}
