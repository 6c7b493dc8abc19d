//! Concurrent access to the waveform data service: same-signal requests
//! from multiple threads must coalesce onto one cache entry and agree on
//! the result; different signals proceed independently.

use std::sync::Arc;
use std::thread;

use waveform_core::model::{Axis, AxisKind, AnalysisKind, Signal, SimulationData, SimulationResult};
use waveform_core::{Config, WaveformDataService};

fn big_result(n: usize) -> SimulationResult {
    let x: Vec<f64> = (0..n).map(|i| i as f64 * 1e-7).collect();
    let out: Vec<f64> = x.iter().map(|&t| (t * 2e5).sin()).collect();
    let aux: Vec<f64> = x.iter().map(|&t| (t * 4e5).cos()).collect();
    let axis = Axis::new(AxisKind::Time, x).unwrap();
    let data = SimulationData::new(axis)
        .with_signal("V(out)", Signal::Real(out))
        .unwrap()
        .with_signal("V(aux)", Signal::Real(aux))
        .unwrap();
    SimulationResult::new("spice", "trace.cir", AnalysisKind::Transient, data)
}

#[test]
fn concurrent_requests_for_the_same_signal_coalesce_and_agree() {
    let service = Arc::new(WaveformDataService::new(&Config::default()));
    let result = Arc::new(big_result(200_000));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let result = Arc::clone(&result);
            thread::spawn(move || service.initial_data(&result, "V(out)", 500).unwrap())
        })
        .collect();

    let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = &outputs[0];
    for wf in &outputs[1..] {
        assert_eq!(wf.x, first.x);
        assert_eq!(wf.y, first.y);
    }
}

#[test]
fn distinct_signals_build_independent_cache_entries() {
    let service = WaveformDataService::new(&Config::default());
    let result = big_result(50_000);

    let out = service.initial_data(&result, "V(out)", 200).unwrap();
    let aux = service.initial_data(&result, "V(aux)", 200).unwrap();
    assert_ne!(out.y, aux.y);
}

#[test]
fn invalidate_forces_a_fresh_build_for_the_same_result_id() {
    let service = WaveformDataService::new(&Config::default());
    let result = big_result(20_000);

    let first = service.initial_data(&result, "V(out)", 100).unwrap();
    service.invalidate(&result.id);
    let second = service.initial_data(&result, "V(out)", 100).unwrap();
    assert_eq!(first.x, second.x);
}
