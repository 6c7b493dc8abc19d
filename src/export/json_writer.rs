//! JSON export: `{time|frequency, signals: {name -> array}, metadata}`.
//! Complex signals serialise each sample as `{re, im}`.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::{Signal, SimulationData};

fn signal_to_json(signal: &Signal) -> Value {
    match signal {
        Signal::Real(v) => Value::Array(v.iter().map(|&x| json_number(x)).collect()),
        Signal::Complex(v) => Value::Array(
            v.iter()
                .map(|c| {
                    let mut obj = Map::new();
                    obj.insert("re".to_string(), json_number(c.re));
                    obj.insert("im".to_string(), json_number(c.im));
                    Value::Object(obj)
                })
                .collect(),
        ),
    }
}

fn json_number(x: f64) -> Value {
    serde_json::Number::from_f64(x)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[derive(Serialize)]
struct Metadata {
    signal_count: usize,
    point_count: usize,
}

pub fn write(data: &SimulationData, path: &Path) -> Result<()> {
    let mut root = Map::new();
    root.insert(
        super::axis_name(data).to_string(),
        Value::Array(data.axis.values().iter().map(|&x| json_number(x)).collect()),
    );

    let mut signals = Map::new();
    for name in data.signal_names() {
        signals.insert(name.clone(), signal_to_json(data.get_signal(name).unwrap()));
    }
    root.insert("signals".to_string(), Value::Object(signals));
    root.insert(
        "metadata".to_string(),
        serde_json::to_value(Metadata {
            signal_count: data.signal_count(),
            point_count: data.point_count(),
        })?,
    );

    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &Value::Object(root))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, AxisKind};

    #[test]
    fn writes_time_signals_and_metadata() {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1.0, 2.0]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![0.0, 1.0, 2.0]))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write(&data, &path).unwrap();

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.get("time").is_some());
        assert_eq!(parsed["metadata"]["point_count"], 3);
        assert_eq!(parsed["signals"]["V(out)"][1], 1.0);
    }
}
