//! CSV export: axis column first, then signals in insertion order.
//! Real part only — complex signals are written as `Re{·}`, matching the
//! "real view" rule (§3).

use std::path::Path;

use crate::error::Result;
use crate::model::SimulationData;

pub fn write(data: &SimulationData, path: &Path) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;

    let names = data.signal_names();
    let mut header = vec![super::axis_name(data).to_string()];
    header.extend(names.iter().cloned());
    wtr.write_record(&header)?;

    let axis = data.axis.values();
    let columns: Vec<Vec<f64>> = names
        .iter()
        .map(|n| data.get_signal(n).unwrap().real_part())
        .collect();

    for (row, &t) in axis.iter().enumerate() {
        let mut record = vec![format_number(t)];
        for col in &columns {
            record.push(format_number(col[row]));
        }
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(super::io_err)?;
    Ok(())
}

/// Integers print bare (`1` not `1.0`); everything else uses Rust's
/// shortest round-trippable decimal form, which carries full precision.
/// The scenario's exact textual shape ("1e-06" vs. "0.000001") is
/// implementation latitude per §8 S6 — only column structure is fixed.
fn format_number(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
