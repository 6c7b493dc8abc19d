//! NPY export: a single NumPy-compatible structured array with one field
//! per axis/signal, little-endian `f8`, per the NumPy v1.0 format spec.

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::Result;
use crate::model::SimulationData;

use super::{dedupe_names, sanitize_identifier};

/// Builds the dtype descriptor string and the sanitised, de-duplicated
/// field names, axis first.
fn fields(data: &SimulationData) -> (String, Vec<String>) {
    let mut names = vec![super::axis_name(data).to_string()];
    names.extend(data.signal_names().iter().map(|n| sanitize_identifier(n)));
    let names = dedupe_names(&names);

    let descr = names
        .iter()
        .map(|n| format!("('{n}', '<f8')"))
        .collect::<Vec<_>>()
        .join(", ");
    (format!("[{descr}]"), names)
}

pub fn write(data: &SimulationData, path: &Path) -> Result<()> {
    let (descr, field_names) = fields(data);
    let n = data.point_count();
    let header = format!(
        "{{'descr': {descr}, 'fortran_order': False, 'shape': ({n},), }}"
    );

    let mut body = header.into_bytes();
    body.push(b'\n');
    let prefix_len = 10; // magic(6) + version(2) + header_len(2)
    let total = prefix_len + body.len();
    let pad = (64 - total % 64) % 64;
    // Replace the trailing '\n' temporarily to pad with spaces, then restore.
    body.pop();
    body.extend(std::iter::repeat(b' ').take(pad));
    body.push(b'\n');

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"\x93NUMPY");
    out.push(1);
    out.push(0);
    out.write_u16::<LittleEndian>(body.len() as u16).map_err(super::io_err)?;
    out.extend_from_slice(&body);

    let axis = data.axis.values();
    let columns: Vec<Vec<f64>> = field_names[1..]
        .iter()
        .zip(data.signal_names())
        .map(|(_, n)| data.get_signal(n).unwrap().real_part())
        .collect();

    for row in 0..n {
        out.write_f64::<LittleEndian>(axis[row]).map_err(super::io_err)?;
        for col in &columns {
            out.write_f64::<LittleEndian>(col[row]).map_err(super::io_err)?;
        }
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(&out)?;
    Ok(())
}
