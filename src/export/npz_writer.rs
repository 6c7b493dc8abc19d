//! NPZ export: an uncompressed zip of one `.npy` member per array (axis
//! plus each signal), names sanitised the same way as the MAT writer.

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::Result;
use crate::model::SimulationData;

use super::{dedupe_names, sanitize_identifier};

/// A standalone single-field NumPy v1.0 array, the format each NPZ member
/// uses (distinct from [`super::npy_writer`]'s structured array).
fn build_array_npy(values: &[f64]) -> Vec<u8> {
    let header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );
    let mut body = header.into_bytes();
    body.push(b'\n');
    let prefix_len = 10;
    let total = prefix_len + body.len();
    let pad = (64 - total % 64) % 64;
    body.pop();
    body.extend(std::iter::repeat(b' ').take(pad));
    body.push(b'\n');

    let mut out = Vec::new();
    out.extend_from_slice(b"\x93NUMPY");
    out.push(1);
    out.push(0);
    out.write_u16::<LittleEndian>(body.len() as u16).unwrap();
    out.extend_from_slice(&body);
    for &v in values {
        out.write_f64::<LittleEndian>(v).unwrap();
    }
    out
}

pub fn write(data: &SimulationData, path: &Path) -> Result<()> {
    let mut names = vec![super::axis_name(data).to_string()];
    names.extend(data.signal_names().iter().map(|n| sanitize_identifier(n)));
    let names = dedupe_names(&names);

    let mut arrays: Vec<Vec<f64>> = vec![data.axis.values().to_vec()];
    arrays.extend(data.signal_names().iter().map(|n| data.get_signal(n).unwrap().real_part()));

    let file = std::fs::File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options: FileOptions = FileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, values) in names.iter().zip(arrays.iter()) {
        zip.start_file(format!("{name}.npy"), options).map_err(super::io_err)?;
        zip.write_all(&build_array_npy(values))?;
    }
    zip.finish().map_err(super::io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, AxisKind, Signal};

    #[test]
    fn writes_one_member_per_array() {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1.0, 2.0]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![0.0, 1.0, 2.0]))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.npz");
        write(&data, &path).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("time.npy").is_ok());
        assert!(archive.by_name("V_out_.npy").is_ok());
    }
}
