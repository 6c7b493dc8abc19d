//! MAT export: a minimal MATLAB Level-5 container with one double-array
//! variable per signal plus the axis, each a column vector.
//!
//! Follows the public MAT-file format (level 5) layout: a 128-byte file
//! header, then one `miMATRIX` data element per variable composed of an
//! array-flags, dimensions, name, and real-data subelement, each padded
//! to an 8-byte boundary.

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::Result;
use crate::model::SimulationData;

use super::{dedupe_names, sanitize_identifier};

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;

fn pad_to_8(buf: &mut Vec<u8>) {
    while buf.len() % 8 != 0 {
        buf.push(0);
    }
}

fn write_tagged(buf: &mut Vec<u8>, data_type: u32, payload: &[u8]) {
    buf.write_u32::<LittleEndian>(data_type).unwrap();
    buf.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    buf.extend_from_slice(payload);
    pad_to_8(buf);
}

fn build_matrix(name: &str, values: &[f64]) -> Vec<u8> {
    let mut body = Vec::new();

    let mut flags_payload = Vec::new();
    flags_payload.write_u32::<LittleEndian>(MX_DOUBLE_CLASS).unwrap();
    flags_payload.write_u32::<LittleEndian>(0).unwrap();
    write_tagged(&mut body, MI_UINT32, &flags_payload);

    let mut dims_payload = Vec::new();
    dims_payload.write_i32::<LittleEndian>(values.len() as i32).unwrap();
    dims_payload.write_i32::<LittleEndian>(1).unwrap();
    write_tagged(&mut body, MI_INT32, &dims_payload);

    write_tagged(&mut body, MI_INT8, name.as_bytes());

    let mut data_payload = Vec::with_capacity(values.len() * 8);
    for &v in values {
        data_payload.write_f64::<LittleEndian>(v).unwrap();
    }
    write_tagged(&mut body, MI_DOUBLE, &data_payload);

    let mut element = Vec::new();
    element.write_u32::<LittleEndian>(MI_MATRIX).unwrap();
    element.write_u32::<LittleEndian>(body.len() as u32).unwrap();
    element.extend_from_slice(&body);
    element
}

fn write_header(out: &mut Vec<u8>) {
    let mut text = format!("MATLAB 5.0 MAT-file, waveform-core exporter");
    text.truncate(116);
    let mut header = text.into_bytes();
    header.resize(116, b' ');
    out.extend_from_slice(&header);
    out.extend_from_slice(&[0u8; 8]); // subsystem data offset, unused
    out.write_u16::<LittleEndian>(0x0100).unwrap(); // version
    out.push(b'M');
    out.push(b'I');
}

pub fn write(data: &SimulationData, path: &Path) -> Result<()> {
    let mut names = vec![super::axis_name(data).to_string()];
    names.extend(data.signal_names().iter().map(|n| sanitize_identifier(n)));
    let names = dedupe_names(&names);

    let mut arrays: Vec<Vec<f64>> = vec![data.axis.values().to_vec()];
    arrays.extend(data.signal_names().iter().map(|n| data.get_signal(n).unwrap().real_part()));

    let mut out = Vec::new();
    write_header(&mut out);
    for (name, values) in names.iter().zip(arrays.iter()) {
        out.extend_from_slice(&build_matrix(name, values));
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(&out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, AxisKind, Signal};

    #[test]
    fn writes_header_and_version() {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1.0, 2.0]).unwrap();
        let data = SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![0.0, 1.0, 2.0]))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mat");
        write(&data, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 128);
        assert_eq!(&bytes[126..128], b"MI");
        assert!(bytes.starts_with(b"MATLAB 5.0 MAT-file"));
    }
}
