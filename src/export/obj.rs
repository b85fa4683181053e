//! Wavefront OBJ/MTL serialization.
//!
//! Consumes the final state of a traversal: the three dedup tables and the
//! face stream, plus the material registry. Geometry goes to the
//! caller-named OBJ file; materials go to a fixed `model.mtl` beside it.
//! All face indices are written 1-based, per the OBJ format.

use crate::accumulator::{FaceEntry, MeshAccumulator};
use crate::error::Result;
use crate::material::{material_key, unpack_color_transparency, MaterialRecord};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed name of the material file, shared by every export.
pub const MTL_FILE_NAME: &str = "model.mtl";

// The axis swap negates components; -0.0 would print with a sign.
fn real(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Statement variant used for each `newmtl` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MtlTemplate {
    /// `d <opacity>` transparency line.
    #[default]
    Transparency,
    /// `Ks`/`Ns` specular pair instead of a transparency line.
    Specular,
}

/// Render the geometry file. Positions are accumulated in millimetres and
/// written in metres, the OBJ family's implied unit here.
pub fn geometry_string(accumulator: &MeshAccumulator) -> String {
    let mut obj = String::with_capacity(
        64 + accumulator.positions().len() * 30
            + accumulator.normals().len() * 30
            + accumulator.uvs().len() * 20
            + accumulator.faces().len() * 40,
    );

    writeln!(obj, "mtllib {}", MTL_FILE_NAME).unwrap();

    for key in accumulator.positions().keys() {
        writeln!(
            obj,
            "v {} {} {}",
            real(key.x / 1000.0),
            real(key.y / 1000.0),
            real(key.z / 1000.0)
        )
        .unwrap();
    }
    for key in accumulator.normals().keys() {
        writeln!(obj, "vn {} {} {}", real(key.x), real(key.y), real(key.z)).unwrap();
    }
    for key in accumulator.uvs().keys() {
        writeln!(obj, "vt {} {}", real(key.x), real(key.y)).unwrap();
    }

    for face in accumulator.faces() {
        match face {
            FaceEntry::UseMaterial(packed) => {
                let (color, transparency) = unpack_color_transparency(*packed);
                writeln!(obj, "usemtl {}", material_key(color, transparency)).unwrap();
            }
            FaceEntry::Triangle(corners) => {
                writeln!(
                    obj,
                    "f {}/{}/{} {}/{}/{} {}/{}/{}",
                    corners[0].position + 1,
                    corners[0].uv + 1,
                    corners[0].normal + 1,
                    corners[1].position + 1,
                    corners[1].uv + 1,
                    corners[1].normal + 1,
                    corners[2].position + 1,
                    corners[2].uv + 1,
                    corners[2].normal + 1,
                )
                .unwrap();
            }
        }
    }

    obj
}

/// Render the material file: one block per registered color/transparency
/// pair, ambient and diffuse equal to the color normalized to [0, 1].
pub fn material_string(records: &[MaterialRecord], template: MtlTemplate) -> String {
    let mut mtl = String::with_capacity(records.len() * 96);

    for record in records {
        let r = f64::from(record.color.red) / 256.0;
        let g = f64::from(record.color.green) / 256.0;
        let b = f64::from(record.color.blue) / 256.0;

        writeln!(mtl, "newmtl {}", record.key).unwrap();
        writeln!(mtl, "Ka {} {} {}", r, g, b).unwrap();
        writeln!(mtl, "Kd {} {} {}", r, g, b).unwrap();
        match template {
            MtlTemplate::Transparency => {
                writeln!(mtl, "d {}", record.opacity).unwrap();
            }
            MtlTemplate::Specular => {
                writeln!(mtl, "Ks 0.0 0.0 0.0").unwrap();
                writeln!(mtl, "Ns 10.0").unwrap();
            }
        }
    }

    mtl
}

/// Write both output files. Either both succeed or the run fails with
/// [`ExportError::Io`](crate::ExportError::Io); a partial geometry file
/// left behind on failure is invalid output.
pub fn write_files(
    obj_path: &Path,
    accumulator: &MeshAccumulator,
    records: &[MaterialRecord],
    template: MtlTemplate,
) -> Result<()> {
    fs::write(obj_path, geometry_string(accumulator))?;

    let mtl_path = match obj_path.parent() {
        Some(dir) => dir.join(MTL_FILE_NAME),
        None => PathBuf::from(MTL_FILE_NAME),
    };
    fs::write(mtl_path, material_string(records, template))?;
    Ok(())
}
