//! Streaming accumulation of deduplicated triangle geometry.
//!
//! The accumulator consumes polymesh batches in traversal order and keeps
//! three independent dedup tables (positions, normals, UVs) plus one flat,
//! order-preserving face stream. Material switches are recorded inline in
//! the stream so the serializer can position `usemtl` statements correctly
//! relative to the faces that follow them.

use crate::dedup::{DedupTable, PointKey, NORMAL_UV_TOLERANCE};
use crate::types::{NormalDistribution, Polymesh};
use glam::DMat4;

/// Per-corner indices into the three dedup tables, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexRef {
    pub position: usize,
    pub uv: usize,
    pub normal: usize,
}

/// One entry of the face stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceEntry {
    /// A triangle with three fully-indexed corners.
    Triangle([VertexRef; 3]),
    /// All following triangles use the material encoded by this packed
    /// transparency+RGB value, until the next switch.
    UseMaterial(u32),
}

/// Accumulates deduplicated geometry from a single traversal.
///
/// Points arrive in the host's native length unit and are stored in
/// millimetres (`unit_scale` millimetres per host unit). Buffers of a
/// [`Polymesh`] must be internally consistent: every facet index must be in
/// range for the point and UV buffers, and the normal buffer must satisfy
/// its declared distribution. Callers feeding untrusted batches should run
/// [`Polymesh::validate`] first, as [`ObjExporter`](crate::ObjExporter)
/// does.
#[derive(Debug)]
pub struct MeshAccumulator {
    positions: DedupTable,
    normals: DedupTable,
    uvs: DedupTable,
    faces: Vec<FaceEntry>,
    unit_scale: f64,
}

impl MeshAccumulator {
    pub fn new(unit_scale: f64, position_tolerance_mm: f64) -> Self {
        Self {
            positions: DedupTable::new(position_tolerance_mm),
            normals: DedupTable::new(NORMAL_UV_TOLERANCE),
            uvs: DedupTable::new(NORMAL_UV_TOLERANCE),
            faces: Vec::new(),
            unit_scale,
        }
    }

    /// Dedup and append every facet of `mesh`, transformed by the composed
    /// transform that was current when the host delivered it.
    pub fn add_polymesh(&mut self, mesh: &Polymesh, transform: &DMat4) {
        for (facet_index, facet) in mesh.facets.iter().enumerate() {
            let corners = [facet.v1, facet.v2, facet.v3];

            let positions = corners.map(|c| {
                self.positions
                    .insert(PointKey::from_position(mesh.points[c], transform, self.unit_scale))
            });
            let uvs = corners.map(|c| self.uvs.insert(PointKey::from_uv(mesh.uvs[c])));

            let normals = match mesh.normal_distribution {
                NormalDistribution::PerVertex => corners.map(|c| {
                    self.normals
                        .insert(PointKey::from_vector(mesh.normals[c], transform))
                }),
                NormalDistribution::PerFacet => {
                    let n = self
                        .normals
                        .insert(PointKey::from_vector(mesh.normals[facet_index], transform));
                    [n; 3]
                }
                // Legacy hosts omit distribution metadata; a single shared
                // normal beats failing the whole export.
                NormalDistribution::Uniform => {
                    let n = self
                        .normals
                        .insert(PointKey::from_vector(mesh.normals[0], transform));
                    [n; 3]
                }
            };

            self.faces.push(FaceEntry::Triangle([
                VertexRef {
                    position: positions[0],
                    uv: uvs[0],
                    normal: normals[0],
                },
                VertexRef {
                    position: positions[1],
                    uv: uvs[1],
                    normal: normals[1],
                },
                VertexRef {
                    position: positions[2],
                    uv: uvs[2],
                    normal: normals[2],
                },
            ]));
        }
    }

    /// Record a material switch at the current point of the face stream.
    pub fn push_material_switch(&mut self, packed: u32) {
        self.faces.push(FaceEntry::UseMaterial(packed));
    }

    /// Deduplicated positions in millimetres, index order.
    pub fn positions(&self) -> &DedupTable {
        &self.positions
    }

    pub fn normals(&self) -> &DedupTable {
        &self.normals
    }

    pub fn uvs(&self) -> &DedupTable {
        &self.uvs
    }

    pub fn faces(&self) -> &[FaceEntry] {
        &self.faces
    }

    pub fn triangle_count(&self) -> usize {
        self.faces
            .iter()
            .filter(|f| matches!(f, FaceEntry::Triangle(_)))
            .count()
    }
}
