//! Shared types used throughout the library.

mod transform;

pub use transform::TransformStack;

use crate::error::{ExportError, Result};
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// An 8-bit RGB color as delivered by the host material API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// How a polymesh distributes normals over its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalDistribution {
    /// One normal per point in the point buffer.
    PerVertex,
    /// One normal per facet, indexed by facet position.
    PerFacet,
    /// A single normal for the whole mesh region. Also the fallback when
    /// the host omits distribution metadata entirely.
    #[default]
    Uniform,
}

/// One triangle of a polymesh, indexing into the batch-local buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facet {
    pub v1: usize,
    pub v2: usize,
    pub v3: usize,
}

impl Facet {
    pub fn new(v1: usize, v2: usize, v3: usize) -> Self {
        Self { v1, v2, v3 }
    }
}

/// A batch of triangulated geometry delivered by the host for one mesh
/// region, with point/normal/UV buffers local to the batch.
#[derive(Debug, Clone, Default)]
pub struct Polymesh {
    /// Points in the host's native length unit, untransformed.
    pub points: Vec<DVec3>,
    /// Unit normals; length depends on [`NormalDistribution`].
    pub normals: Vec<DVec3>,
    /// Texture coordinates, one per point.
    pub uvs: Vec<DVec2>,
    /// Triangles indexing into the buffers above.
    pub facets: Vec<Facet>,
    pub normal_distribution: NormalDistribution,
}

impl Polymesh {
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Check that every facet index is in range for the point and UV
    /// buffers and that the normal buffer satisfies its declared
    /// distribution.
    ///
    /// A live host delivers consistent batches, but meshes can also arrive
    /// from scene documents, which the deserializer cannot cross-check.
    pub fn validate(&self) -> Result<()> {
        for (facet_index, facet) in self.facets.iter().enumerate() {
            for corner in [facet.v1, facet.v2, facet.v3] {
                if corner >= self.points.len() {
                    return Err(ExportError::Protocol(format!(
                        "polymesh facet {facet_index} references point {corner} of {}",
                        self.points.len()
                    )));
                }
                if corner >= self.uvs.len() {
                    return Err(ExportError::Protocol(format!(
                        "polymesh facet {facet_index} references uv {corner} of {}",
                        self.uvs.len()
                    )));
                }
                if self.normal_distribution == NormalDistribution::PerVertex
                    && corner >= self.normals.len()
                {
                    return Err(ExportError::Protocol(format!(
                        "polymesh facet {facet_index} references normal {corner} of {}",
                        self.normals.len()
                    )));
                }
            }
        }

        match self.normal_distribution {
            NormalDistribution::PerFacet if self.normals.len() < self.facets.len() => {
                Err(ExportError::Protocol(format!(
                    "polymesh declares per-facet normals but carries {} for {} facets",
                    self.normals.len(),
                    self.facets.len()
                )))
            }
            NormalDistribution::Uniform if self.normals.is_empty() && !self.facets.is_empty() => {
                Err(ExportError::Protocol(
                    "polymesh carries facets but no normals".into(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Material state delivered by the host's per-material hook.
///
/// Only base color and transparency survive into the output; glossiness and
/// appearance assets are accepted for protocol completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialNote {
    /// Host-side material element id, if the material is a real element.
    pub material_id: Option<u64>,
    pub color: Color,
    /// Transparency on the host's 0-100 integer scale.
    pub transparency_percent: u8,
    pub glossiness: i32,
    /// Whether the host reports an overridden appearance for this node.
    pub has_override: bool,
    /// Host-side appearance asset element id. Texture assets are not
    /// exported; this is carried for diagnostics only.
    pub appearance_asset: Option<u64>,
}

impl MaterialNote {
    pub fn opaque(color: Color) -> Self {
        Self {
            material_id: None,
            color,
            transparency_percent: 0,
            glossiness: 0,
            has_override: false,
            appearance_asset: None,
        }
    }
}

/// Reply from a begin-hook telling the host traversal whether to descend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Descend into the node's children.
    Proceed,
    /// Skip the node's subtree.
    Skip,
}
