//! # scene-to-obj
//!
//! A Rust library for exporting depth-first scene-graph traversals to
//! deduplicated, indexed OBJ/MTL text meshes.
//!
//! ## Overview
//!
//! A host CAD/BIM rendering pipeline walks its document once and pushes
//! every event (nested instances, materials, triangulated polymeshes)
//! through the [`SceneVisitor`] callback protocol. [`ObjExporter`] consumes
//! that single stream: it composes the transform stack as the walk
//! descends, deduplicates positions/normals/UVs under a tolerance, tracks
//! material switches inline with the face stream, and on finish writes a
//! geometry file plus a companion material file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use scene_to_obj::{load_scene, walk, ObjExporter};
//!
//! # fn main() -> scene_to_obj::Result<()> {
//! // Load a JSON scene document (or implement the walk yourself
//! // against a live host document).
//! let doc = load_scene("scene.json")?;
//!
//! // One exporter per export run.
//! let mut exporter = ObjExporter::new("scene.obj");
//!
//! // Drive the callback protocol; finish() writes scene.obj + model.mtl.
//! walk(&doc, &mut exporter)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Host Integration
//!
//! To consume a live traversal instead of a scene document, call the
//! [`SceneVisitor`] hooks on an [`ObjExporter`] directly, in the order the
//! host emits them: `start`, begin/end pairs for view, element, instance,
//! link and face, `on_material`/`on_polymesh` for content, then `finish`.

pub mod accumulator;
pub mod dedup;
pub mod error;
pub mod export;
pub mod material;
pub mod scene;
pub mod types;
pub mod visitor;

// Re-export main types for convenience
pub use accumulator::{FaceEntry, MeshAccumulator, VertexRef};
pub use dedup::{DedupTable, PointKey};
pub use error::{ExportError, Result};
pub use export::{geometry_string, material_string, MtlTemplate, MTL_FILE_NAME};
pub use material::{MaterialRecord, MaterialTracker};
pub use scene::{load_scene, scene_from_json, walk, SceneDocument, SceneNode};
pub use types::{
    Action, Color, Facet, MaterialNote, NormalDistribution, Polymesh, TransformStack,
};
pub use visitor::{ExportConfig, ObjExporter, SceneVisitor, MM_PER_FOOT};
