//! JSON scene documents and the synchronous depth-first driver.
//!
//! A [`SceneDocument`] stands in for the host's document handle: a tree of
//! elements, nested instances/links with affine transforms, material notes
//! and triangulated meshes. [`walk`] drives any [`SceneVisitor`] through it
//! in the exact protocol order a host traversal engine uses. The CLI and
//! the integration tests both go through this driver.

use crate::error::Result;
use crate::types::{Action, Color, Facet, MaterialNote, NormalDistribution, Polymesh};
use crate::visitor::SceneVisitor;
use glam::{DMat4, DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root of a scene document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// One host element, the unit the traversal reports begin/end around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: u64,
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
}

/// An affine transform as basis vectors plus origin, identity by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformDef {
    #[serde(default = "unit_x")]
    pub basis_x: [f64; 3],
    #[serde(default = "unit_y")]
    pub basis_y: [f64; 3],
    #[serde(default = "unit_z")]
    pub basis_z: [f64; 3],
    #[serde(default)]
    pub origin: [f64; 3],
}

fn unit_x() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}
fn unit_y() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}
fn unit_z() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

impl Default for TransformDef {
    fn default() -> Self {
        Self {
            basis_x: unit_x(),
            basis_y: unit_y(),
            basis_z: unit_z(),
            origin: [0.0, 0.0, 0.0],
        }
    }
}

impl TransformDef {
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_cols(
            DVec4::new(self.basis_x[0], self.basis_x[1], self.basis_x[2], 0.0),
            DVec4::new(self.basis_y[0], self.basis_y[1], self.basis_y[2], 0.0),
            DVec4::new(self.basis_z[0], self.basis_z[1], self.basis_z[2], 0.0),
            DVec4::new(self.origin[0], self.origin[1], self.origin[2], 1.0),
        )
    }
}

/// A material note in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDef {
    #[serde(default)]
    pub id: Option<u64>,
    pub color: [u8; 3],
    #[serde(default)]
    pub transparency: u8,
    #[serde(default)]
    pub glossiness: i32,
}

impl MaterialDef {
    fn to_note(&self) -> MaterialNote {
        MaterialNote {
            material_id: self.id,
            color: Color::new(self.color[0], self.color[1], self.color[2]),
            transparency_percent: self.transparency,
            glossiness: self.glossiness,
            has_override: false,
            appearance_asset: None,
        }
    }
}

/// A triangulated mesh batch in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshDef {
    pub points: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    #[serde(default)]
    pub uvs: Vec<[f64; 2]>,
    pub facets: Vec<[usize; 3]>,
    #[serde(default)]
    pub normal_distribution: NormalDistribution,
}

impl MeshDef {
    fn to_polymesh(&self) -> Polymesh {
        Polymesh {
            points: self.points.iter().map(|p| DVec3::from_array(*p)).collect(),
            normals: self.normals.iter().map(|n| DVec3::from_array(*n)).collect(),
            uvs: self.uvs.iter().map(|uv| DVec2::from_array(*uv)).collect(),
            facets: self
                .facets
                .iter()
                .map(|f| Facet::new(f[0], f[1], f[2]))
                .collect(),
            normal_distribution: self.normal_distribution,
        }
    }
}

/// One node of the scene tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneNode {
    Instance {
        #[serde(default)]
        transform: TransformDef,
        #[serde(default)]
        nodes: Vec<SceneNode>,
    },
    Link {
        #[serde(default)]
        transform: TransformDef,
        #[serde(default)]
        nodes: Vec<SceneNode>,
    },
    Face {
        #[serde(default)]
        nodes: Vec<SceneNode>,
    },
    Material(MaterialDef),
    Mesh(MeshDef),
    Light,
    Rpc,
    DaylightPortal,
}

/// Load a scene document from a JSON file.
pub fn load_scene(path: impl AsRef<Path>) -> Result<SceneDocument> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Parse a scene document from a JSON string.
pub fn scene_from_json(json: &str) -> Result<SceneDocument> {
    Ok(serde_json::from_str(json)?)
}

/// Drive `visitor` through `document` in host protocol order:
/// start, view begin, per element begin/content/end, view end, finish.
///
/// Begin hooks answering [`Action::Skip`] have their subtree elided but
/// their matching end hook still fires, so transform pushes stay balanced.
/// The cancellation query is polled between elements, mirroring the host.
pub fn walk(document: &SceneDocument, visitor: &mut impl SceneVisitor) -> Result<()> {
    if !visitor.start() {
        return Ok(());
    }

    if visitor.on_view_begin() == Action::Proceed {
        for element in &document.elements {
            if visitor.is_cancelled() {
                break;
            }
            if visitor.on_element_begin(element.id) == Action::Proceed {
                walk_nodes(&element.nodes, visitor);
            }
            visitor.on_element_end(element.id);
        }
    }
    visitor.on_view_end();

    visitor.finish()
}

fn walk_nodes(nodes: &[SceneNode], visitor: &mut impl SceneVisitor) {
    for node in nodes {
        match node {
            SceneNode::Instance { transform, nodes } => {
                if visitor.on_instance_begin(transform.to_matrix()) == Action::Proceed {
                    walk_nodes(nodes, visitor);
                }
                visitor.on_instance_end();
            }
            SceneNode::Link { transform, nodes } => {
                if visitor.on_link_begin(transform.to_matrix()) == Action::Proceed {
                    walk_nodes(nodes, visitor);
                }
                visitor.on_link_end();
            }
            SceneNode::Face { nodes } => {
                if visitor.on_face_begin() == Action::Proceed {
                    walk_nodes(nodes, visitor);
                }
                visitor.on_face_end();
            }
            SceneNode::Material(def) => visitor.on_material(&def.to_note()),
            SceneNode::Mesh(def) => visitor.on_polymesh(&def.to_polymesh()),
            SceneNode::Light => visitor.on_light(),
            SceneNode::Rpc => visitor.on_rpc(),
            SceneNode::DaylightPortal => visitor.on_daylight_portal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::visitor::SceneVisitor;

    /// Records hook names to assert protocol order.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl SceneVisitor for Recorder {
        fn start(&mut self) -> bool {
            self.events.push("start".into());
            true
        }
        fn is_cancelled(&self) -> bool {
            false
        }
        fn on_view_begin(&mut self) -> Action {
            self.events.push("view_begin".into());
            Action::Proceed
        }
        fn on_view_end(&mut self) {
            self.events.push("view_end".into());
        }
        fn on_element_begin(&mut self, id: u64) -> Action {
            self.events.push(format!("element_begin {id}"));
            Action::Proceed
        }
        fn on_element_end(&mut self, id: u64) {
            self.events.push(format!("element_end {id}"));
        }
        fn on_instance_begin(&mut self, _transform: DMat4) -> Action {
            self.events.push("instance_begin".into());
            Action::Proceed
        }
        fn on_instance_end(&mut self) {
            self.events.push("instance_end".into());
        }
        fn on_link_begin(&mut self, _transform: DMat4) -> Action {
            self.events.push("link_begin".into());
            Action::Proceed
        }
        fn on_link_end(&mut self) {
            self.events.push("link_end".into());
        }
        fn on_material(&mut self, _note: &MaterialNote) {
            self.events.push("material".into());
        }
        fn on_polymesh(&mut self, _mesh: &Polymesh) {
            self.events.push("polymesh".into());
        }
        fn finish(&mut self) -> Result<()> {
            self.events.push("finish".into());
            Ok(())
        }
    }

    const SCENE_JSON: &str = r#"{
        "elements": [
            {
                "id": 42,
                "nodes": [
                    {
                        "type": "instance",
                        "transform": { "origin": [1.0, 2.0, 3.0] },
                        "nodes": [
                            { "type": "material", "color": [200, 100, 50], "transparency": 25 },
                            {
                                "type": "mesh",
                                "points": [[0,0,0],[1,0,0],[0,1,0]],
                                "normals": [[0,0,1]],
                                "uvs": [[0,0],[1,0],[0,1]],
                                "facets": [[0,1,2]],
                                "normal_distribution": "uniform"
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_scene_document() {
        let doc = scene_from_json(SCENE_JSON).unwrap();
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].id, 42);
        match &doc.elements[0].nodes[0] {
            SceneNode::Instance { transform, nodes } => {
                assert_eq!(transform.origin, [1.0, 2.0, 3.0]);
                assert_eq!(transform.basis_x, [1.0, 0.0, 0.0]);
                assert_eq!(nodes.len(), 2);
            }
            other => panic!("expected instance, got {other:?}"),
        }
    }

    #[test]
    fn test_walk_emits_protocol_order() {
        let doc = scene_from_json(SCENE_JSON).unwrap();
        let mut recorder = Recorder::default();
        walk(&doc, &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "start",
                "view_begin",
                "element_begin 42",
                "instance_begin",
                "material",
                "polymesh",
                "instance_end",
                "element_end 42",
                "view_end",
                "finish",
            ]
        );
    }

    #[test]
    fn test_skip_elides_subtree_but_keeps_end_hook() {
        struct Skipper(Vec<String>);
        impl SceneVisitor for Skipper {
            fn start(&mut self) -> bool {
                true
            }
            fn is_cancelled(&self) -> bool {
                false
            }
            fn on_instance_begin(&mut self, _t: DMat4) -> Action {
                self.0.push("instance_begin".into());
                Action::Skip
            }
            fn on_instance_end(&mut self) {
                self.0.push("instance_end".into());
            }
            fn on_link_begin(&mut self, _t: DMat4) -> Action {
                Action::Skip
            }
            fn on_link_end(&mut self) {}
            fn on_material(&mut self, _n: &MaterialNote) {
                self.0.push("material".into());
            }
            fn on_polymesh(&mut self, _m: &Polymesh) {
                self.0.push("polymesh".into());
            }
            fn finish(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let doc = scene_from_json(SCENE_JSON).unwrap();
        let mut skipper = Skipper(Vec::new());
        walk(&doc, &mut skipper).unwrap();
        assert_eq!(skipper.0, vec!["instance_begin", "instance_end"]);
    }

    #[test]
    fn test_end_to_end_export_writes_both_files() {
        use crate::export::MTL_FILE_NAME;
        use crate::visitor::{ExportConfig, ObjExporter};

        let doc = scene_from_json(SCENE_JSON).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let obj_path = dir.path().join("scene.obj");

        let mut exporter = ObjExporter::with_config(
            &obj_path,
            ExportConfig {
                unit_scale: 1000.0,
                position_tolerance_mm: 1e-6,
                ..ExportConfig::default()
            },
        );
        walk(&doc, &mut exporter).unwrap();

        let obj = std::fs::read_to_string(&obj_path).unwrap();
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 3);
        assert_eq!(obj.lines().filter(|l| l.starts_with("vn ")).count(), 1);
        assert_eq!(obj.lines().filter(|l| l.starts_with("vt ")).count(), 3);
        assert!(obj.contains("usemtl 19C86432"));
        assert!(obj.contains("f 1/1/1 2/2/1 3/3/1"));

        let mtl = std::fs::read_to_string(dir.path().join(MTL_FILE_NAME)).unwrap();
        assert!(mtl.contains("newmtl 19C86432"));
        assert!(mtl.contains("d 0.75"));
    }

    #[test]
    fn test_inconsistent_document_mesh_errors_instead_of_panicking() {
        use crate::error::ExportError;
        use crate::visitor::ObjExporter;

        // Schema-valid documents the deserializer accepts but the export
        // must reject: a mesh with no uvs, and a facet index out of range.
        let uvless = r#"{
            "elements": [{ "id": 1, "nodes": [
                { "type": "mesh",
                  "points": [[0,0,0],[1,0,0],[0,1,0]],
                  "normals": [[0,0,1]],
                  "facets": [[0,1,2]] }
            ]}]
        }"#;
        let out_of_range = r#"{
            "elements": [{ "id": 1, "nodes": [
                { "type": "mesh",
                  "points": [[0,0,0],[1,0,0],[0,1,0]],
                  "normals": [[0,0,1]],
                  "uvs": [[0,0],[1,0],[0,1]],
                  "facets": [[0,1,9]] }
            ]}]
        }"#;

        for json in [uvless, out_of_range] {
            let doc = scene_from_json(json).unwrap();
            let mut exporter = ObjExporter::new("unused.obj");
            let err = walk(&doc, &mut exporter).unwrap_err();
            assert!(matches!(err, ExportError::Protocol(_)));
        }
    }

    #[test]
    fn test_empty_scene_exports_cleanly() {
        use crate::visitor::ObjExporter;

        let dir = tempfile::tempdir().unwrap();
        let obj_path = dir.path().join("empty.obj");
        let mut exporter = ObjExporter::new(&obj_path);
        walk(&SceneDocument::default(), &mut exporter).unwrap();

        let obj = std::fs::read_to_string(&obj_path).unwrap();
        assert_eq!(obj, "mtllib model.mtl\n");
    }

    #[test]
    fn test_transform_def_matrix_maps_points() {
        let def = TransformDef {
            origin: [10.0, 0.0, 0.0],
            ..TransformDef::default()
        };
        let p = def.to_matrix().transform_point3(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(p, DVec3::new(11.0, 2.0, 3.0));
    }
}
