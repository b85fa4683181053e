//! The traversal callback protocol and its OBJ-exporting implementation.
//!
//! The host walks its document depth-first on a single control path and
//! pushes every event through a [`SceneVisitor`]. [`ObjExporter`] is the
//! consumer of that stream: it maintains the transform stack across nested
//! instances and links, routes geometry into the [`MeshAccumulator`] and
//! material notifications into the [`MaterialTracker`], and serializes the
//! accumulated data when the walk finishes. One exporter serves exactly one
//! export run; construct a fresh one per run.

use crate::accumulator::MeshAccumulator;
use crate::dedup::DEFAULT_POSITION_TOLERANCE_MM;
use crate::error::{ExportError, Result};
use crate::export::obj::{self, MtlTemplate};
use crate::material::MaterialTracker;
use crate::types::{Action, MaterialNote, Polymesh, TransformStack};
use glam::DMat4;
use log::debug;
use std::path::PathBuf;

/// Millimetres per foot, the default host length unit.
pub const MM_PER_FOOT: f64 = 25.4 * 12.0;

/// Export configuration.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Millimetres per host length unit.
    pub unit_scale: f64,
    /// Absolute position dedup tolerance, in millimetres.
    pub position_tolerance_mm: f64,
    /// Which statement variant the material file uses.
    pub mtl_template: MtlTemplate,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            unit_scale: MM_PER_FOOT,
            position_tolerance_mm: DEFAULT_POSITION_TOLERANCE_MM,
            mtl_template: MtlTemplate::Transparency,
        }
    }
}

/// The capability set a host traversal engine drives.
///
/// Hooks are called sequentially on one logical thread, in depth-first
/// document order. Begin hooks reply whether to descend; the remaining
/// hooks are notifications. Light, RPC and daylight-portal events carry
/// nothing this exporter persists, so their defaults are no-ops.
pub trait SceneVisitor {
    /// Called exactly once before any other hook. Returns `false` to
    /// abandon the run before it starts.
    fn start(&mut self) -> bool;

    /// Polled by the host between events for cooperative cancellation.
    fn is_cancelled(&self) -> bool;

    fn on_view_begin(&mut self) -> Action {
        Action::Proceed
    }
    fn on_view_end(&mut self) {}

    fn on_element_begin(&mut self, _id: u64) -> Action {
        Action::Proceed
    }
    fn on_element_end(&mut self, _id: u64) {}

    fn on_instance_begin(&mut self, transform: DMat4) -> Action;
    fn on_instance_end(&mut self);

    fn on_link_begin(&mut self, transform: DMat4) -> Action;
    fn on_link_end(&mut self);

    fn on_face_begin(&mut self) -> Action {
        Action::Proceed
    }
    fn on_face_end(&mut self) {}

    fn on_material(&mut self, note: &MaterialNote);
    fn on_polymesh(&mut self, mesh: &Polymesh);

    fn on_light(&mut self) {}
    fn on_rpc(&mut self) {}
    fn on_daylight_portal(&mut self) {}

    /// Called exactly once after the walk completes.
    fn finish(&mut self) -> Result<()>;
}

/// Consumes one traversal and writes an OBJ/MTL pair on finish.
#[derive(Debug)]
pub struct ObjExporter {
    stack: TransformStack,
    accumulator: MeshAccumulator,
    tracker: MaterialTracker,
    mtl_template: MtlTemplate,
    obj_path: PathBuf,
    started: bool,
    /// First protocol violation observed mid-traversal. The run is
    /// poisoned from that point on and `finish` surfaces the error
    /// instead of writing files.
    failure: Option<ExportError>,
}

impl ObjExporter {
    /// Exporter with default configuration, writing the geometry file at
    /// `obj_path`. The material file lands next to it as `model.mtl`.
    pub fn new(obj_path: impl Into<PathBuf>) -> Self {
        Self::with_config(obj_path, ExportConfig::default())
    }

    pub fn with_config(obj_path: impl Into<PathBuf>, config: ExportConfig) -> Self {
        Self {
            stack: TransformStack::new(),
            accumulator: MeshAccumulator::new(config.unit_scale, config.position_tolerance_mm),
            tracker: MaterialTracker::new(),
            mtl_template: config.mtl_template,
            obj_path: obj_path.into(),
            started: false,
            failure: None,
        }
    }

    fn poison(&mut self, error: ExportError) {
        debug!("export run poisoned: {error}");
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    fn push_transform(&mut self, transform: DMat4) {
        if let Err(e) = self.stack.push(transform) {
            self.poison(e);
        }
    }

    fn pop_transform(&mut self) {
        if let Err(e) = self.stack.pop() {
            self.poison(e);
        }
    }

    /// Accumulated geometry, for inspection before or instead of writing.
    pub fn accumulator(&self) -> &MeshAccumulator {
        &self.accumulator
    }

    /// Registered materials.
    pub fn tracker(&self) -> &MaterialTracker {
        &self.tracker
    }

    /// Render the geometry and material files as strings without touching
    /// the filesystem.
    pub fn to_strings(&self) -> (String, String) {
        (
            obj::geometry_string(&self.accumulator),
            obj::material_string(self.tracker.records(), self.mtl_template),
        )
    }
}

impl SceneVisitor for ObjExporter {
    fn start(&mut self) -> bool {
        self.stack.start();
        self.started = true;
        true
    }

    // Cooperative cancellation is a host capability this exporter never
    // exercises.
    fn is_cancelled(&self) -> bool {
        false
    }

    fn on_element_begin(&mut self, id: u64) -> Action {
        debug!("element begin: {id}");
        Action::Proceed
    }

    fn on_element_end(&mut self, id: u64) {
        debug!("element end: {id}");
    }

    fn on_instance_begin(&mut self, transform: DMat4) -> Action {
        self.push_transform(transform);
        Action::Proceed
    }

    fn on_instance_end(&mut self) {
        self.pop_transform();
    }

    fn on_link_begin(&mut self, transform: DMat4) -> Action {
        debug!("link begin");
        self.push_transform(transform);
        Action::Proceed
    }

    fn on_link_end(&mut self) {
        debug!("link end");
        self.pop_transform();
    }

    fn on_face_begin(&mut self) -> Action {
        debug!("face begin");
        Action::Proceed
    }

    fn on_face_end(&mut self) {
        debug!("face end");
    }

    fn on_material(&mut self, note: &MaterialNote) {
        if self.failure.is_some() {
            return;
        }
        if let Some(packed) = self.tracker.note_material(note) {
            self.accumulator.push_material_switch(packed);
        }
    }

    fn on_polymesh(&mut self, mesh: &Polymesh) {
        if self.failure.is_some() || mesh.is_empty() {
            return;
        }
        // Scene documents can carry meshes the deserializer cannot
        // cross-check; a bad batch poisons the run instead of panicking.
        if let Err(e) = mesh.validate() {
            self.poison(e);
            return;
        }
        let transform = match self.stack.current() {
            Ok(t) => *t,
            Err(e) => {
                self.poison(e);
                return;
            }
        };
        self.accumulator.add_polymesh(mesh, &transform);
    }

    fn on_light(&mut self) {
        debug!("light node");
    }

    fn on_rpc(&mut self) {
        debug!("rpc node");
    }

    fn on_daylight_portal(&mut self) {
        debug!("daylight portal node");
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(error) = self.failure.take() {
            return Err(error);
        }
        if !self.started {
            return Err(ExportError::Protocol(
                "finish() without a preceding start()".into(),
            ));
        }
        if self.stack.depth() != 1 {
            return Err(ExportError::Protocol(format!(
                "unbalanced instance nesting: transform stack depth {} at finish",
                self.stack.depth()
            )));
        }
        obj::write_files(
            &self.obj_path,
            &self.accumulator,
            self.tracker.records(),
            self.mtl_template,
        )
    }
}
