//! Tolerance-keyed deduplication of geometric data.
//!
//! Every position, normal and UV written to the output file goes through a
//! [`DedupTable`], which maps tolerance-equal values to one dense index.
//! Keys are quantized to an integer grid before hashing; raw IEEE-754
//! values are never hashed, so values that agree within the tolerance land
//! in the same bucket. Grid equality is only an approximation of true
//! tolerance equality (points straddling a grid boundary may split), which
//! is acceptable for the well-separated point clouds CAD models produce.

use glam::{DMat4, DVec2, DVec3};
use std::collections::HashMap;

/// Absolute tolerance for normals and texture coordinates.
pub const NORMAL_UV_TOLERANCE: f64 = 1e-9;

/// Default position tolerance in millimetres: 1/16 inch, the snapping
/// tolerance typical CAD hosts use internally.
pub const DEFAULT_POSITION_TOLERANCE_MM: f64 = 25.4 / 16.0;

/// Converts the host's Z-up convention to OBJ's Y-up convention
/// (Y and Z swapped, sign flipped on the new Z). Build-time policy.
const SWITCH_COORDINATES: bool = true;

fn swap_axes(v: DVec3) -> DVec3 {
    if SWITCH_COORDINATES {
        DVec3::new(v.x, v.z, -v.y)
    } else {
        v
    }
}

/// An immutable 3-tuple of doubles carrying the exact values written to the
/// output file. Equality and hashing live in [`DedupTable`], which owns the
/// tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointKey {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PointKey {
    /// Key for a position: transformed by the current composed transform,
    /// scaled from the host's native unit into millimetres, axis-swapped.
    pub fn from_position(raw: DVec3, transform: &DMat4, unit_scale: f64) -> Self {
        let p = swap_axes(transform.transform_point3(raw) * unit_scale);
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }

    /// Key for a direction vector (normal): transformed without the
    /// translation part, axis-swapped, never unit-scaled.
    pub fn from_vector(raw: DVec3, transform: &DMat4) -> Self {
        let v = swap_axes(transform.transform_vector3(raw));
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }

    /// Key for a texture coordinate. UVs are untransformed; the unused
    /// third component stays zero.
    pub fn from_uv(uv: DVec2) -> Self {
        Self {
            x: uv.x,
            y: uv.y,
            z: 0.0,
        }
    }
}

/// Grid coordinate of a quantized key. This is the actual `Eq + Hash` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct QuantKey([i64; 3]);

/// Insertion-ordered mapping from tolerance-keyed values to dense indices.
///
/// Index assignment is first-seen wins: a key's index equals the table size
/// at the time it was first inserted, and re-inserting a tolerance-equal
/// key any number of times returns that same index.
#[derive(Debug, Clone)]
pub struct DedupTable {
    tolerance: f64,
    indices: HashMap<QuantKey, usize>,
    keys: Vec<PointKey>,
}

impl DedupTable {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            indices: HashMap::new(),
            keys: Vec::new(),
        }
    }

    fn quantize(&self, key: &PointKey) -> QuantKey {
        QuantKey([
            (key.x / self.tolerance).round() as i64,
            (key.y / self.tolerance).round() as i64,
            (key.z / self.tolerance).round() as i64,
        ])
    }

    /// Return the index of `key`, inserting it if unseen.
    pub fn insert(&mut self, key: PointKey) -> usize {
        let quant = self.quantize(&key);
        if let Some(&index) = self.indices.get(&quant) {
            return index;
        }
        let index = self.keys.len();
        self.indices.insert(quant, index);
        self.keys.push(key);
        index
    }

    /// Deduplicated keys in index order.
    pub fn keys(&self) -> &[PointKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
