//! Material identity tracking and color/transparency encoding.
//!
//! Materials are keyed purely by their surviving attributes, base color and
//! transparency. The key doubles as the `usemtl`/`newmtl` name in the
//! output files: two hex digits of transparency percent followed by six hex
//! digits of RGB, e.g. `19C86432` for transparency 25 over color
//! (200, 100, 50).

use crate::types::{Color, MaterialNote};
use std::collections::HashMap;

/// Pack transparency (0-100) and RGB into one 32-bit value, transparency in
/// the top byte. Internal face-stream representation, not an output format.
pub fn pack_color_transparency(color: Color, transparency: u8) -> u32 {
    debug_assert!(transparency <= 100, "transparency is a 0-100 percentage");
    (u32::from(transparency) << 24)
        | (u32::from(color.red) << 16)
        | (u32::from(color.green) << 8)
        | u32::from(color.blue)
}

pub fn unpack_color_transparency(packed: u32) -> (Color, u8) {
    let color = Color::new(
        ((packed >> 16) & 0xFF) as u8,
        ((packed >> 8) & 0xFF) as u8,
        (packed & 0xFF) as u8,
    );
    (color, (packed >> 24) as u8)
}

/// Deterministic material name for a (color, transparency) pair.
pub fn material_key(color: Color, transparency: u8) -> String {
    format!(
        "{:02X}{:02X}{:02X}{:02X}",
        transparency, color.red, color.green, color.blue
    )
}

/// One registered material, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    /// Encoded key, also the `newmtl` name.
    pub key: String,
    pub color: Color,
    /// `1.0 - transparency/100`, the `d` value in the material file.
    pub opacity: f64,
}

/// Tracks the active material and registers each unique color/transparency
/// pair at most once.
///
/// [`note_material`](MaterialTracker::note_material) returns the packed
/// value to append to the face stream when the active identity changes, and
/// `None` while consecutive geometry shares a material. This is what
/// coalesces runs of same-material triangles under a single `usemtl`.
#[derive(Debug, Default)]
pub struct MaterialTracker {
    current_key: Option<String>,
    records: Vec<MaterialRecord>,
    index: HashMap<String, usize>,
}

impl MaterialTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the host's material hook. Returns `Some(packed)` when a
    /// material switch must be recorded in the face stream. The very first
    /// material always switches, since nothing was active before it.
    pub fn note_material(&mut self, note: &MaterialNote) -> Option<u32> {
        let key = material_key(note.color, note.transparency_percent);
        if self.current_key.as_deref() == Some(key.as_str()) {
            return None;
        }

        if !self.index.contains_key(&key) {
            self.index.insert(key.clone(), self.records.len());
            self.records.push(MaterialRecord {
                key: key.clone(),
                color: note.color,
                opacity: 1.0 - f64::from(note.transparency_percent) / 100.0,
            });
        }

        let packed = pack_color_transparency(note.color, note.transparency_percent);
        self.current_key = Some(key);
        Some(packed)
    }

    /// Encoded key of the active material, if any geometry material has
    /// been observed yet.
    pub fn current_material_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    /// Registered materials in first-seen order.
    pub fn records(&self) -> &[MaterialRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(r: u8, g: u8, b: u8, transparency: u8) -> MaterialNote {
        MaterialNote {
            material_id: Some(1),
            color: Color::new(r, g, b),
            transparency_percent: transparency,
            glossiness: 50,
            has_override: false,
            appearance_asset: None,
        }
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let packed = pack_color_transparency(Color::new(200, 100, 50), 25);
        assert_eq!(packed, 0x19C8_6432);
        let (color, transparency) = unpack_color_transparency(packed);
        assert_eq!(color, Color::new(200, 100, 50));
        assert_eq!(transparency, 25);
    }

    #[test]
    fn test_material_key_format() {
        assert_eq!(material_key(Color::new(200, 100, 50), 25), "19C86432");
        assert_eq!(material_key(Color::new(0, 0, 0), 0), "00000000");
        assert_eq!(material_key(Color::new(255, 255, 255), 100), "64FFFFFF");
    }

    #[test]
    fn test_first_material_always_switches() {
        let mut tracker = MaterialTracker::new();
        assert!(tracker.current_material_key().is_none());
        assert!(tracker.note_material(&note(10, 20, 30, 0)).is_some());
        assert_eq!(tracker.current_material_key(), Some("000A141E"));
    }

    #[test]
    fn test_consecutive_same_material_coalesces() {
        let mut tracker = MaterialTracker::new();
        let m1 = note(10, 20, 30, 0);
        let m2 = note(40, 50, 60, 10);

        let switches: Vec<_> = [m1, m1, m2, m1]
            .iter()
            .map(|m| tracker.note_material(m))
            .collect();

        // M1, M1, M2, M1 -> switch, coalesce, switch, switch.
        assert!(switches[0].is_some());
        assert!(switches[1].is_none());
        assert!(switches[2].is_some());
        assert!(switches[3].is_some());
    }

    #[test]
    fn test_registry_is_idempotent_and_ordered() {
        let mut tracker = MaterialTracker::new();
        tracker.note_material(&note(10, 20, 30, 0));
        tracker.note_material(&note(40, 50, 60, 10));
        tracker.note_material(&note(10, 20, 30, 0));

        let records = tracker.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "000A141E");
        assert_eq!(records[1].key, "0A28323C");
        assert_eq!(records[1].opacity, 0.9);
    }

    #[test]
    fn test_same_id_different_color_still_switches() {
        // Identity is the (color, transparency) pair, not the host id.
        let mut tracker = MaterialTracker::new();
        tracker.note_material(&note(10, 20, 30, 0));
        assert!(tracker.note_material(&note(10, 20, 30, 50)).is_some());
    }
}
