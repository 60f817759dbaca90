//! Canonical snapshot, backup entry and export envelope.
//!
//! # Responsibility
//! - Define the only unit ever written to or read from durable storage.
//! - Provide cascade edits (rename/remove hold) that keep relations intact.
//! - Hold the built-in seed catalog used when a document carries no data.
//!
//! # Invariants
//! - `version` is always `SCHEMA_VERSION`; it is re-stamped by the migrator and
//!   never trusted from input.
//! - `holds` is case-insensitively unique and sorted.
//! - Cascade edits never leave an angle or cover image pointing at a missing hold.

use crate::model::angle::{Angle, AngleCategory};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Current canonical schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// `app` tag written into export envelopes.
pub const EXPORT_APP_NAME: &str = "AnglesProto";

/// Hold names used when a document carries no usable hold list.
pub const SEED_HOLDS: &[&str] = &["Crimp", "Jug", "Pinch", "Sloper"];

/// Raw seed angles used when a document carries no usable angle list.
///
/// Kept as raw documents so they go through the same sanitizer as any input.
pub fn seed_angles() -> Vec<Value> {
    vec![
        json!({ "id": "seed-jug", "hold": "Jug", "value": 20, "category": "primary" }),
        json!({ "id": "seed-crimp", "hold": "Crimp", "value": 45, "category": "primary" }),
        json!({ "id": "seed-sloper", "hold": "Sloper", "value": 30, "category": "secondary" }),
    ]
}

/// Raw seed hold list as a document fragment.
pub fn seed_holds() -> Vec<Value> {
    SEED_HOLDS
        .iter()
        .map(|name| Value::String((*name).to_string()))
        .collect()
}

/// The whole persisted catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSnapshot {
    pub version: u32,
    pub holds: Vec<String>,
    pub angles: Vec<Angle>,
    /// Cover image per hold, used when an angle has no image of its own.
    pub hold_images: BTreeMap<String, String>,
}

impl Default for CanonicalSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl CanonicalSnapshot {
    /// Returns a snapshot with no holds, angles or cover images.
    pub fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            holds: Vec::new(),
            angles: Vec::new(),
            hold_images: BTreeMap::new(),
        }
    }

    /// Converts this snapshot back into an untyped document.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Returns whether `name` is exactly one of the canonical hold names.
    pub fn contains_hold(&self, name: &str) -> bool {
        self.holds.iter().any(|hold| hold == name)
    }

    /// Looks up the canonical spelling of a hold, ignoring case.
    pub fn find_hold(&self, name: &str) -> Option<&str> {
        let folded = name.to_lowercase();
        self.holds
            .iter()
            .find(|hold| hold.to_lowercase() == folded)
            .map(String::as_str)
    }

    pub fn angle(&self, id: &str) -> Option<&Angle> {
        self.angles.iter().find(|angle| angle.id == id)
    }

    pub fn angle_mut(&mut self, id: &str) -> Option<&mut Angle> {
        self.angles.iter_mut().find(|angle| angle.id == id)
    }

    /// Iterates the angles attached to `hold`, in stored order.
    pub fn angles_for<'a>(&'a self, hold: &'a str) -> impl Iterator<Item = &'a Angle> + 'a {
        self.angles.iter().filter(move |angle| angle.hold == hold)
    }

    /// Counts angles per category for one hold.
    pub fn category_counts(&self, hold: &str) -> (usize, usize) {
        self.angles_for(hold)
            .fold((0, 0), |(primary, secondary), angle| match angle.category {
                AngleCategory::Primary => (primary + 1, secondary),
                AngleCategory::Secondary => (primary, secondary + 1),
            })
    }

    /// Returns the image to show for `angle`: its own image, else the cover
    /// image of its hold.
    pub fn display_image<'a>(&'a self, angle: &'a Angle) -> Option<&'a str> {
        angle
            .image
            .as_deref()
            .or_else(|| self.hold_images.get(&angle.hold).map(String::as_str))
    }

    /// Removes `hold` with every angle and cover image attached to it.
    ///
    /// Returns the number of removed angles. Unknown names are a no-op.
    pub fn remove_hold(&mut self, hold: &str) -> usize {
        let before = self.angles.len();
        self.holds.retain(|name| name != hold);
        self.angles.retain(|angle| angle.hold != hold);
        self.hold_images.remove(hold);
        before - self.angles.len()
    }

    /// Renames `from` to `to` in place, rekeying angles and the cover map.
    ///
    /// Ordering and uniqueness are restored by the migrator on `replace`.
    pub fn rename_hold(&mut self, from: &str, to: &str) {
        for name in self.holds.iter_mut().filter(|name| name.as_str() == from) {
            *name = to.to_string();
        }
        for angle in self.angles.iter_mut().filter(|angle| angle.hold == from) {
            angle.hold = to.to_string();
        }
        if let Some(image) = self.hold_images.remove(from) {
            self.hold_images.insert(to.to_string(), image);
        }
    }
}

/// One immutable backup of a full snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Unix epoch milliseconds at which the backup was taken.
    pub timestamp: i64,
    pub snapshot: CanonicalSnapshot,
}

/// Export file wrapper around a snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope<'a> {
    pub app: &'static str,
    /// ISO-8601 (RFC 3339) export time.
    pub exported_at: String,
    pub version: u32,
    pub data: &'a CanonicalSnapshot,
}

impl<'a> ExportEnvelope<'a> {
    pub fn new(exported_at: String, data: &'a CanonicalSnapshot) -> Self {
        Self {
            app: EXPORT_APP_NAME,
            exported_at,
            version: SCHEMA_VERSION,
            data,
        }
    }
}
