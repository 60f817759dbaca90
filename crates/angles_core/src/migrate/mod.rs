//! Document migrator: the single ingestion funnel for external data.
//!
//! # Responsibility
//! - Unwrap export envelopes and accept bare store documents.
//! - Run version upgrades registered in `UPGRADES` before sanitizing.
//! - Produce a `CanonicalSnapshot` through the sanitizer.
//!
//! # Invariants
//! - `migrate` never fails and never panics; odd shapes degrade to defaults.
//! - The output version is always `SCHEMA_VERSION`, whatever the input says.
//! - `migrate(migrate(x))` equals `migrate(x)` once re-serialized.
//! - `UPGRADES` entries stay ordered by `from_version`.

use crate::model::snapshot::{seed_angles, seed_holds, CanonicalSnapshot, SCHEMA_VERSION};
use crate::sanitize::{hold_set, sanitize_angle_list, sanitize_cover_images, sanitize_holds};
use log::debug;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// One in-place rewrite from `from_version` to `from_version + 1`.
#[derive(Debug, Clone, Copy)]
pub struct DocumentUpgrade {
    pub from_version: u32,
    pub apply: fn(&mut Map<String, Value>),
}

// Add an entry here when `SCHEMA_VERSION` is bumped. Version 1 is the first
// canonical schema, so nothing needs rewriting yet.
const UPGRADES: &[DocumentUpgrade] = &[];

/// Migrates an arbitrary parsed document into a canonical snapshot.
pub fn migrate(raw: &Value) -> CanonicalSnapshot {
    let empty = Map::new();
    let body = document_body(raw).unwrap_or(&empty);
    let body = upgrade_body(body);

    let holds = match body.get("holds") {
        Some(Value::Array(items)) => sanitize_holds(items),
        _ => sanitize_holds(&seed_holds()),
    };
    let valid_holds = hold_set(&holds);

    let angles = match body.get("angles") {
        Some(Value::Array(items)) => sanitize_angle_list(items, &valid_holds),
        _ => sanitize_angle_list(&seed_angles(), &valid_holds),
    };

    let hold_images = match body.get("holdImages") {
        Some(Value::Object(images)) => sanitize_cover_images(images, &valid_holds),
        _ => Default::default(),
    };

    CanonicalSnapshot {
        version: SCHEMA_VERSION,
        holds,
        angles,
        hold_images,
    }
}

/// Returns the store object inside `raw`, looking through an export envelope.
fn document_body(raw: &Value) -> Option<&Map<String, Value>> {
    let object = raw.as_object()?;
    match object.get("data") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(object),
    }
}

/// Version the document claims; documents without one predate versioning.
fn declared_version(body: &Map<String, Value>) -> u32 {
    body.get("version")
        .and_then(Value::as_u64)
        .map_or(0, |version| u32::try_from(version).unwrap_or(u32::MAX))
}

fn upgrade_body(body: &Map<String, Value>) -> Cow<'_, Map<String, Value>> {
    let source_version = declared_version(body);
    let mut pending = UPGRADES
        .iter()
        .filter(|upgrade| upgrade.from_version >= source_version)
        .peekable();
    if pending.peek().is_none() {
        return Cow::Borrowed(body);
    }

    let mut upgraded = body.clone();
    for upgrade in pending {
        (upgrade.apply)(&mut upgraded);
        debug!(
            "event=document_upgrade module=migrate status=ok from_version={} to_version={}",
            upgrade.from_version,
            upgrade.from_version + 1
        );
    }
    Cow::Owned(upgraded)
}
