//! Collection-level sanitizers.
//!
//! # Invariants
//! - Hold lists come out case-insensitively unique and sorted; when two
//!   spellings differ only by case, the first one seen in input order wins.
//! - Ordering compares Unicode-lowercased names by code point, with the raw
//!   name as tie-break. It is deterministic across hosts but not a locale
//!   collation: accented initials such as `Ä` sort after `Z`.
//! - Angles survive only when their normalized hold is in the valid set.
//! - Angle ids are unique; a later duplicate gets a fresh id.

use crate::model::angle::{new_angle_id, Angle};
use crate::sanitize::normalize::{
    normalize_angle_value, normalize_category, normalize_id, normalize_image_ref, normalize_name,
    normalize_name_str,
};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

static NULL: Value = Value::Null;

/// Case-folded key used for hold uniqueness and ordering.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

fn compare_names(left: &String, right: &String) -> Ordering {
    fold_name(left)
        .cmp(&fold_name(right))
        .then_with(|| left.cmp(right))
}

/// Normalizes, deduplicates and sorts a raw hold list.
pub fn sanitize_holds(raw: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut holds = Vec::new();
    for item in raw {
        let name = normalize_name(item);
        if name.is_empty() {
            continue;
        }
        if seen.insert(fold_name(&name)) {
            holds.push(name);
        }
    }
    holds.sort_by(compare_names);
    holds
}

/// Builds the membership set used by the relational checks below.
pub fn hold_set(holds: &[String]) -> BTreeSet<String> {
    holds.iter().cloned().collect()
}

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a Value {
    object.get(key).unwrap_or(&NULL)
}

/// Normalizes one raw angle record.
///
/// Returns `None` only when the record is not an object or its hold does not
/// resolve to a member of `valid_holds`; every other field is repaired.
pub fn sanitize_angle(raw: &Value, valid_holds: &BTreeSet<String>) -> Option<Angle> {
    let object = raw.as_object()?;
    let hold = normalize_name(field(object, "hold"));
    if hold.is_empty() || !valid_holds.contains(&hold) {
        return None;
    }

    Some(Angle {
        id: normalize_id(field(object, "id")),
        hold,
        value: normalize_angle_value(field(object, "value")),
        category: normalize_category(field(object, "category")),
        image: normalize_image_ref(field(object, "image")),
    })
}

/// Sanitizes every raw angle, dropping dangling ones and re-keying id
/// collisions (first seen keeps its id).
pub fn sanitize_angle_list(raw: &[Value], valid_holds: &BTreeSet<String>) -> Vec<Angle> {
    let mut seen_ids = HashSet::new();
    let mut angles = Vec::with_capacity(raw.len());
    for item in raw {
        let Some(mut angle) = sanitize_angle(item, valid_holds) else {
            continue;
        };
        while !seen_ids.insert(angle.id.clone()) {
            angle.id = new_angle_id();
        }
        angles.push(angle);
    }
    angles
}

/// Keeps cover images whose key is a valid hold and whose value is an inline
/// image. Keys are whitespace-normalized before the membership check.
pub fn sanitize_cover_images(
    raw: &Map<String, Value>,
    valid_holds: &BTreeSet<String>,
) -> BTreeMap<String, String> {
    let mut images = BTreeMap::new();
    for (key, value) in raw {
        let hold = normalize_name_str(key);
        if !valid_holds.contains(&hold) {
            continue;
        }
        if let Some(image) = normalize_image_ref(value) {
            images.entry(hold).or_insert(image);
        }
    }
    images
}
