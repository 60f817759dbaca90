use angles_core::model::snapshot::{CanonicalSnapshot, SEED_HOLDS};
use angles_core::{migrate, SCHEMA_VERSION};
use serde_json::{json, Value};

const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

#[test]
fn non_documents_fall_back_to_seed_catalog() {
    for raw in [Value::Null, json!(42), json!("store"), json!([1, 2]), json!({})] {
        let snapshot = migrate(&raw);
        assert_eq!(snapshot.version, SCHEMA_VERSION);
        assert_eq!(snapshot.holds, SEED_HOLDS);
        assert!(!snapshot.angles.is_empty());
        assert!(snapshot.hold_images.is_empty());
    }
}

#[test]
fn seed_catalog_is_deterministic() {
    assert_eq!(migrate(&Value::Null), migrate(&json!({})));
}

#[test]
fn export_envelope_is_unwrapped() {
    let envelope = json!({
        "app": "AnglesProto",
        "exportedAt": "2024-01-01T00:00:00Z",
        "version": 1,
        "data": {
            "holds": ["Jug"],
            "angles": [{ "id": "a", "hold": "Jug", "value": 10 }],
            "holdImages": { "Jug": PNG }
        }
    });
    let bare = envelope["data"].clone();

    let from_envelope = migrate(&envelope);
    assert_eq!(from_envelope, migrate(&bare));
    assert_eq!(from_envelope.holds, vec!["Jug"]);
    assert_eq!(from_envelope.angles.len(), 1);
    assert_eq!(from_envelope.hold_images.len(), 1);
}

#[test]
fn declared_version_is_never_trusted() {
    let snapshot = migrate(&json!({ "version": 99, "holds": ["Jug"], "angles": [] }));
    assert_eq!(snapshot.version, SCHEMA_VERSION);

    let snapshot = migrate(&json!({ "version": "banana", "holds": [], "angles": [] }));
    assert_eq!(snapshot.version, SCHEMA_VERSION);
}

#[test]
fn present_but_empty_lists_are_respected() {
    let snapshot = migrate(&json!({ "holds": [], "angles": [] }));
    assert_eq!(snapshot, CanonicalSnapshot::empty());
}

#[test]
fn wrongly_shaped_fields_fall_back_per_field() {
    let snapshot = migrate(&json!({
        "holds": "Jug",
        "angles": { "id": "a" },
        "holdImages": ["Jug", PNG]
    }));
    assert_eq!(snapshot.holds, SEED_HOLDS);
    assert_eq!(snapshot, migrate(&Value::Null));
}

#[test]
fn seed_angles_are_filtered_against_imported_holds() {
    let snapshot = migrate(&json!({ "holds": ["Jug", "Volume"] }));
    assert_eq!(snapshot.holds, vec!["Jug", "Volume"]);
    assert!(snapshot.angles.iter().all(|angle| angle.hold == "Jug"));
    assert_eq!(snapshot.angles.len(), 1);
}

#[test]
fn migrated_snapshots_keep_referential_integrity() {
    for raw in sample_documents() {
        let snapshot = migrate(&raw);
        for angle in &snapshot.angles {
            assert!(snapshot.contains_hold(&angle.hold), "dangling angle in {raw}");
            assert!((0.0..=90.0).contains(&angle.value));
        }
        for hold in snapshot.hold_images.keys() {
            assert!(snapshot.contains_hold(hold), "dangling cover image in {raw}");
        }
    }
}

#[test]
fn migrate_is_idempotent() {
    for raw in sample_documents() {
        let once = migrate(&raw);
        let twice = migrate(&once.to_document().unwrap());
        assert_eq!(once, twice, "not idempotent for {raw}");

        let reparsed: Value =
            serde_json::from_str(&serde_json::to_string(&once).unwrap()).unwrap();
        assert_eq!(migrate(&reparsed), once);
    }
}

fn sample_documents() -> Vec<Value> {
    vec![
        Value::Null,
        json!(true),
        json!({}),
        json!({ "data": "not an object" }),
        json!({
            "holds": ["b", "A", "a", " c  d ", 7, null],
            "angles": [
                { "hold": "A", "value": "12,5" },
                { "id": "x", "hold": "b", "value": -3, "category": "secondary" },
                { "id": "x", "hold": "b", "value": 300, "image": PNG },
                { "id": "y", "hold": "missing" },
                { "id": "z", "hold": "c d", "image": "nope" },
                "garbage"
            ],
            "holdImages": { "A": PNG, "missing": PNG, "b": 3, " c  d": PNG }
        }),
        json!({
            "app": "AnglesProto",
            "version": 1,
            "data": { "holds": ["Jug"], "angles": [{ "hold": "Jug" }, { "hold": "Jug" }] }
        }),
        json!({ "holds": [], "angles": [{ "id": "a", "hold": "Jug" }], "holdImages": { "Jug": PNG } }),
    ]
}
