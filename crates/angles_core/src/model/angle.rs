//! Angle domain model.
//!
//! # Responsibility
//! - Define one angle measurement attached to a hold.
//! - Generate fresh stable identifiers for new angles.
//!
//! # Invariants
//! - `value` lies in the closed interval `[0, 90]`.
//! - `image`, when set, carries the inline-image prefix.
//! - `hold` is a canonical hold name (see `model::snapshot`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of one angle.
///
/// Imported documents may carry arbitrary non-empty strings, so this is not a
/// `Uuid`; freshly generated ids are UUID v4 strings.
pub type AngleId = String;

/// Lower bound of a normalized angle value.
pub const ANGLE_MIN: f64 = 0.0;
/// Upper bound of a normalized angle value.
pub const ANGLE_MAX: f64 = 90.0;

/// Category tag of one angle. Anything unrecognized collapses to `Primary`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleCategory {
    #[default]
    Primary,
    Secondary,
}

impl AngleCategory {
    /// Returns the wire tag used in snapshots and export files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }

    /// Parses a wire tag, folding case and surrounding whitespace.
    ///
    /// Unknown tags yield `Primary`; this never fails.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("secondary") {
            Self::Secondary
        } else {
            Self::Primary
        }
    }
}

/// One angle measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Angle {
    pub id: AngleId,
    /// Canonical name of the owning hold.
    pub hold: String,
    /// Degrees, clamped to `[ANGLE_MIN, ANGLE_MAX]`.
    pub value: f64,
    pub category: AngleCategory,
    /// Inline image shown instead of the hold cover image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Angle {
    /// Creates a new angle for `hold` with value 0, primary category and a
    /// generated id.
    pub fn new(hold: impl Into<String>) -> Self {
        Self {
            id: new_angle_id(),
            hold: hold.into(),
            value: ANGLE_MIN,
            category: AngleCategory::Primary,
            image: None,
        }
    }
}

/// Generates a fresh angle identifier.
pub fn new_angle_id() -> AngleId {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::{new_angle_id, Angle, AngleCategory};

    #[test]
    fn unknown_category_tags_collapse_to_primary() {
        assert_eq!(AngleCategory::from_tag("secondary"), AngleCategory::Secondary);
        assert_eq!(AngleCategory::from_tag(" Secondary "), AngleCategory::Secondary);
        assert_eq!(AngleCategory::from_tag("tertiary"), AngleCategory::Primary);
        assert_eq!(AngleCategory::from_tag(""), AngleCategory::Primary);
    }

    #[test]
    fn new_angle_starts_at_zero_without_image() {
        let angle = Angle::new("Jug");
        assert_eq!(angle.value, 0.0);
        assert_eq!(angle.category, AngleCategory::Primary);
        assert!(angle.image.is_none());
        assert!(!angle.id.is_empty());
    }

    #[test]
    fn generated_ids_do_not_repeat() {
        assert_ne!(new_angle_id(), new_angle_id());
    }
}
