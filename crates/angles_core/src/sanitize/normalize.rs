//! Single-value normalizers.
//!
//! Every function takes one raw `serde_json::Value` and returns a canonical
//! value by explicit pattern match over the JSON variants.

use crate::model::angle::{new_angle_id, AngleCategory, AngleId, ANGLE_MAX, ANGLE_MIN};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Prefix every inline image reference must start with.
pub const INLINE_IMAGE_PREFIX: &str = "data:image/";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Coerces a raw value into a whitespace-normalized name.
///
/// Strings, numbers and booleans are rendered as text; `null`, arrays and
/// objects yield the empty string. An empty result is valid output.
pub fn normalize_name(raw: &Value) -> String {
    match raw {
        Value::String(text) => normalize_name_str(text),
        Value::Number(number) => normalize_name_str(&number.to_string()),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Trims `raw` and collapses internal whitespace runs to single spaces.
pub fn normalize_name_str(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned()
}

/// Coerces a raw value into an angle in `[0, 90]`.
///
/// Accepts numbers and decimal strings using `.` or `,` as separator.
/// Anything unparsable or non-finite yields 0; out-of-range values clamp.
pub fn normalize_angle_value(raw: &Value) -> f64 {
    let parsed = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_decimal(text),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.map_or(ANGLE_MIN, normalize_angle_number)
}

/// Clamps an already numeric angle; non-finite input yields 0.
pub fn normalize_angle_number(value: f64) -> f64 {
    if !value.is_finite() {
        return ANGLE_MIN;
    }
    let clamped = value.clamp(ANGLE_MIN, ANGLE_MAX);
    // -0.0 would otherwise survive the clamp and serialize with its sign.
    if clamped == 0.0 {
        ANGLE_MIN
    } else {
        clamped
    }
}

fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}

/// Accepts only strings carrying the inline-image prefix.
///
/// Everything else is "absent", never an error.
pub fn normalize_image_ref(raw: &Value) -> Option<String> {
    match raw {
        Value::String(text) if text.starts_with(INLINE_IMAGE_PREFIX) => Some(text.clone()),
        _ => None,
    }
}

/// Keeps a non-empty string id, otherwise generates a fresh one.
pub fn normalize_id(raw: &Value) -> AngleId {
    match raw {
        Value::String(text) if !text.is_empty() => text.clone(),
        _ => new_angle_id(),
    }
}

/// Maps a raw category tag onto the two known categories.
pub fn normalize_category(raw: &Value) -> AngleCategory {
    match raw {
        Value::String(tag) => AngleCategory::from_tag(tag),
        _ => AngleCategory::Primary,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_angle_value, normalize_category, normalize_id, normalize_image_ref,
        normalize_name,
    };
    use crate::model::angle::AngleCategory;
    use serde_json::{json, Value};

    #[test]
    fn name_is_trimmed_and_collapsed() {
        assert_eq!(normalize_name(&json!("  Big \t\n Jug  ")), "Big Jug");
        assert_eq!(normalize_name(&json!(12)), "12");
        assert_eq!(normalize_name(&json!(true)), "true");
        assert_eq!(normalize_name(&Value::Null), "");
        assert_eq!(normalize_name(&json!(["Jug"])), "");
        assert_eq!(normalize_name(&json!("   ")), "");
    }

    #[test]
    fn angle_value_clamps_and_parses_both_separators() {
        assert_eq!(normalize_angle_value(&json!(-5)), 0.0);
        assert_eq!(normalize_angle_value(&json!(999)), 90.0);
        assert_eq!(normalize_angle_value(&json!("45,5")), 45.5);
        assert_eq!(normalize_angle_value(&json!(" 12.25 ")), 12.25);
        assert_eq!(normalize_angle_value(&json!("abc")), 0.0);
        assert_eq!(normalize_angle_value(&json!("")), 0.0);
        assert_eq!(normalize_angle_value(&json!("inf")), 0.0);
        assert_eq!(normalize_angle_value(&json!("NaN")), 0.0);
        assert_eq!(normalize_angle_value(&json!(true)), 0.0);
        assert_eq!(normalize_angle_value(&Value::Null), 0.0);
    }

    #[test]
    fn negative_zero_is_normalized() {
        let value = normalize_angle_value(&json!(-0.0));
        assert!(value.is_sign_positive());
    }

    #[test]
    fn image_ref_requires_inline_prefix() {
        assert_eq!(
            normalize_image_ref(&json!("data:image/png;base64,AAAA")).as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert!(normalize_image_ref(&json!("https://example.com/a.png")).is_none());
        assert!(normalize_image_ref(&json!(42)).is_none());
        assert!(normalize_image_ref(&Value::Null).is_none());
    }

    #[test]
    fn id_is_kept_or_generated() {
        assert_eq!(normalize_id(&json!("a-1")), "a-1");
        assert!(!normalize_id(&json!("")).is_empty());
        assert!(!normalize_id(&json!(7)).is_empty());
    }

    #[test]
    fn category_defaults_to_primary() {
        assert_eq!(normalize_category(&json!("secondary")), AngleCategory::Secondary);
        assert_eq!(normalize_category(&json!("other")), AngleCategory::Primary);
        assert_eq!(normalize_category(&json!(1)), AngleCategory::Primary);
    }
}
