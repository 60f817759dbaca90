//! Normalization and sanitization of untrusted documents.
//!
//! # Responsibility
//! - Coerce single raw JSON values into canonical field values (`normalize`).
//! - Apply field normalization to whole collections with uniqueness and
//!   referential checks (`collections`).
//!
//! # Invariants
//! - Every function here is total: malformed input degrades to a default and
//!   nothing returns an error or panics.
//! - Scalar fields are repaired in place; a broken hold reference drops the
//!   whole angle.

pub mod collections;
pub mod normalize;

pub use collections::{
    fold_name, hold_set, sanitize_angle, sanitize_angle_list, sanitize_cover_images,
    sanitize_holds,
};
pub use normalize::{
    normalize_angle_number, normalize_angle_value, normalize_category, normalize_id,
    normalize_image_ref, normalize_name, normalize_name_str, INLINE_IMAGE_PREFIX,
};
