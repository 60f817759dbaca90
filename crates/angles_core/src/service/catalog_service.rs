//! Catalog edit use-cases.
//!
//! # Responsibility
//! - Create, rename and delete holds with cascades to angles and cover images.
//! - Create, edit and delete angles; attach cover images.
//!
//! # Invariants
//! - Every edit clones the current snapshot, edits the clone and hands it to
//!   `Store::replace`; the store stays canonical.
//! - Hold names are compared after whitespace normalization, ignoring case.
//! - An image that is not an inline image is a silent no-op (`Ok(false)`).

use crate::clock::Clock;
use crate::model::angle::{Angle, AngleCategory, AngleId};
use crate::model::snapshot::CanonicalSnapshot;
use crate::sanitize::{normalize_angle_value, normalize_image_ref, normalize_name_str};
use crate::storage::KvStorage;
use crate::store::{Store, StoreError};
use log::debug;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CatalogError {
    /// Name is empty after normalization.
    EmptyName,
    /// Another hold already uses this name (ignoring case).
    DuplicateHold(String),
    HoldNotFound(String),
    AngleNotFound(AngleId),
    Store(StoreError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "hold name cannot be empty"),
            Self::DuplicateHold(name) => write!(f, "hold already exists: `{name}`"),
            Self::HoldNotFound(name) => write!(f, "hold not found: `{name}`"),
            Self::AngleNotFound(id) => write!(f, "angle not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Edit facade over one open store.
pub struct CatalogService<'s, S: KvStorage, C: Clock> {
    store: &'s mut Store<S, C>,
}

impl<'s, S: KvStorage, C: Clock> CatalogService<'s, S, C> {
    pub fn new(store: &'s mut Store<S, C>) -> Self {
        Self { store }
    }

    pub fn snapshot(&self) -> &CanonicalSnapshot {
        self.store.snapshot()
    }

    /// Adds a hold and returns its canonical name.
    pub fn add_hold(&mut self, name: &str) -> CatalogResult<String> {
        let name = normalize_name_str(name);
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if let Some(existing) = self.snapshot().find_hold(&name) {
            return Err(CatalogError::DuplicateHold(existing.to_string()));
        }

        let mut next = self.snapshot().clone();
        next.holds.push(name.clone());
        self.commit(&next, "add_hold")?;
        Ok(name)
    }

    /// Renames a hold, carrying its angles and cover image along.
    ///
    /// Changing only the case of a name is allowed.
    pub fn rename_hold(&mut self, from: &str, to: &str) -> CatalogResult<String> {
        let current = self.resolve_hold(from)?;
        let to = normalize_name_str(to);
        if to.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if let Some(existing) = self.snapshot().find_hold(&to) {
            if existing != current {
                return Err(CatalogError::DuplicateHold(existing.to_string()));
            }
        }

        let mut next = self.snapshot().clone();
        next.rename_hold(&current, &to);
        self.commit(&next, "rename_hold")?;
        Ok(to)
    }

    /// Deletes a hold with its angles and cover image.
    ///
    /// Returns the number of deleted angles.
    pub fn delete_hold(&mut self, name: &str) -> CatalogResult<usize> {
        let current = self.resolve_hold(name)?;
        let mut next = self.snapshot().clone();
        let removed = next.remove_hold(&current);
        self.commit(&next, "delete_hold")?;
        Ok(removed)
    }

    /// Adds a primary angle with value 0 to `hold` and returns its id.
    pub fn add_angle(&mut self, hold: &str) -> CatalogResult<AngleId> {
        let hold = self.resolve_hold(hold)?;
        let angle = Angle::new(hold);
        let id = angle.id.clone();

        let mut next = self.snapshot().clone();
        next.angles.push(angle);
        self.commit(&next, "add_angle")?;
        Ok(id)
    }

    /// Sets an angle value from a number or decimal string; returns the
    /// stored (clamped) value.
    pub fn set_angle_value(&mut self, id: &str, raw: &Value) -> CatalogResult<f64> {
        let value = normalize_angle_value(raw);
        self.edit_angle(id, "set_angle_value", |angle| angle.value = value)?;
        Ok(value)
    }

    pub fn set_angle_category(&mut self, id: &str, category: AngleCategory) -> CatalogResult<()> {
        self.edit_angle(id, "set_angle_category", |angle| angle.category = category)
    }

    /// Attaches an inline image to an angle.
    ///
    /// Returns `Ok(false)` without changing anything when `image_ref` is not
    /// an inline image.
    pub fn set_angle_image(&mut self, id: &str, image_ref: &str) -> CatalogResult<bool> {
        let Some(image) = normalize_image_ref(&Value::String(image_ref.to_string())) else {
            self.require_angle(id)?;
            debug!("event=set_angle_image module=catalog status=skip reason=not_inline_image");
            return Ok(false);
        };
        self.edit_angle(id, "set_angle_image", |angle| angle.image = Some(image))?;
        Ok(true)
    }

    pub fn clear_angle_image(&mut self, id: &str) -> CatalogResult<()> {
        self.edit_angle(id, "clear_angle_image", |angle| angle.image = None)
    }

    pub fn delete_angle(&mut self, id: &str) -> CatalogResult<()> {
        self.require_angle(id)?;
        let mut next = self.snapshot().clone();
        next.angles.retain(|angle| angle.id != id);
        self.commit(&next, "delete_angle")
    }

    /// Sets the cover image of a hold; non-inline images are a no-op.
    pub fn set_cover_image(&mut self, hold: &str, image_ref: &str) -> CatalogResult<bool> {
        let hold = self.resolve_hold(hold)?;
        let Some(image) = normalize_image_ref(&Value::String(image_ref.to_string())) else {
            debug!("event=set_cover_image module=catalog status=skip reason=not_inline_image");
            return Ok(false);
        };

        let mut next = self.snapshot().clone();
        next.hold_images.insert(hold, image);
        self.commit(&next, "set_cover_image")?;
        Ok(true)
    }

    /// Removes the cover image of a hold; returns whether one existed.
    pub fn remove_cover_image(&mut self, hold: &str) -> CatalogResult<bool> {
        let hold = self.resolve_hold(hold)?;
        if !self.snapshot().hold_images.contains_key(&hold) {
            return Ok(false);
        }

        let mut next = self.snapshot().clone();
        next.hold_images.remove(&hold);
        self.commit(&next, "remove_cover_image")?;
        Ok(true)
    }

    /// Image to show for an angle: its own, else its hold's cover image.
    pub fn display_image(&self, id: &str) -> CatalogResult<Option<String>> {
        let snapshot = self.snapshot();
        let angle = snapshot
            .angle(id)
            .ok_or_else(|| CatalogError::AngleNotFound(id.to_string()))?;
        Ok(snapshot.display_image(angle).map(str::to_string))
    }

    fn resolve_hold(&self, name: &str) -> CatalogResult<String> {
        let normalized = normalize_name_str(name);
        self.snapshot()
            .find_hold(&normalized)
            .map(str::to_string)
            .ok_or(CatalogError::HoldNotFound(normalized))
    }

    fn require_angle(&self, id: &str) -> CatalogResult<()> {
        match self.snapshot().angle(id) {
            Some(_) => Ok(()),
            None => Err(CatalogError::AngleNotFound(id.to_string())),
        }
    }

    fn edit_angle(
        &mut self,
        id: &str,
        action: &'static str,
        edit: impl FnOnce(&mut Angle),
    ) -> CatalogResult<()> {
        let mut next = self.snapshot().clone();
        let angle = next
            .angle_mut(id)
            .ok_or_else(|| CatalogError::AngleNotFound(id.to_string()))?;
        edit(angle);
        self.commit(&next, action)
    }

    fn commit(&mut self, next: &CanonicalSnapshot, action: &'static str) -> CatalogResult<()> {
        self.store.replace(next)?;
        debug!("event=catalog_edit module=catalog status=ok action={action}");
        Ok(())
    }
}
