//! Use-case services over the store.
//!
//! # Responsibility
//! - Turn admin actions and file transfers into whole-snapshot replacements.
//! - Keep UI layers away from snapshot internals.

pub mod catalog_service;
pub mod transfer_service;
