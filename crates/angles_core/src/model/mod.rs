//! Canonical domain model for the hold/angle catalog.
//!
//! # Responsibility
//! - Define the data structures that are written to and read from durable storage.
//! - Provide pure, cascade-aware edits over a whole snapshot.
//!
//! # Invariants
//! - A hold has no identifier of its own; its normalized name is the key.
//! - Every angle references a hold that is a member of the same snapshot.
//! - Every cover-image key is a member of the snapshot hold set.
//!
//! # See also
//! - `crate::migrate` for the only constructor of trusted snapshots.

pub mod angle;
pub mod snapshot;
