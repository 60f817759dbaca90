//! Serialized-size budget enforcement.
//!
//! The guard measures the exact payload that would be written, so a
//! rejection carries both sizes and the caller can act on it before the host
//! storage fails on its own terms.

use crate::model::snapshot::CanonicalSnapshot;
use crate::store::StoreResult;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MIB: f64 = 1024.0 * 1024.0;

/// Snapshot is larger than the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError {
    pub measured_bytes: usize,
    pub ceiling_bytes: usize,
}

impl Display for CapacityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "snapshot is {} bytes ({:.2} MiB), over the {} bytes ({:.2} MiB) storage ceiling; \
             remove images or angles and try again",
            self.measured_bytes,
            to_mib(self.measured_bytes),
            self.ceiling_bytes,
            to_mib(self.ceiling_bytes)
        )
    }
}

impl Error for CapacityError {}

fn to_mib(bytes: usize) -> f64 {
    bytes as f64 / MIB
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGuard {
    ceiling_bytes: usize,
}

impl QuotaGuard {
    pub fn new(ceiling_bytes: usize) -> Self {
        Self { ceiling_bytes }
    }

    /// Checks an already measured byte length.
    pub fn check_len(&self, measured_bytes: usize) -> Result<usize, CapacityError> {
        if measured_bytes > self.ceiling_bytes {
            warn!(
                "event=quota_check module=quota status=error measured_bytes={} ceiling_bytes={}",
                measured_bytes, self.ceiling_bytes
            );
            return Err(CapacityError {
                measured_bytes,
                ceiling_bytes: self.ceiling_bytes,
            });
        }
        Ok(measured_bytes)
    }

    /// Serializes `candidate` and checks its size.
    ///
    /// Returns the serialized payload so the caller writes exactly what was
    /// measured.
    pub fn check_size(&self, candidate: &CanonicalSnapshot) -> StoreResult<String> {
        let payload = serde_json::to_string(candidate)?;
        self.check_len(payload.len())?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::{CapacityError, QuotaGuard};

    #[test]
    fn message_names_both_sizes() {
        let message = CapacityError {
            measured_bytes: 5 * 1024 * 1024,
            ceiling_bytes: 4 * 1024 * 1024,
        }
        .to_string();
        assert!(message.contains("5242880 bytes (5.00 MiB)"));
        assert!(message.contains("4194304 bytes (4.00 MiB)"));
    }

    #[test]
    fn ceiling_is_inclusive() {
        let guard = QuotaGuard::new(10);
        assert_eq!(guard.check_len(10), Ok(10));
        assert!(guard.check_len(11).is_err());
    }
}
