//! Store configuration.
//!
//! # Invariants
//! - A store never opens with a config that fails `validate()`.
//! - The three storage keys are distinct.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default quiet period before a pending snapshot is written.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
/// Default number of retained backups.
pub const DEFAULT_BACKUP_LIMIT: usize = 5;
/// Default serialized snapshot ceiling (4 MiB).
pub const DEFAULT_QUOTA_BYTES: usize = 4 * 1024 * 1024;

pub const DEFAULT_SNAPSHOT_KEY: &str = "anglesProto.store";
pub const DEFAULT_LAST_MODIFIED_KEY: &str = "anglesProto.lastModified";
pub const DEFAULT_BACKUPS_KEY: &str = "anglesProto.backups";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    ZeroQuota,
    ZeroBackupLimit,
    EmptyKey(&'static str),
    DuplicateKey(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid store config: {message}"),
            Self::ZeroQuota => write!(f, "quota_bytes must be greater than zero"),
            Self::ZeroBackupLimit => write!(f, "backup_limit must be greater than zero"),
            Self::EmptyKey(field) => write!(f, "{field} cannot be empty"),
            Self::DuplicateKey(key) => write!(f, "storage key `{key}` is used twice"),
        }
    }
}

impl Error for ConfigError {}

/// Tunables for one store instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    pub debounce_ms: u64,
    pub backup_limit: usize,
    pub quota_bytes: usize,
    pub snapshot_key: String,
    pub last_modified_key: String,
    pub backups_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            backup_limit: DEFAULT_BACKUP_LIMIT,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            last_modified_key: DEFAULT_LAST_MODIFIED_KEY.to_string(),
            backups_key: DEFAULT_BACKUPS_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    /// Parses a (possibly partial) JSON config; missing fields use defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quota_bytes == 0 {
            return Err(ConfigError::ZeroQuota);
        }
        if self.backup_limit == 0 {
            return Err(ConfigError::ZeroBackupLimit);
        }

        let keys = [
            ("snapshot_key", self.snapshot_key.as_str()),
            ("last_modified_key", self.last_modified_key.as_str()),
            ("backups_key", self.backups_key.as_str()),
        ];
        for (field, key) in keys {
            if key.trim().is_empty() {
                return Err(ConfigError::EmptyKey(field));
            }
        }
        for (index, (_, key)) in keys.iter().enumerate() {
            if keys[index + 1..].iter().any(|(_, other)| other == key) {
                return Err(ConfigError::DuplicateKey((*key).to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DEFAULT_QUOTA_BYTES};

    #[test]
    fn partial_json_keeps_defaults() {
        let config = StoreConfig::from_json_str(r#"{ "debounceMs": 50 }"#).unwrap();
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.quota_bytes, DEFAULT_QUOTA_BYTES);
        assert_eq!(config.backup_limit, 5);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert_eq!(
            StoreConfig::from_json_str(r#"{ "quotaBytes": 0 }"#).unwrap_err(),
            ConfigError::ZeroQuota
        );
        assert!(matches!(
            StoreConfig::from_json_str("not json").unwrap_err(),
            ConfigError::Parse(_)
        ));

        let config = StoreConfig {
            backups_key: "anglesProto.store".to_string(),
            ..StoreConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::DuplicateKey("anglesProto.store".to_string())
        );
    }
}
