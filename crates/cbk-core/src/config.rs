use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::UnknownTag;
use crate::types::Algorithm;

/// Top-level configuration (loaded from cryptobackup.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CbkConfig {
    pub storage: StorageConfig,
    pub crypto: CryptoConfig,
    pub logging: LoggingConfig,
}

/// Which object store implementation to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// One data file plus one `.meta` sidecar per object under `root`
    #[default]
    Local,
    /// Process-local, non-persistent store
    Memory,
}

impl FromStr for StorageBackendKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackendKind::Local),
            "memory" => Ok(StorageBackendKind::Memory),
            _ => Err(UnknownTag {
                what: "storage backend",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store implementation (default: local)
    pub backend: StorageBackendKind,
    /// Base directory of the local store (default: ./backup)
    pub root: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Algorithm used when the command line does not name one (default: aes)
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Local,
            root: PathBuf::from("./backup"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[storage]
backend = "memory"
root = "/srv/backup"

[crypto]
algorithm = "xor"

[logging]
level = "debug"
format = "json"
"#;
        let config: CbkConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.storage.root, PathBuf::from("/srv/backup"));
        assert_eq!(config.crypto.algorithm, Algorithm::Xor);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config: CbkConfig = toml::from_str("").unwrap();

        assert_eq!(config.storage.backend, StorageBackendKind::Local);
        assert_eq!(config.storage.root, PathBuf::from("./backup"));
        assert_eq!(config.crypto.algorithm, Algorithm::Aes);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[storage]
root = "/mnt/usb/backup"
"#;
        let config: CbkConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.storage.root, PathBuf::from("/mnt/usb/backup"));
        // Defaults
        assert_eq!(config.storage.backend, StorageBackendKind::Local);
        assert_eq!(config.crypto.algorithm, Algorithm::Aes);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let toml_str = r#"
[crypto]
algorithm = "rot13"
"#;
        assert!(toml::from_str::<CbkConfig>(toml_str).is_err());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Local".parse::<StorageBackendKind>().unwrap(), StorageBackendKind::Local);
        assert!("gdrive".parse::<StorageBackendKind>().is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = CbkConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: CbkConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.storage.root, parsed.storage.root);
        assert_eq!(config.crypto.algorithm, parsed.crypto.algorithm);
        assert_eq!(config.logging.format, parsed.logging.format);
    }
}
