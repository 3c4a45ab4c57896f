use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::UnknownTag;

/// String-to-string metadata stored alongside every object.
///
/// Ordered so that sidecar documents and CLI output are deterministic.
pub type Metadata = BTreeMap<String, String>;

/// One child of a hierarchy node, as returned by a store listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Logical path of the child (listing path joined with the child name)
    pub path: String,
    /// Byte size of the ciphertext blob (0 for directories)
    pub size: u64,
    pub is_dir: bool,
    /// Last modification time, seconds since the Unix epoch
    pub mod_time: i64,
    /// Sidecar metadata, empty when none was recorded
    pub metadata: Metadata,
}

impl FileEntry {
    /// Final path segment.
    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.path)
    }
}

/// Cipher selector used by the CLI, the config file, and the cipher factory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// AES-GCM authenticated encryption
    #[default]
    Aes,
    /// Repeating-key XOR stream cipher (no integrity protection)
    Xor,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Aes => "aes",
            Algorithm::Xor => "xor",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes" => Ok(Algorithm::Aes),
            "xor" => Ok(Algorithm::Xor),
            _ => Err(UnknownTag {
                what: "algorithm",
                value: s.to_string(),
            }),
        }
    }
}
