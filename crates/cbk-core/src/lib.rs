pub mod config;
pub mod error;
pub mod types;

pub use error::{ErrorKind, UnknownTag};
pub use types::{Algorithm, FileEntry, Metadata};

/// Suffix of the sidecar object holding an object's metadata
pub const META_SUFFIX: &str = ".meta";

/// Well-known metadata keys written by ciphers and the pipeline
pub mod meta_keys {
    pub const ALGORITHM: &str = "algorithm";
    pub const KEY_SIZE: &str = "key_size";
    pub const ORIGINAL_NAME: &str = "original_name";
    pub const ORIGINAL_SIZE: &str = "original_size";
    pub const ENCRYPTED_SIZE: &str = "encrypted_size";
    pub const UPLOAD_TIME: &str = "upload_time";
}
