//! Logical path handling shared by the store backends
//!
//! Logical paths are slash-separated. Empty and `.` segments are ignored, so
//! `/a//./b` and `a/b` name the same object. A `..` segment is rejected:
//! stores resolve paths beneath a root and never let a caller climb out.
//! Segments ending in `.meta` or `.cbk_tmp` are reserved for sidecars and
//! staged writes at every level of the hierarchy.

use cbk_core::META_SUFFIX;

use crate::error::{StoreError, StoreResult};

/// Suffix of a file being staged before it is renamed into place
pub const TEMP_SUFFIX: &str = ".cbk_tmp";

/// Split `path` into its meaningful segments.
pub fn segments(path: &str) -> StoreResult<Vec<&str>> {
    let mut out = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                return Err(StoreError::InvalidPath {
                    path: path.to_string(),
                    reason: "parent directory segments are not allowed",
                })
            }
            s if is_reserved_name(s) => {
                return Err(StoreError::InvalidPath {
                    path: path.to_string(),
                    reason: "names ending in .meta or .cbk_tmp are reserved",
                })
            }
            s => out.push(s),
        }
    }
    Ok(out)
}

/// Segments of a path that must name an object rather than the root.
pub fn object_segments(path: &str) -> StoreResult<Vec<&str>> {
    let segs = segments(path)?;
    if segs.is_empty() {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "path does not name an object",
        });
    }
    Ok(segs)
}

/// Whether a directory entry name belongs to a sidecar or a staged write.
pub fn is_reserved_name(name: &str) -> bool {
    name.ends_with(META_SUFFIX) || name.ends_with(TEMP_SUFFIX)
}

/// Whether any segment of `path` is reserved. Such a path never names an object.
pub fn names_reserved(path: &str) -> bool {
    path.split('/').any(is_reserved_name)
}

/// Logical path of child `name` under `parent`, keeping the caller's prefix style.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_normalize() {
        assert_eq!(segments("/a//./b/").unwrap(), vec!["a", "b"]);
        assert_eq!(segments("a/b").unwrap(), vec!["a", "b"]);
        assert!(segments("/").unwrap().is_empty());
        assert!(segments("").unwrap().is_empty());
    }

    #[test]
    fn test_parent_segments_rejected() {
        let err = segments("/a/../../etc/passwd").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
        assert_eq!(err.kind(), cbk_core::ErrorKind::Construction);
    }

    #[test]
    fn test_object_segments() {
        assert_eq!(object_segments("/x.enc").unwrap(), vec!["x.enc"]);
        assert!(object_segments("/").is_err());
        assert!(object_segments("/a/b.txt.meta").is_err());
    }

    #[test]
    fn test_reserved_segments_rejected_at_any_depth() {
        for path in ["/x.meta/y", "/a/x.meta/b/c", "/x.cbk_tmp", "/d/.f.cbk_tmp/g"] {
            let err = segments(path).unwrap_err();
            assert!(matches!(err, StoreError::InvalidPath { .. }), "{path}");
            assert!(names_reserved(path), "{path}");
        }
        assert!(!names_reserved("/metadata/x.metal"));
        assert_eq!(segments("/metadata/x.metal").unwrap(), vec!["metadata", "x.metal"]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "x.enc"), "/x.enc");
        assert_eq!(join("", "x.enc"), "x.enc");
        assert_eq!(join("/a/", "b.txt"), "/a/b.txt");
        assert_eq!(join("a", "b.txt"), "a/b.txt");
    }
}
