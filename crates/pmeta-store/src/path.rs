//! Helpers for slash-delimited store paths.
//!
//! A well-formed path is absolute, has no empty segments and no trailing
//! slash. The root is `/`.

use crate::error::{MetadataStoreError, StoreResult};

/// The root path of every store.
pub const ROOT_PATH: &str = "/";

/// Check that `path` is a well-formed absolute store path.
pub fn validate_path(path: &str) -> StoreResult<()> {
    let invalid = |reason: &str| {
        Err(MetadataStoreError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        })
    };

    if path == ROOT_PATH {
        return Ok(());
    }
    if !path.starts_with('/') {
        return invalid("path must start with '/'");
    }
    if path.ends_with('/') {
        return invalid("path must not end with '/'");
    }
    for segment in path[1..].split('/') {
        match segment {
            "" => return invalid("empty path segment"),
            "." | ".." => return invalid("relative path segment"),
            _ => {}
        }
    }
    Ok(())
}

/// Return the parent of a well-formed path, or `None` for the root.
pub fn parent_path(path: &str) -> Option<&str> {
    if path == ROOT_PATH {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT_PATH),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Return the last segment of a well-formed path (empty for the root).
pub fn child_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a child segment onto a parent path.
pub fn join_path(parent: &str, child: &str) -> String {
    if parent == ROOT_PATH {
        format!("/{}", child)
    } else {
        format!("{}/{}", parent, child)
    }
}
