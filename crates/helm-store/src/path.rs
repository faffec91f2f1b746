//! Node path validation and manipulation
//!
//! Paths are absolute and slash separated (`/helm/agents/host-1`). Every
//! caller-controlled name MUST pass [`validate_segment`] before it is joined
//! into a path, otherwise a name like `a/b` would address a different node.

use crate::error::{Result, StoreError};

/// The root node, which always exists and can never be deleted.
pub const ROOT: &str = "/";

/// Check whether a single path segment is legal.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.chars().any(|c| c == '/' || c == '\0' || c.is_control())
}

/// Validate one path segment (an agent name, a job ID, ...).
pub fn validate_segment(segment: &str) -> Result<&str> {
    if is_valid_segment(segment) {
        Ok(segment)
    } else {
        Err(StoreError::InvalidPath(format!(
            "illegal path segment '{}': must be non-empty, must not start with '.', \
             and must not contain '/' or control characters",
            segment.escape_debug()
        )))
    }
}

/// Validate a full node path.
pub fn validate_path(path: &str) -> Result<&str> {
    if path == ROOT {
        return Ok(path);
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(StoreError::InvalidPath(format!(
            "path must be absolute: '{}'",
            path
        )));
    };
    for segment in rest.split('/') {
        validate_segment(segment).map_err(|_| {
            StoreError::InvalidPath(format!("illegal segment '{}' in path '{}'", segment, path))
        })?;
    }
    Ok(path)
}

/// Join a child name onto a parent path.
pub fn join(parent: &str, child: &str) -> String {
    if parent == ROOT {
        format!("/{}", child)
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Parent of a path, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of a path (empty for the root).
pub fn name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Every non-root prefix of `path`, shortest first.
///
/// `/a/b/c` yields `/a`, `/a/b`, `/a/b/c`.
pub fn ancestors(path: &str) -> Vec<&str> {
    if path == ROOT {
        return Vec::new();
    }
    let mut out: Vec<&str> = path
        .match_indices('/')
        .skip(1)
        .map(|(idx, _)| &path[..idx])
        .collect();
    out.push(path);
    out
}
