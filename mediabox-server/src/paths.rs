//! Confinement of request-supplied paths to a base directory

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve `requested` against `base`, rejecting anything that lands outside it
///
/// Resolution is lexical (`.` and `..` are folded without touching the
/// filesystem). Absolute inputs are accepted only when already under `base`.
pub fn resolve_within(base: &Path, requested: &str) -> Result<PathBuf> {
    if requested.contains('\0') {
        return Err(Error::BadRequest("Invalid file path.".to_string()));
    }

    let base = normalize(base);
    let candidate = normalize(&base.join(requested));

    if candidate.starts_with(&base) {
        Ok(candidate)
    } else {
        Err(Error::BadRequest("Invalid file path.".to_string()))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root is a no-op, like the OS does
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
