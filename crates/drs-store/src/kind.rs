//! Per-resource-kind directories
//!
//! Resource-kinds arrive from operators and adapters as free text and are
//! joined onto a storage root, so they must stay one directory level deep.

use crate::error::{StoreError, StoreResult};
use std::path::{Component, Path, PathBuf};

/// Whether `kind` names exactly one plain directory under a storage root
///
/// Rejects empty names, `.`/`..`, absolute paths and anything containing a
/// path separator.
#[must_use]
pub fn is_valid_kind(kind: &str) -> bool {
    if kind.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(kind).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name.to_str() == Some(kind)
    )
}

/// Directory for `kind` under `root`, created if missing
///
/// # Errors
/// - `StoreError::InvalidKind` if `kind` fails [`is_valid_kind`]; nothing
///   is created
/// - `StoreError::Io` if the directory cannot be created
pub fn kind_dir(root: &Path, kind: &str) -> StoreResult<PathBuf> {
    if !is_valid_kind(kind) {
        return Err(StoreError::InvalidKind {
            kind: kind.to_string(),
            path: root.to_path_buf(),
        });
    }
    let dir = root.join(kind);
    std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
    Ok(dir)
}
