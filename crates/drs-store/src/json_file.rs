//! JSON document files
//!
//! Reads treat a missing file as `None`. Writes go to a temp file in the
//! destination directory which is then renamed over the target, so readers
//! never observe a half-written snapshot or pointer.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read and decode a JSON file, `None` when it does not exist
///
/// # Errors
/// - `StoreError::Io` if the file exists but cannot be read
/// - `StoreError::Json` if the content does not decode as `T`
pub fn read<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let Some(bytes) = read_bytes(path)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::json(path, e))
}

/// Read raw file bytes, `None` when it does not exist
///
/// # Errors
/// - `StoreError::Io` on any read failure other than "not found"
pub fn read_bytes(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Encode `value` as 2-space pretty JSON and atomically replace `path`
///
/// # Errors
/// - `StoreError::Json` if `value` cannot be encoded
/// - `StoreError::Io` / `StoreError::Persist` on filesystem failures
pub fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::json(path, e))?;
    bytes.push(b'\n');
    write_bytes(path, &bytes)
}

/// Atomically replace `path` with `bytes`
///
/// # Errors
/// - `StoreError::Io` if the temp file cannot be created or written
/// - `StoreError::Persist` if the final rename fails
pub fn write_bytes(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| StoreError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Remove a file, treating "already gone" as success
///
/// # Errors
/// - `StoreError::Io` on any failure other than "not found"
pub fn remove(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
