use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::store::error::StoreError;

/// Replace `path` with `contents` through a temporary file in the same
/// directory, so readers see either the old or the new file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::io(std::io::ErrorKind::InvalidInput.into(), "write_atomic", path.to_path_buf()))?;
    if !parent.is_dir() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(e, "create_dir_all", parent.to_path_buf()))?;
    }

    let mut temp_file =
        NamedTempFile::new_in(parent).map_err(|e| StoreError::io(e, "create_temp_file", parent.to_path_buf()))?;
    temp_file
        .write_all(contents)
        .map_err(|e| StoreError::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| StoreError::io(e, "sync_temp_file", temp_file.path().to_path_buf()))?;
    temp_file
        .persist(path)
        .map_err(|e| StoreError::io(e.error, "persist_temp_file", path.to_path_buf()))?;
    Ok(())
}

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, StoreError> {
    fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StoreError::FileNotFound(path.to_path_buf()),
        _ => StoreError::io(e, "read", path.to_path_buf()),
    })
}
