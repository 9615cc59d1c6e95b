use std::fs::create_dir_all;
use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;

use tracing::error;

use crate::Result;
use crate::StorageError;

pub fn create_parent_dir_if_not_exist(path: &Path) -> Result<()> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            if let Err(e) = create_dir_all(parent_dir) {
                error!("Failed to create log directory: {:?}", e);
                return Err(StorageError::IoError(e).into());
            }
        }
    }
    Ok(())
}

pub fn open_file_for_append(path: &Path) -> Result<File> {
    create_parent_dir_if_not_exist(path)?;
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| StorageError::IoError(e).into())
}

/// Checks that `path` exists (creating it if needed) and is writable
pub fn ensure_writable_dir(path: &Path) -> Result<()> {
    create_dir_all(path).map_err(StorageError::IoError)?;

    let probe = path.join(".permission_test");
    std::fs::write(&probe, b"test").map_err(StorageError::IoError)?;
    std::fs::remove_file(&probe).ok();
    Ok(())
}
