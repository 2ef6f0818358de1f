//! Crash-safe replacement of settings files.
//!
//! The new contents are written to a temporary file in the same directory as
//! the target, synced, and then renamed over the target. If any step fails the
//! temporary file is removed and the previous file is left as it was.

use std::io::Write;
use std::path::Path;

use tempfile::Builder;

use crate::error::{RegistryError, RegistryResult};

/// Atomically replaces `path` with `contents`.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> RegistryResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "settings".to_owned());

    let mut temp = Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| RegistryError::io(path, e))?;

    temp.write_all(contents).map_err(|e| RegistryError::io(path, e))?;
    temp.flush().map_err(|e| RegistryError::io(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| RegistryError::io(path, e))?;

    temp.persist(path).map_err(|e| RegistryError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
