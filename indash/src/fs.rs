//! File system-related utilities.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::Error;

/// Read the entire contents of the given file into a string, recording the
/// file's path in any resulting error.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String, Error> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("while trying to read from {}", path.display()), e))
}

/// Resolve `path` relative to the directory containing `anchor_file`. Absolute
/// paths are returned unchanged.
pub fn resolve_relative_to<P1, P2>(anchor_file: P1, path: P2) -> PathBuf
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match anchor_file.as_ref().parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
