use log::debug;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::Path;

use crate::error::{Result, StateError};

/// Copy `from` over `to`, returning the number of bytes written. A missing
/// source is reported against the source path.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    if !from.is_file() {
        return Err(StateError::file(
            "read",
            from,
            Error::new(ErrorKind::NotFound, "no such file"),
        ));
    }
    debug!("copy {} -> {}", from.display(), to.display());
    fs::copy(from, to).map_err(|e| StateError::file("copy into", to, e))
}

pub fn remove_file(path: &Path) -> Result<()> {
    debug!("delete {}", path.display());
    fs::remove_file(path).map_err(|e| StateError::file("delete", path, e))
}

/// Like `remove_file`, but a file that is already gone is not an error.
/// Returns whether anything was deleted.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("delete {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StateError::file("delete", path, e)),
    }
}
