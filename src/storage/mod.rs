use chrono::{DateTime, Local};
use log::warn;
use serde::Serialize;
use std::io::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, StateError};
use crate::key::SnapshotKey;
use crate::utils::io::remove_file_if_exists;

/// Files SQLite keeps next to a database while it is (or was) open.
pub const SIDECAR_SUFFIXES: &[&str] = &["-wal", "-shm", "-journal"];

/// One `{key}.db` file found in a storage directory.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry {
    pub key: SnapshotKey,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
}

pub fn snapshot_path(storage_dir: &Path, key: &SnapshotKey) -> PathBuf {
    storage_dir.join(key.file_name())
}

pub fn sidecar_paths(db_file: &Path) -> Vec<PathBuf> {
    SIDECAR_SUFFIXES
        .iter()
        .map(|suffix| {
            let mut name = db_file.as_os_str().to_os_string();
            name.push(suffix);
            PathBuf::from(name)
        })
        .collect()
}

/// Remove leftover sidecar files of `db_file`. Failures are logged, not
/// returned: the database file itself is what callers act on.
pub fn remove_sidecars(db_file: &Path) {
    for path in sidecar_paths(db_file) {
        if let Err(e) = remove_file_if_exists(&path) {
            warn!("could not remove sidecar: {}", e);
        }
    }
}

/// Snapshot files in `storage_dir` whose key starts with `prefix`, oldest
/// first.
pub fn list_snapshots(storage_dir: &Path, prefix: &str) -> Result<Vec<SnapshotEntry>> {
    let list_err = |e: walkdir::Error| {
        let path = e.path().unwrap_or(storage_dir).to_path_buf();
        let source = e.into_io_error().unwrap_or_else(|| Error::other("filesystem loop"));
        StateError::file("list", path, source)
    };

    let mut entries = Vec::new();
    for entry in WalkDir::new(storage_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(list_err)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.strip_suffix(".db"))
            .filter(|stem| stem.starts_with(prefix))
            .and_then(|stem| SnapshotKey::parse(stem).ok())
        else {
            continue;
        };
        let meta = entry.metadata().map_err(list_err)?;
        let modified = meta
            .modified()
            .map_err(|e| StateError::file("stat", entry.path(), e))?;
        entries.push(SnapshotEntry {
            key,
            path: entry.path().to_path_buf(),
            size_bytes: meta.len(),
            modified: DateTime::<Local>::from(modified),
        });
    }

    entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.key.cmp(&b.key)));
    Ok(entries)
}
