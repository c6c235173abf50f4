use std::path::{Path, PathBuf};

use crate::error::{Result, StateError};

/// A connection string of the form `driver:path/to/file.db`, split into the
/// pieces snapshot operations work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub driver: String,
    /// Directory holding the active file and every snapshot; `.` when the
    /// path has no directory component.
    pub storage_path: String,
    pub active_filename: String,
}

impl ConnectionDescriptor {
    /// Split `connection` on its first `:`. With `fold_case` the path is
    /// lower-cased before it is split; the driver is always kept verbatim.
    pub fn parse(connection: &str, fold_case: bool) -> Result<Self> {
        let malformed = || StateError::MalformedConnectionString {
            connection: connection.to_string(),
        };

        let (driver, rest) = connection.split_once(':').ok_or_else(malformed)?;
        let rest = if fold_case {
            rest.to_lowercase()
        } else {
            rest.to_string()
        };

        let path = Path::new(&rest);
        let active_filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(malformed)?
            .to_string();
        let storage_path = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().into_owned(),
            _ => ".".to_string(),
        };

        Ok(Self {
            driver: driver.to_string(),
            storage_path,
            active_filename,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        Path::new(&self.storage_path)
    }

    pub fn active_path(&self) -> PathBuf {
        self.storage_dir().join(&self.active_filename)
    }

    pub fn to_connection_string(&self) -> String {
        render(&self.driver, &self.storage_path, &self.active_filename)
    }
}

/// Build `driver:dir/filename`, adding the `/` only when `dir` lacks one.
pub fn render(driver: &str, dir: &str, filename: &str) -> String {
    format!("{}:{}{}", driver, with_trailing_slash(dir), filename)
}

fn with_trailing_slash(dir: &str) -> String {
    if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{}/", dir)
    }
}
