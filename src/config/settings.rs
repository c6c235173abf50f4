use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, StateError};
use crate::key::DEFAULT_KEY_PREFIX;
use crate::manager::ManagerOptions;

/// Looked up in the current directory when no `--config` is given.
pub const CONFIG_FILE: &str = ".dbstate.json";
/// Overrides the `connection` from the config file.
pub const CONNECTION_ENV: &str = "DBSTATE_CONNECTION";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    /// `driver:path/to/file.db`
    pub connection: Option<String>,
    pub key_prefix: String,
    pub preserve_case: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            connection: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            preserve_case: false,
        }
    }
}

impl StateConfig {
    /// Read an explicit config file, or `.dbstate.json` from `cwd` when it
    /// exists. Without either, defaults apply.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = cwd.join(CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StateError::file("read", path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).map_err(|e| StateError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply the environment connection, if set and non-empty.
    pub fn with_env_connection(mut self, connection: Option<String>) -> Self {
        if let Some(c) = connection.filter(|c| !c.trim().is_empty()) {
            self.connection = Some(c);
        }
        self
    }

    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            key_prefix: self.key_prefix.clone(),
            fold_case: !self.preserve_case,
        }
    }
}
