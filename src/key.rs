use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};

pub const DEFAULT_KEY_PREFIX: &str = "dbstate_";

/// Names a saved snapshot; the snapshot file is `{key}.db` in the storage
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotKey(String);

impl SnapshotKey {
    /// Accept a caller-supplied key. It has to name a plain file inside the
    /// storage directory, so separators and parent references are refused.
    pub fn parse(key: &str) -> Result<Self> {
        let bad = key.is_empty()
            || key == "."
            || key.contains("..")
            || key.contains(['/', '\\', '\0']);
        if bad {
            return Err(StateError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(SnapshotKey(key.to_string()))
    }

    /// Timestamp-seeded random token: microseconds since the epoch in hex
    /// followed by a random 32-bit suffix.
    pub(crate) fn generate(prefix: &str) -> Self {
        let micros = Utc::now().timestamp_micros().max(0) as u64;
        let salt: u32 = rand::random();
        SnapshotKey(format!("{}{:013x}{:08x}", prefix, micros, salt))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.db", self.0)
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SnapshotKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for SnapshotKey {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self> {
        SnapshotKey::parse(s)
    }
}
