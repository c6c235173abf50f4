//! Point-in-time snapshots of a single SQLite database file, for test
//! fixtures: save the active file under a generated key, copy a snapshot
//! back, or reset to an empty database.
//!
//! ```no_run
//! use dbstate::{SnapshotManager, SqliteConnection};
//!
//! # fn main() -> dbstate::Result<()> {
//! let mut states = SnapshotManager::init(SqliteConnection::new("sqlite:/data/test.db"))?;
//! let key = states.save_state()?;
//! // ... run a test that writes to the database ...
//! states.load_state(&key)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod descriptor;
pub mod drivers;
pub mod error;
pub mod key;
pub mod manager;
pub mod storage;
pub mod utils;

pub use descriptor::ConnectionDescriptor;
pub use drivers::sqlite::SqliteConnection;
pub use drivers::{Connection, SUPPORTED_DRIVERS};
pub use error::{Result, StateError};
pub use key::SnapshotKey;
pub use manager::{ManagerOptions, SnapshotManager};
pub use storage::SnapshotEntry;
