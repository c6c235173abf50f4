use log::{debug, info};
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

use crate::descriptor::{ConnectionDescriptor, render};
use crate::drivers::{Connection, is_supported};
use crate::error::{Result, StateError};
use crate::key::{DEFAULT_KEY_PREFIX, SnapshotKey};
use crate::storage::{self, SnapshotEntry};
use crate::utils::hash::same_contents;
use crate::utils::io::{copy_file, remove_file, remove_file_if_exists};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Prepended to every generated key; also selects which files
    /// `list_states` and `purge_states` consider snapshots.
    pub key_prefix: String,
    /// Lower-case the path part of the connection string when deriving the
    /// storage path and filename.
    pub fold_case: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            fold_case: true,
        }
    }
}

/// Saves, restores and resets the single database file a connection points
/// at. Snapshots are plain `{key}.db` copies next to the active file.
///
/// The manager does no locking. Callers must make sure nothing else writes
/// the database while a snapshot is taken or restored.
pub struct SnapshotManager<C: Connection> {
    conn: C,
    base_filename: String,
    options: ManagerOptions,
}

impl<C: Connection> SnapshotManager<C> {
    pub fn init(conn: C) -> Result<Self> {
        Self::with_options(conn, ManagerOptions::default())
    }

    /// Validate the driver and capture the current filename as the target of
    /// every later restore or reset.
    pub fn with_options(conn: C, options: ManagerOptions) -> Result<Self> {
        if !is_supported(conn.driver_name()) {
            return Err(StateError::UnsupportedDriver {
                driver: conn.driver_name().to_string(),
            });
        }
        SnapshotKey::parse(&options.key_prefix)?;

        let descriptor = ConnectionDescriptor::parse(conn.connection_string(), options.fold_case)?;
        info!(
            "managing {} in {}",
            descriptor.active_filename, descriptor.storage_path
        );
        Ok(Self {
            conn,
            base_filename: descriptor.active_filename,
            options,
        })
    }

    fn descriptor(&self) -> Result<ConnectionDescriptor> {
        ConnectionDescriptor::parse(self.conn.connection_string(), self.options.fold_case)
    }

    pub fn storage_path(&self) -> Result<String> {
        Ok(self.descriptor()?.storage_path)
    }

    /// Move the active file's directory, keeping its filename.
    pub fn set_storage_path(&mut self, path: &str) -> Result<()> {
        let filename = self.current_filename()?;
        let dir = if path.is_empty() { "." } else { path };
        let connection = render(self.conn.driver_name(), dir, &filename);
        debug!("connection string -> {}", connection);
        self.conn.set_connection_string(connection);
        Ok(())
    }

    pub fn current_filename(&self) -> Result<String> {
        Ok(self.descriptor()?.active_filename)
    }

    pub(crate) fn set_current_filename(&mut self, filename: &str) -> Result<()> {
        let dir = self.storage_path()?;
        let connection = render(self.conn.driver_name(), &dir, filename);
        debug!("connection string -> {}", connection);
        self.conn.set_connection_string(connection);
        Ok(())
    }

    pub fn base_filename(&self) -> &str {
        &self.base_filename
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    pub fn active_path(&self) -> Result<PathBuf> {
        Ok(self.descriptor()?.active_path())
    }

    pub fn snapshot_path(&self, key: &SnapshotKey) -> Result<PathBuf> {
        Ok(storage::snapshot_path(self.descriptor()?.storage_dir(), key))
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Copy the active file to a freshly keyed snapshot. The connection is
    /// left open; with WAL journaling, checkpoint first or the copy misses
    /// whatever still sits in the log.
    pub fn save_state(&self) -> Result<SnapshotKey> {
        let descriptor = self.descriptor()?;
        let dir = descriptor.storage_dir();
        let key = unique_key(dir, || SnapshotKey::generate(&self.options.key_prefix));

        let bytes = copy_file(&descriptor.active_path(), &storage::snapshot_path(dir, &key))?;
        info!("saved {} as {} ({} bytes)", descriptor.active_filename, key, bytes);
        Ok(key)
    }

    /// Close the connection and copy the snapshot over the base file. The
    /// connection ends up pointing at the base file, closed.
    pub fn load_state(&mut self, key: &SnapshotKey) -> Result<()> {
        let descriptor = self.descriptor()?;
        let source = storage::snapshot_path(descriptor.storage_dir(), key);
        if !source.is_file() {
            return Err(StateError::file(
                "read",
                source,
                Error::new(ErrorKind::NotFound, "no such snapshot"),
            ));
        }

        self.conn.close()?;
        let target = descriptor.storage_dir().join(&self.base_filename);
        storage::remove_sidecars(&target);
        copy_file(&source, &target)?;

        let base = self.base_filename.clone();
        self.set_current_filename(&base)?;
        info!("restored {} from {}", base, key);
        Ok(())
    }

    /// Close the connection, delete the active file and point back at the
    /// base file, which SQLite recreates empty on the next open.
    ///
    /// Migrations are not supported: passing `migrate_to` fails before
    /// anything is touched.
    pub fn reset_state(&mut self, migrate_to: Option<&str>) -> Result<()> {
        if migrate_to.is_some() {
            return Err(StateError::NotImplemented {
                feature: "running migrations on reset",
            });
        }

        let descriptor = self.descriptor()?;
        self.conn.close()?;
        let active = descriptor.active_path();
        if !remove_file_if_exists(&active)? {
            debug!("{} already absent", active.display());
        }
        storage::remove_sidecars(&active);

        let base = self.base_filename.clone();
        self.set_current_filename(&base)?;
        info!("reset {}", base);
        Ok(())
    }

    pub fn list_states(&self) -> Result<Vec<SnapshotEntry>> {
        let descriptor = self.descriptor()?;
        storage::list_snapshots(descriptor.storage_dir(), &self.options.key_prefix)
    }

    pub fn delete_state(&self, key: &SnapshotKey) -> Result<()> {
        remove_file(&self.snapshot_path(key)?)
    }

    /// The snapshots `purge_states` would delete: everything `list_states`
    /// reports except the current and base database files.
    pub fn purgeable_states(&self) -> Result<Vec<SnapshotEntry>> {
        let current = self.current_filename()?;
        let mut entries = self.list_states()?;
        entries.retain(|entry| {
            let name = entry.key.file_name();
            name != current && name != self.base_filename
        });
        Ok(entries)
    }

    /// Delete every snapshot `purgeable_states` reports. Returns how many
    /// were removed.
    pub fn purge_states(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in self.purgeable_states()? {
            remove_file(&entry.path)?;
            removed += 1;
        }
        info!("purged {} snapshot(s)", removed);
        Ok(removed)
    }

    /// Whether the active file is byte-identical to the snapshot.
    pub fn state_matches(&self, key: &SnapshotKey) -> Result<bool> {
        let descriptor = self.descriptor()?;
        same_contents(
            &descriptor.active_path(),
            &storage::snapshot_path(descriptor.storage_dir(), key),
        )
    }
}

/// Draw keys until one does not name an existing file in `dir`.
fn unique_key(dir: &Path, mut make: impl FnMut() -> SnapshotKey) -> SnapshotKey {
    loop {
        let key = make();
        if !storage::snapshot_path(dir, &key).exists() {
            return key;
        }
        debug!("snapshot key {} taken, drawing another", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct StubConnection {
        connection: String,
        driver: String,
        closes: usize,
    }

    impl StubConnection {
        fn new(connection: &str) -> Self {
            Self {
                connection: connection.to_string(),
                driver: connection.split(':').next().unwrap_or("").to_string(),
                closes: 0,
            }
        }
    }

    impl Connection for StubConnection {
        fn connection_string(&self) -> &str {
            &self.connection
        }

        fn set_connection_string(&mut self, connection: String) {
            self.connection = connection;
        }

        fn close(&mut self) -> Result<()> {
            self.closes += 1;
            Ok(())
        }

        fn driver_name(&self) -> &str {
            &self.driver
        }
    }

    fn verbatim() -> ManagerOptions {
        ManagerOptions {
            fold_case: false,
            ..ManagerOptions::default()
        }
    }

    fn manager_in(dir: &Path) -> SnapshotManager<StubConnection> {
        let conn = StubConnection::new(&format!("sqlite:{}/test.db", dir.display()));
        SnapshotManager::with_options(conn, verbatim()).unwrap()
    }

    #[test]
    fn derives_path_and_filename() {
        let m = SnapshotManager::init(StubConnection::new("sqlite:/data/test.db")).unwrap();
        assert_eq!(m.storage_path().unwrap(), "/data");
        assert_eq!(m.current_filename().unwrap(), "test.db");
        assert_eq!(m.base_filename(), "test.db");
    }

    #[test]
    fn init_rejects_unsupported_driver() {
        let err = SnapshotManager::init(StubConnection::new("mysql:/data/test.db"))
            .err()
            .unwrap();
        assert!(matches!(err, StateError::UnsupportedDriver { ref driver } if driver == "mysql"));
    }

    #[test]
    fn init_rejects_bad_prefix() {
        let options = ManagerOptions {
            key_prefix: "../up".into(),
            ..ManagerOptions::default()
        };
        assert!(matches!(
            SnapshotManager::with_options(StubConnection::new("sqlite:/d/t.db"), options),
            Err(StateError::InvalidKey { .. })
        ));
    }

    #[test]
    fn malformed_connection_after_init() {
        let mut conn = StubConnection::new("sqlite:/data/test.db");
        conn.connection = "nodbseparator".into();
        assert!(matches!(
            SnapshotManager::init(conn),
            Err(StateError::MalformedConnectionString { .. })
        ));

        let mut m = SnapshotManager::init(StubConnection::new("sqlite:/data/test.db")).unwrap();
        m.connection_mut().connection = "nodbseparator".into();
        assert!(matches!(
            m.storage_path(),
            Err(StateError::MalformedConnectionString { .. })
        ));
        assert!(matches!(
            m.current_filename(),
            Err(StateError::MalformedConnectionString { .. })
        ));
    }

    #[test]
    fn set_storage_path_normalizes_trailing_slash() {
        let mut m = SnapshotManager::init(StubConnection::new("sqlite:/data/test.db")).unwrap();
        m.set_storage_path("/tmp/fixtures").unwrap();
        assert_eq!(m.connection().connection, "sqlite:/tmp/fixtures/test.db");
        m.set_storage_path("/srv/").unwrap();
        assert_eq!(m.connection().connection, "sqlite:/srv/test.db");
        assert_eq!(m.storage_path().unwrap(), "/srv");
    }

    #[test]
    fn set_current_filename_stays_in_storage_path() {
        let mut m = SnapshotManager::init(StubConnection::new("sqlite:/data/test.db")).unwrap();
        m.set_current_filename("other.db").unwrap();
        assert_eq!(m.connection().connection, "sqlite:/data/other.db");
        assert_eq!(m.base_filename(), "test.db");
    }

    #[test]
    fn unique_key_skips_existing_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("k1.db"), b"").unwrap();
        fs::write(dir.path().join("k2.db"), b"").unwrap();

        let mut candidates = ["k1", "k2", "k3"].into_iter();
        let key = unique_key(dir.path(), || {
            SnapshotKey::parse(candidates.next().unwrap()).unwrap()
        });
        assert_eq!(key.as_str(), "k3");
    }

    #[test]
    fn save_leaves_connection_alone() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.db"), b"v1").unwrap();
        let m = manager_in(dir.path());
        let before = m.connection().connection.clone();

        let key = m.save_state().unwrap();

        assert_eq!(m.connection().closes, 0);
        assert_eq!(m.connection().connection, before);
        assert_eq!(fs::read(m.snapshot_path(&key).unwrap()).unwrap(), b"v1");
    }

    #[test]
    fn load_closes_and_repoints_to_base() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.db"), b"v1").unwrap();
        let mut m = manager_in(dir.path());
        let key = m.save_state().unwrap();

        m.set_current_filename("scratch.db").unwrap();
        fs::write(dir.path().join("test.db"), b"v2").unwrap();
        fs::write(dir.path().join("test.db-wal"), b"stale").unwrap();
        m.load_state(&key).unwrap();

        assert_eq!(m.connection().closes, 1);
        assert_eq!(m.current_filename().unwrap(), "test.db");
        assert_eq!(fs::read(dir.path().join("test.db")).unwrap(), b"v1");
        assert!(!dir.path().join("test.db-wal").exists());
    }

    #[test]
    fn load_of_missing_key_keeps_connection_open() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.db"), b"v1").unwrap();
        let mut m = manager_in(dir.path());

        let err = m.load_state(&SnapshotKey::parse("dbstate_nope").unwrap()).unwrap_err();

        assert!(matches!(err, StateError::FileOperation { action: "read", .. }));
        assert_eq!(m.connection().closes, 0);
        assert_eq!(fs::read(dir.path().join("test.db")).unwrap(), b"v1");
    }

    #[test]
    fn reset_deletes_active_file_and_repoints() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("work.db"), b"scratch").unwrap();
        let mut m = manager_in(dir.path());
        m.set_current_filename("work.db").unwrap();

        m.reset_state(None).unwrap();

        assert_eq!(m.connection().closes, 1);
        assert!(!dir.path().join("work.db").exists());
        assert_eq!(m.current_filename().unwrap(), m.base_filename());
    }

    #[test]
    fn reset_with_missing_file_succeeds() {
        let dir = tempdir().unwrap();
        let mut m = manager_in(dir.path());
        m.reset_state(None).unwrap();
        assert_eq!(m.current_filename().unwrap(), "test.db");
    }

    #[test]
    fn reset_with_migration_is_not_implemented() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.db"), b"keep").unwrap();
        let mut m = manager_in(dir.path());

        let err = m.reset_state(Some("m240101_000000_init")).unwrap_err();

        assert!(matches!(err, StateError::NotImplemented { .. }));
        assert_eq!(m.connection().closes, 0);
        assert!(dir.path().join("test.db").exists());
    }

    #[test]
    fn purge_spares_the_active_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("dbstate_active.db"), b"live").unwrap();
        let conn = StubConnection::new(&format!("sqlite:{}/dbstate_active.db", dir.path().display()));
        let m = SnapshotManager::with_options(conn, verbatim()).unwrap();
        m.save_state().unwrap();
        m.save_state().unwrap();

        let pending = m.purgeable_states().unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|e| e.key.as_str() != "dbstate_active"));
        assert_eq!(m.list_states().unwrap().len(), 3);

        assert_eq!(m.purge_states().unwrap(), pending.len());
        assert!(dir.path().join("dbstate_active.db").exists());
        assert_eq!(m.list_states().unwrap().len(), 1);
    }
}
