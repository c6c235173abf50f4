use log::debug;
use std::path::PathBuf;

use super::Connection;
use crate::error::{Result, StateError};

/// A lazily opened rusqlite connection addressed by a `driver:path` string.
pub struct SqliteConnection {
    connection_string: String,
    driver: String,
    handle: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    pub fn new(connection_string: impl Into<String>) -> Self {
        let connection_string = connection_string.into();
        Self {
            driver: driver_of(&connection_string),
            connection_string,
            handle: None,
        }
    }

    /// The file the connection string points at, taken verbatim.
    pub fn path(&self) -> Result<PathBuf> {
        self.connection_string
            .split_once(':')
            .map(|(_, path)| PathBuf::from(path))
            .ok_or_else(|| StateError::MalformedConnectionString {
                connection: self.connection_string.clone(),
            })
    }

    /// Open the database if it is not open yet and return the handle.
    pub fn open(&mut self) -> Result<&rusqlite::Connection> {
        let conn = match self.handle.take() {
            Some(conn) => conn,
            None => {
                let path = self.path()?;
                debug!("opening sqlite database {}", path.display());
                rusqlite::Connection::open(&path)?
            }
        };
        Ok(self.handle.insert(conn))
    }

    pub fn handle(&self) -> Option<&rusqlite::Connection> {
        self.handle.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

impl Connection for SqliteConnection {
    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Takes effect on the next `open`; an open handle keeps its file.
    fn set_connection_string(&mut self, connection: String) {
        self.driver = driver_of(&connection);
        self.connection_string = connection;
    }

    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.handle.take() {
            debug!("closing sqlite database {}", self.connection_string);
            conn.close().map_err(|(_, err)| StateError::from(err))?;
        }
        Ok(())
    }

    fn driver_name(&self) -> &str {
        &self.driver
    }
}

/// Lower-cased text before the first `:`, empty when there is none.
fn driver_of(connection: &str) -> String {
    connection
        .split_once(':')
        .map(|(driver, _)| driver.to_lowercase())
        .unwrap_or_default()
}
