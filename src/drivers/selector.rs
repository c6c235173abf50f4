use super::{Connection, is_supported, sqlite::SqliteConnection};
use crate::error::{Result, StateError};

/// Build a connection for `connection_string`, refusing drivers outside the
/// sqlite allow-list.
pub fn select_connection(connection_string: &str) -> Result<Box<dyn Connection>> {
    let conn = SqliteConnection::new(connection_string);
    if !is_supported(conn.driver_name()) {
        return Err(StateError::UnsupportedDriver {
            driver: conn.driver_name().to_string(),
        });
    }
    Ok(Box::new(conn))
}
