use crate::error::Result;

pub mod selector;
pub mod sqlite;

/// Drivers whose databases live in a single file that can be copied.
pub const SUPPORTED_DRIVERS: &[&str] = &["sqlite", "sqlite2"];

pub fn is_supported(driver: &str) -> bool {
    SUPPORTED_DRIVERS.contains(&driver)
}

/// The database connection a snapshot manager wraps. The manager only
/// rewrites the connection string and closes the handle; opening and
/// querying stay with the implementation.
pub trait Connection {
    fn connection_string(&self) -> &str;

    fn set_connection_string(&mut self, connection: String);

    /// Release any open handle on the database file. Must succeed when the
    /// connection is already closed.
    fn close(&mut self) -> Result<()>;

    fn driver_name(&self) -> &str;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn connection_string(&self) -> &str {
        (**self).connection_string()
    }

    fn set_connection_string(&mut self, connection: String) {
        (**self).set_connection_string(connection)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn driver_name(&self) -> &str {
        (**self).driver_name()
    }
}
